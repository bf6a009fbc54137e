/*!
Color maps for turning label maps into RGB images.
*/

use crate::error::{Result, VisError};
use crate::labels::LabelMap;
use image::RgbImage;
use std::str::FromStr;

const fn voc_palette() -> [[u8; 3]; 256] {
    let mut palette = [[0u8; 3]; 256];
    let mut idx = 0;
    while idx < 256 {
        let mut code = idx;
        let mut bit = 0;
        let mut rgb = [0u8; 3];
        while bit < 8 {
            let shift = 7 - bit;
            rgb[0] |= ((code & 1) as u8) << shift;
            rgb[1] |= (((code >> 1) & 1) as u8) << shift;
            rgb[2] |= (((code >> 2) & 1) as u8) << shift;
            code >>= 3;
            bit += 1;
        }
        palette[idx] = rgb;
        idx += 1;
    }
    palette
}

/// The PASCAL VOC palette: bits of the label index interleaved into RGB.
pub static VOC: [[u8; 3]; 256] = voc_palette();

/// The UAVid palette: clutter, building, road, tree, low vegetation, moving
/// car, static car, human.
pub static UAVID: [[u8; 3]; 8] = [
    [0, 0, 0],
    [128, 0, 0],
    [128, 64, 128],
    [0, 128, 0],
    [128, 128, 0],
    [64, 0, 128],
    [192, 0, 192],
    [64, 64, 0],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMap {
    Voc,
    /// Also accepted as `yuuuav`.
    Uavid,
}

impl FromStr for ColorMap {
    type Err = VisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "voc" => Ok(ColorMap::Voc),
            "uavid" | "yuuuav" => Ok(ColorMap::Uavid),
            _ => Err(VisError::UnknownColorMap(s.to_owned())),
        }
    }
}

impl std::fmt::Display for ColorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMap::Voc => f.pad("voc"),
            ColorMap::Uavid => f.pad("uavid"),
        }
    }
}

impl ColorMap {
    pub fn palette(&self) -> &'static [[u8; 3]] {
        match self {
            ColorMap::Voc => &VOC,
            ColorMap::Uavid => &UAVID,
        }
    }

    /// Fail unless every label below `classes` has a color.
    pub fn ensure_covers(&self, classes: usize) -> Result<()> {
        let available = self.palette().len();
        if classes > available {
            return Err(VisError::PaletteTooSmall { classes, available });
        }
        Ok(())
    }
}

/// Paint each label with its palette color.
pub fn label_map_to_rgb(map: &LabelMap, colormap: &ColorMap) -> Result<RgbImage> {
    if let Some(max) = map.max_label() {
        colormap.ensure_covers(max as usize + 1)?;
    }

    let palette = colormap.palette();
    let mut buf = Vec::with_capacity(map.labels.len() * 3);
    for label in &map.labels {
        buf.extend_from_slice(&palette[*label as usize]);
    }

    let expected = map.height * map.width * 3;
    let actual = buf.len();
    RgbImage::from_raw(map.width as u32, map.height as u32, buf)
        .ok_or(VisError::ShapeMismatch { expected, actual })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voc_leading_entries() {
        assert_eq!(VOC[0], [0, 0, 0]);
        assert_eq!(VOC[1], [128, 0, 0]);
        assert_eq!(VOC[2], [0, 128, 0]);
        assert_eq!(VOC[3], [128, 128, 0]);
        assert_eq!(VOC[15], [192, 128, 128]);
        assert_eq!(VOC[20], [0, 64, 128]);
    }

    #[test]
    fn parses_names() {
        assert_eq!("voc".parse::<ColorMap>().unwrap(), ColorMap::Voc);
        assert_eq!("uavid".parse::<ColorMap>().unwrap(), ColorMap::Uavid);
        assert_eq!("yuuuav".parse::<ColorMap>().unwrap(), ColorMap::Uavid);
        assert_eq!(
            "cityscapes".parse::<ColorMap>(),
            Err(VisError::UnknownColorMap("cityscapes".to_owned()))
        );
    }

    #[test]
    fn coverage() {
        assert!(ColorMap::Voc.ensure_covers(21).is_ok());
        assert_eq!(
            ColorMap::Uavid.ensure_covers(9),
            Err(VisError::PaletteTooSmall {
                classes: 9,
                available: 8
            })
        );
    }
}
