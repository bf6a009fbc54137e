use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VisError {
    #[error("unknown color map {0:?}, expected one of: voc, uavid, yuuuav")]
    UnknownColorMap(String),

    #[error("expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("a label map needs at least one class")]
    NoClasses,

    #[error("palette has {available} colors but {classes} classes are needed")]
    PaletteTooSmall { classes: usize, available: usize },
}

pub type Result<T, E = VisError> = std::result::Result<T, E>;
