/*!
The record file format.

```text
header  := MAGIC ("TSRC") VERSION (u8) reserved ([0u8; 3])
record  := body_len (u64 LE) body
body    := field_count (u16 LE) field*
field   := name_len (u16 LE) name (utf-8) payload_len (u64 LE) payload
```

Every example carries the `name`, `image` and `mask` fields; any other field
is skipped when reading.
*/

use crate::error::{RecordError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};

pub const VERSION: u8 = 1;

/// Magic used to ensure record files are valid.
pub const MAGIC: [u8; 4] = [b'T', b'S', b'R', b'C'];

const NAME: &str = "name";
const IMAGE: &str = "image";
const MASK: &str = "mask";

/// One serialized training example: raw RGB bytes and a one-byte-per-class mask.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Example {
    pub name: String,
    pub image: Vec<u8>,
    pub mask: Vec<u8>,
}

fn malformed(msg: impl Into<String>) -> RecordError {
    RecordError::Malformed(msg.into())
}

fn truncated(what: &str) -> impl FnOnce(std::io::Error) -> RecordError + '_ {
    move |err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            malformed(format!("truncated {}", what))
        } else {
            RecordError::Io(err)
        }
    }
}

impl Example {
    pub fn new(name: impl Into<String>, image: Vec<u8>, mask: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            image,
            mask,
        }
    }

    /// Serialize into a record body.
    pub fn encode(&self) -> Vec<u8> {
        let fields: [(&str, &[u8]); 3] = [
            (NAME, self.name.as_bytes()),
            (IMAGE, &self.image),
            (MASK, &self.mask),
        ];

        let size = 2 + fields
            .iter()
            .map(|(name, payload)| 2 + name.len() + 8 + payload.len())
            .sum::<usize>();

        let mut out = Vec::with_capacity(size);
        // Writes into a Vec cannot fail.
        let _ = out.write_u16::<LittleEndian>(fields.len() as u16);
        for (name, payload) in fields {
            let _ = out.write_u16::<LittleEndian>(name.len() as u16);
            out.extend_from_slice(name.as_bytes());
            let _ = out.write_u64::<LittleEndian>(payload.len() as u64);
            out.extend_from_slice(payload);
        }

        out
    }

    /// Parse a record body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(body);
        let count = cursor
            .read_u16::<LittleEndian>()
            .map_err(truncated("field count"))?;

        let mut name = None;
        let mut image = None;
        let mut mask = None;

        for _ in 0..count {
            let name_len = cursor
                .read_u16::<LittleEndian>()
                .map_err(truncated("field name length"))? as usize;
            let mut field = vec![0; name_len];
            cursor
                .read_exact(&mut field)
                .map_err(truncated("field name"))?;

            let payload_len = cursor
                .read_u64::<LittleEndian>()
                .map_err(truncated("payload length"))?;
            let remaining = (body.len() as u64).saturating_sub(cursor.position());
            if payload_len > remaining {
                return Err(malformed(format!(
                    "payload of {} bytes but only {} remain",
                    payload_len, remaining
                )));
            }

            let start = cursor.position() as usize;
            let end = start + payload_len as usize;
            let payload = &body[start..end];
            cursor.set_position(end as u64);

            match field.as_slice() {
                b"name" => {
                    let value = std::str::from_utf8(payload)
                        .map_err(|e| malformed(format!("name is not utf-8: {}", e)))?;
                    name = Some(value.to_owned());
                }
                b"image" => image = Some(payload.to_vec()),
                b"mask" => mask = Some(payload.to_vec()),
                other => log::trace!("skipping field {:?}", String::from_utf8_lossy(other)),
            }
        }

        if cursor.position() as usize != body.len() {
            return Err(malformed(format!(
                "{} trailing bytes after the last field",
                body.len() - cursor.position() as usize
            )));
        }

        Ok(Self {
            name: name.ok_or_else(|| malformed(format!("missing field {:?}", NAME)))?,
            image: image.ok_or_else(|| malformed(format!("missing field {:?}", IMAGE)))?,
            mask: mask.ok_or_else(|| malformed(format!("missing field {:?}", MASK)))?,
        })
    }
}

/// Writes the header followed by one record per [`RecordWriter::write`].
pub struct RecordWriter<W: Write> {
    writer: W,
    count: usize,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::create(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn create(mut writer: W) -> Result<Self> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&[VERSION, 0, 0, 0])?;
        Ok(Self { writer, count: 0 })
    }

    pub fn write(&mut self, example: &Example) -> Result<()> {
        let body = example.encode();
        self.writer.write_u64::<LittleEndian>(body.len() as u64)?;
        self.writer.write_all(&body)?;
        self.count += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Reads records lazily. Iteration stops after the first error.
pub struct RecordReader<R: Read> {
    reader: R,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> RecordReader<R> {
    /// Validate the header and prepare to read records.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = [0u8; 8];
        reader
            .read_exact(&mut header)
            .map_err(truncated("header"))?;

        if header[..4] != MAGIC {
            return Err(malformed(format!(
                "unexpected magic: expected 'TSRC' found {:?}",
                String::from_utf8_lossy(&header[..4])
            )));
        }

        if header[4] != VERSION {
            return Err(malformed(format!(
                "unsupported version {}, expected {}",
                header[4], VERSION
            )));
        }

        if header[5..] != [0, 0, 0] {
            return Err(malformed(format!(
                "unexpected non-zero reserved bytes: {:?}",
                &header[5..]
            )));
        }

        Ok(Self {
            reader,
            failed: false,
        })
    }

    fn read_length(&mut self) -> Result<Option<u64>> {
        let mut buf = [0u8; 8];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            8 => Ok(Some(u64::from_le_bytes(buf))),
            n => Err(malformed(format!(
                "truncated record length: {} of 8 bytes",
                n
            ))),
        }
    }

    fn read_record(&mut self) -> Result<Option<Example>> {
        let Some(len) = self.read_length()? else {
            return Ok(None);
        };

        let mut body = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut body)?;
        if body.len() as u64 != len {
            return Err(malformed(format!(
                "truncated record body: {} of {} bytes",
                body.len(),
                len
            )));
        }

        Example::decode(&body).map(Some)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.read_record() {
            Ok(Some(example)) => Some(Ok(example)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
