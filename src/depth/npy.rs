//! NPY array decoding implementation.
//!
//! Only little-endian floating-point matrices in C order are decoded.

pub use super::*;

use std::io::Read;

/// The magic string of the NPY format.
pub const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// A decoded NPY header.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub dtype: DType,
    pub shape: Vec<usize>,
}

/// Decoding a matrix of the shape `[H, W]` into `f32` data.
pub fn decode(reader: &mut impl Read) -> Result<TensorData, Error> {
    let header = Header::decode(reader)?;
    let [height, width] = header.shape[..] else {
        return Err(Error::UnsupportedNpy(format!(
            "shape {:?} should be of rank 2",
            header.shape
        )));
    };

    let elem_size = match header.dtype {
        DType::F32 => 4,
        DType::F64 => 8,
        dtype => return Err(Error::UnsupportedNpy(format!("dtype {dtype:?}"))),
    };
    let size = height
        .checked_mul(width)
        .and_then(|count| count.checked_mul(elem_size))
        .ok_or_else(|| {
            Error::UnsupportedNpy(format!("shape {:?} is too large", header.shape))
        })?;

    // A forged shape must not allocate in advance.
    let mut bytes = Vec::new();
    reader.take(size as u64).read_to_end(&mut bytes)?;
    if bytes.len() != size {
        return Err(Error::UnsupportedNpy(format!(
            "payload size {} should be {size}",
            bytes.len()
        )));
    }

    let values = match elem_size {
        4 => bytes
            .chunks_exact(4)
            .map(|chunk| {
                let mut value = [0; 4];
                value.copy_from_slice(chunk);
                f32::from_le_bytes(value)
            })
            .collect::<Vec<_>>(),
        _ => bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut value = [0; 8];
                value.copy_from_slice(chunk);
                f64::from_le_bytes(value) as f32
            })
            .collect::<Vec<_>>(),
    };

    Ok(TensorData::new(values, [height, width]))
}

impl Header {
    pub fn decode(reader: &mut impl Read) -> Result<Self, Error> {
        let mut magic = [0; 8];
        reader.read_exact(&mut magic)?;
        if &magic[..6] != MAGIC {
            return Err(Error::UnsupportedNpy("magic string".into()));
        }

        let version = magic[6];
        let header_size = match version {
            1 => {
                let mut size = [0; 2];
                reader.read_exact(&mut size)?;
                u16::from_le_bytes(size) as usize
            },
            2 | 3 => {
                let mut size = [0; 4];
                reader.read_exact(&mut size)?;
                u32::from_le_bytes(size) as usize
            },
            _ => return Err(Error::UnsupportedNpy(format!("version {version}"))),
        };

        let mut header = Vec::new();
        reader.take(header_size as u64).read_to_end(&mut header)?;
        if header.len() != header_size {
            return Err(Error::UnsupportedNpy(format!(
                "header size {} should be {header_size}",
                header.len()
            )));
        }
        let header = String::from_utf8_lossy(&header);

        let descr = field(&header, "descr")?;
        let dtype = match descr.trim_matches(['\'', '"']) {
            "<f4" => DType::F32,
            "<f8" => DType::F64,
            descr => return Err(Error::UnsupportedNpy(format!("descr {descr}"))),
        };

        if field(&header, "fortran_order")? != "False" {
            return Err(Error::UnsupportedNpy("fortran_order".into()));
        }

        let shape = field(&header, "shape")?;
        let shape = shape
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .map(str::trim)
            .filter(|dim| !dim.is_empty())
            .map(|dim| {
                dim.parse::<usize>()
                    .map_err(|_| Error::UnsupportedNpy(format!("shape {shape}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { dtype, shape })
    }

    /// Encoding the header in version 1.
    pub fn encode(&self) -> Vec<u8> {
        let descr = match self.dtype {
            DType::F64 => "<f8",
            _ => "<f4",
        };
        let shape = self
            .shape
            .iter()
            .map(|dim| format!("{dim},"))
            .collect::<String>();
        let mut header =
            format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': ({shape}), }}");

        // The payload is aligned to 64 bytes.
        let unpadded_size = MAGIC.len() + 2 + 2 + header.len() + 1;
        header.extend(std::iter::repeat(' ').take((64 - unpadded_size % 64) % 64));
        header.push('\n');

        let mut bytes = Vec::with_capacity(unpadded_size + 64);
        bytes.extend(MAGIC);
        bytes.extend([1, 0]);
        bytes.extend((header.len() as u16).to_le_bytes());
        bytes.extend(header.as_bytes());
        bytes
    }
}

/// Extracting the raw value of `key` from the header dictionary.
fn field<'a>(
    header: &'a str,
    key: &str,
) -> Result<&'a str, Error> {
    let missing = || Error::UnsupportedNpy(format!("header field {key}"));

    let start = header
        .find(&format!("'{key}'"))
        .or_else(|| header.find(&format!("\"{key}\"")))
        .ok_or_else(missing)?;
    let value = header[start + key.len() + 2..]
        .trim_start()
        .strip_prefix(':')
        .ok_or_else(missing)?
        .trim_start();

    let end = if value.starts_with('(') {
        value.find(')').map(|end| end + 1)
    } else {
        value.find([',', '}'])
    }
    .ok_or_else(missing)?;

    Ok(value[..end].trim())
}
