use crate::binary_utils::StreamReader;
use crate::error::ExtractError;
use crate::formats::lzss;
use crate::graphics::wip_image::{assemble, ImageObject, Palette};

// WillPlus Image Pack container. One file holds 1..N objects behind a fixed
// header array; each object's palette (depth 8 only) and compressed payload
// follow in header order, so object i is only reachable after fully
// consuming object i-1.

pub const WIPF_MAGIC: &[u8] = b"WIPF";

const PALETTE_BYTES: usize = 256 * 4;

#[derive(Debug, Clone)]
pub struct ContainerHeader {
    pub objects: u16,
    /// Bits per pixel, 8 (palette-indexed) or 24 (planar truecolor).
    pub depth: u16,
}

#[derive(Debug, Clone)]
pub struct ObjectHeader {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    /// Layer number, maybe. Carried through untouched.
    pub unknown: u32,
    pub compressed_size: u32,
}

/// A fully decoded image pack.
#[derive(Debug)]
pub struct WipFile {
    pub header: ContainerHeader,
    pub object_headers: Vec<ObjectHeader>,
    pub objects: Vec<ImageObject>,
}

/// Parse the container header and the object header array.
///
/// Leaves the reader at the first object's palette/payload bytes and touches
/// nothing past the header array.
pub fn read_header(
    reader: &mut StreamReader<'_>,
) -> Result<(ContainerHeader, Vec<ObjectHeader>), ExtractError> {
    if reader.remaining() < 8 {
        return Err(ExtractError::Format(
            "file too short for a WIPF header".to_string(),
        ));
    }

    let magic = reader.take(4, "container header")?;
    if magic != WIPF_MAGIC {
        return Err(ExtractError::Format(
            "bad magic, not a WIPF container".to_string(),
        ));
    }

    let objects = reader.u16_le("container header")?;
    let depth = reader.u16_le("container header")?;
    if depth != 8 && depth != 24 {
        return Err(ExtractError::Format(format!(
            "unsupported bit-depth {}",
            depth
        )));
    }

    let mut object_headers = Vec::with_capacity(objects as usize);
    for _ in 0..objects {
        object_headers.push(read_object_header(reader)?);
    }

    Ok((ContainerHeader { objects, depth }, object_headers))
}

fn read_object_header(reader: &mut StreamReader<'_>) -> Result<ObjectHeader, ExtractError> {
    Ok(ObjectHeader {
        width: reader.u32_le("object header")?,
        height: reader.u32_le("object header")?,
        offset_x: reader.u32_le("object header")?,
        offset_y: reader.u32_le("object header")?,
        unknown: reader.u32_le("object header")?,
        compressed_size: reader.u32_le("object header")?,
    })
}

/// Decode every object in a WIPF file into in-memory images.
pub fn decode(data: &[u8]) -> Result<WipFile, ExtractError> {
    let mut reader = StreamReader::new(data);
    let (header, object_headers) = read_header(&mut reader)?;

    let mut objects = Vec::with_capacity(object_headers.len());
    for object_header in &object_headers {
        let palette = if header.depth == 8 {
            Some(Palette::from_bytes(reader.take(PALETTE_BYTES, "palette")?)?)
        } else {
            None
        };

        let payload = reader.take(object_header.compressed_size as usize, "compressed payload")?;
        let raw = lzss::decompress(payload)?;

        objects.push(assemble(
            object_header,
            &raw,
            header.depth,
            palette.as_ref(),
        )?);
    }

    Ok(WipFile {
        header,
        object_headers,
        objects,
    })
}
