//! Builders for synthetic WIPF files, crafted token by token so tests can
//! assert against hand-derived pixel values.

/// Wrap raw bytes as literal tokens followed by the end-of-stream sentinel.
pub fn literal_payload(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = raw;
    loop {
        let take = rest.len().min(8);
        if take == 8 {
            out.push(0xff);
            out.extend_from_slice(&rest[..8]);
            rest = &rest[8..];
            if rest.is_empty() {
                out.push(0x00);
                out.extend_from_slice(&[0x00, 0x00]);
                return out;
            }
        } else {
            out.push(((1u16 << take) - 1) as u8);
            out.extend_from_slice(&rest[..take]);
            out.extend_from_slice(&[0x00, 0x00]);
            return out;
        }
    }
}

pub struct WipfObject {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    /// Palette block for depth-8 files; `None` for truecolor.
    pub palette: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl WipfObject {
    pub fn truecolor(width: u32, height: u32, planes: &[u8]) -> Self {
        WipfObject {
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            palette: None,
            payload: literal_payload(planes),
        }
    }

    pub fn indexed(width: u32, height: u32, palette: Vec<u8>, indices: &[u8]) -> Self {
        WipfObject {
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            palette: Some(palette),
            payload: literal_payload(indices),
        }
    }
}

pub fn build_wipf(depth: u16, objects: &[WipfObject]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"WIPF");
    data.extend_from_slice(&(objects.len() as u16).to_le_bytes());
    data.extend_from_slice(&depth.to_le_bytes());

    for object in objects {
        for field in [
            object.width,
            object.height,
            object.offset_x,
            object.offset_y,
            0,
            object.payload.len() as u32,
        ] {
            data.extend_from_slice(&field.to_le_bytes());
        }
    }

    for object in objects {
        if let Some(palette) = &object.palette {
            data.extend_from_slice(palette);
        }
        data.extend_from_slice(&object.payload);
    }

    data
}

/// A 256-entry palette block where entry `i` is `(i, shade, 255 - shade)`
/// with a junk pad byte.
pub fn gradient_palette(shade: u8) -> Vec<u8> {
    let mut palette = Vec::with_capacity(1024);
    for i in 0..=255u8 {
        palette.extend_from_slice(&[i, shade, 255 - shade, 0xdd]);
    }
    palette
}
