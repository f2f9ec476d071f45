use image::{GrayImage, RgbImage, Rgba, RgbaImage};

use crate::error::ExtractError;
use crate::formats::wipf::ObjectHeader;

/// 256-entry colour table read in front of each depth-8 payload.
///
/// On disk every entry is 4 bytes; the 4th is padding and never carries
/// alpha.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ExtractError> {
        if raw.len() != 256 * 4 {
            return Err(ExtractError::Format(format!(
                "palette block is {} bytes, expected {}",
                raw.len(),
                256 * 4
            )));
        }

        let mut entries = Vec::with_capacity(256);
        for entry in raw.chunks_exact(4) {
            entries.push([entry[0], entry[1], entry[2]]);
        }

        Ok(Palette { entries })
    }

    pub fn get(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }
}

/// One decoded object: resolved RGB pixels plus the placement fields carried
/// through from its header. The alpha channel only exists after a mask file
/// has been composited in.
#[derive(Debug, Clone)]
pub struct ImageObject {
    pub offset_x: u32,
    pub offset_y: u32,
    pub unknown: u32,
    pub pixels: RgbImage,
    pub alpha: Option<GrayImage>,
}

impl ImageObject {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Merge the RGB pixels and the alpha channel (opaque when absent) into
    /// a single RGBA buffer for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut rgba = RgbaImage::new(self.width(), self.height());
        for (x, y, pixel) in self.pixels.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let a = match &self.alpha {
                Some(alpha) => alpha.get_pixel(x, y).0[0],
                None => 0xff,
            };
            rgba.put_pixel(x, y, Rgba([r, g, b, a]));
        }
        rgba
    }
}

/// Reassemble one object's raw decompressed bytes into an image.
///
/// Depth 24 stores three planes of `width * height` bytes each; the channel
/// order is the reverse of the storage order (red is the last plane). Depth
/// 8 stores one plane of palette indices.
pub fn assemble(
    header: &ObjectHeader,
    raw: &[u8],
    depth: u16,
    palette: Option<&Palette>,
) -> Result<ImageObject, ExtractError> {
    let pixel_count = header.width as usize * header.height as usize;
    let expected = pixel_count * depth as usize / 8;
    if raw.len() != expected {
        return Err(ExtractError::SizeMismatch {
            width: header.width,
            height: header.height,
            depth,
            expected,
            actual: raw.len(),
        });
    }

    let mut buffer = Vec::with_capacity(pixel_count * 3);
    match depth {
        24 => {
            for i in 0..pixel_count {
                buffer.push(raw[pixel_count * 2 + i]); // red
                buffer.push(raw[pixel_count + i]); // green
                buffer.push(raw[i]); // blue
            }
        }
        8 => {
            let palette = palette.ok_or_else(|| {
                ExtractError::Format("depth-8 object without a palette".to_string())
            })?;
            for &index in raw {
                buffer.extend_from_slice(&palette.get(index));
            }
        }
        _ => {
            return Err(ExtractError::Format(format!(
                "unsupported bit-depth {}",
                depth
            )))
        }
    }

    let pixels = RgbImage::from_raw(header.width, header.height, buffer)
        .ok_or_else(|| ExtractError::Format("image buffer does not fit dimensions".to_string()))?;

    Ok(ImageObject {
        offset_x: header.offset_x,
        offset_y: header.offset_y,
        unknown: header.unknown,
        pixels,
        alpha: None,
    })
}

/// Install each mask object's luminance as the alpha channel of the base
/// object at the same index, replacing any prior alpha.
///
/// The base list is untouched unless the counts line up. Dimensions are the
/// caller's precondition (matching headers); they are not re-validated here.
pub fn apply_mask(base: &mut [ImageObject], masks: &[ImageObject]) -> Result<(), ExtractError> {
    if base.len() != masks.len() {
        return Err(ExtractError::CountMismatch {
            base: base.len(),
            mask: masks.len(),
        });
    }

    for (image, mask) in base.iter_mut().zip(masks) {
        image.alpha = Some(image::imageops::grayscale(&mask.pixels));
    }

    Ok(())
}
