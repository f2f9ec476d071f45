//! Image reassembly for decoded WillPlus graphics.
//!
//! This module turns raw decompressed plane data into `image` crate buffers
//! and handles alpha compositing from companion mask files.

pub mod wip_image;

pub use wip_image::{apply_mask, assemble, ImageObject, Palette};
