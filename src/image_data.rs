// SPDX-License-Identifier: MPL-2.0
//! Decoded image payload handed from the loader to UI targets.

use crate::error::{LoadError, Result};
use std::sync::Arc;

/// A decoded RGBA image.
///
/// Pixels are stored in an `Arc`, so cloning is cheap and the same decode can
/// sit in the memory cache and inside a UI target at once.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    rgba: Arc<Vec<u8>>,
}

impl ImageData {
    /// Creates an `ImageData` from raw RGBA pixels.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "pixel buffer does not match dimensions"
        );
        Self {
            width,
            height,
            rgba: Arc::new(pixels),
        }
    }

    /// Decodes an `ImageData` from encoded bytes (PNG, JPEG, GIF, WebP, BMP).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Decode`] if the bytes are not a supported image.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let decoded = image_rs::load_from_memory(bytes)
            .map_err(|e| LoadError::Decode(e.to_string()))?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self::from_rgba(width, height, decoded.into_raw()))
    }

    /// Returns a reference to the RGBA bytes.
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Size of the pixel buffer in bytes, used for cache accounting.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.rgba, &other.rgba) || self.rgba == other.rgba)
    }
}

impl Eq for ImageData {}
