use image::{GenericImageView, ImageFormat};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Image data is empty")]
    Empty,
    #[error("Image data is too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Corrupted image data: {0}")]
    Corrupt(String),
    #[error("Image dimensions are zero")]
    ZeroDimensions,
}

/// Canonical RGB8 pixel buffer produced by [`ImageCodec::decode`].
///
/// Only the codec constructs it, so every instance has non-zero dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    format: ImageFormat,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub const CHANNELS: u8 = 3;

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Row-major, interleaved RGB samples.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[derive(Debug, Clone)]
pub struct ImageCodec {
    max_bytes: usize,
}

impl ImageCodec {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(DecodeError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let format = detect_format(bytes)?;
        ensure_complete(format, bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions);
        }

        tracing::debug!(?format, width, height, "decoded upload");

        Ok(DecodedImage {
            width,
            height,
            format,
            pixels: image.into_rgb8().into_raw(),
        })
    }
}

/// The JPEG decoder fills in missing scan data instead of failing, so a cut
/// stream has to be caught before decoding. Trailing zero padding is allowed.
fn ensure_complete(format: ImageFormat, bytes: &[u8]) -> Result<(), DecodeError> {
    if format != ImageFormat::Jpeg {
        return Ok(());
    }

    let end = bytes
        .iter()
        .rposition(|&b| b != 0x00)
        .map_or(0, |last| last + 1);
    if bytes[..end].ends_with(&[0xFF, 0xD9]) {
        Ok(())
    } else {
        Err(DecodeError::Corrupt("missing JPEG end-of-image marker".into()))
    }
}

fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Ok(ImageFormat::Gif),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Ok(ImageFormat::WebP),
        [b'B', b'M', ..] => Ok(ImageFormat::Bmp),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(DecodeError::UnsupportedFormat),
    }
}
