//! `.tex` texture files
//!
//! A `.tex` file is a 16-byte little-endian header followed by tightly packed pixels:
//!
//! | offset | field        | value                                   |
//! |--------|--------------|-----------------------------------------|
//! | 0      | width        | pixels                                  |
//! | 4      | height       | pixels                                  |
//! | 8      | pixel format | `0x1907` (RGB) or `0x1908` (RGBA)       |
//! | 12     | pixel type   | `0x1401` (unsigned byte), nothing else  |
//!
//! Loaded data is always expanded to RGBA8 so it can go straight into an
//! `R8G8B8A8_UNORM` image.

use std::path::Path;

use thiserror::Error;

/// Pixel type sentinel for 8-bit unsigned channels
pub const PIXEL_TYPE_UNSIGNED_BYTE: u32 = 0x1401;
/// Pixel format sentinel for 3-channel data
pub const PIXEL_FORMAT_RGB: u32 = 0x1907;
/// Pixel format sentinel for 4-channel data
pub const PIXEL_FORMAT_RGBA: u32 = 0x1908;
/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Texture loading errors
#[derive(Error, Debug)]
pub enum TextureError {
    /// File could not be read
    #[error("Failed to read texture {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Fewer than 16 bytes
    #[error("Texture header truncated: {0} bytes")]
    TruncatedHeader(usize),

    /// Pixel type other than unsigned byte
    #[error("Texture has unsupported type: {0}")]
    UnsupportedType(u32),

    /// Pixel format other than RGB or RGBA
    #[error("Texture has unsupported format: {0}")]
    UnsupportedFormat(u32),

    /// Zero-sized, or too large to address
    #[error("Texture has invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width from the header
        width: u32,
        /// Height from the header
        height: u32,
    },

    /// Fewer pixel bytes than the header promises
    #[error("Texture data truncated: expected {expected} bytes, found {actual}")]
    TruncatedData {
        /// Bytes the header describes
        expected: usize,
        /// Bytes after the header
        actual: usize,
    },

    /// Diffuse and normal headers differ
    #[error("Diffuse and normal textures are incompatible.")]
    Incompatible,

    /// Source image could not be decoded
    #[error("Image decode failed: {0}")]
    Image(String),
}

/// Result alias for texture loading
pub type TextureResult<T> = Result<T, TextureError>;

/// Parsed `.tex` header, as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHeader {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// `PIXEL_FORMAT_RGB` or `PIXEL_FORMAT_RGBA`
    pub format: u32,
    /// Always `PIXEL_TYPE_UNSIGNED_BYTE` once parsed
    pub pixel_type: u32,
}

impl TextureHeader {
    fn read(bytes: &[u8]) -> TextureResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(TextureError::TruncatedHeader(bytes.len()));
        }
        let field = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self {
            width: field(0),
            height: field(4),
            format: field(8),
            pixel_type: field(12),
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        for value in [self.width, self.height, self.format, self.pixel_type] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Size of the stored pixel data in bytes.
    ///
    /// Zero-sized images and sizes that do not fit in `usize` are rejected.
    pub fn data_size(&self) -> TextureResult<usize> {
        let channels = self.channels()?;
        let invalid = || TextureError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid());
        }
        usize::try_from(self.width)
            .ok()
            .zip(usize::try_from(self.height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(invalid)
    }

    /// Bytes per pixel for the stored format
    pub fn channels(&self) -> TextureResult<usize> {
        match self.format {
            PIXEL_FORMAT_RGB => Ok(3),
            PIXEL_FORMAT_RGBA => Ok(4),
            other => Err(TextureError::UnsupportedFormat(other)),
        }
    }
}

/// Texture expanded to RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Header as found in the source file
    pub header: TextureHeader,
    /// RGBA pixels, row-major, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Parse a `.tex` image from memory
    pub fn parse(bytes: &[u8]) -> TextureResult<Self> {
        let header = TextureHeader::read(bytes)?;
        if header.pixel_type != PIXEL_TYPE_UNSIGNED_BYTE {
            return Err(TextureError::UnsupportedType(header.pixel_type));
        }
        let channels = header.channels()?;
        let expected = header.data_size()?;

        let data = &bytes[HEADER_SIZE..];
        if data.len() < expected {
            return Err(TextureError::TruncatedData {
                expected,
                actual: data.len(),
            });
        }
        let data = &data[..expected];

        let pixels = if channels == 3 {
            let mut rgba = Vec::with_capacity(expected / 3 * 4);
            for rgb in data.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            rgba
        } else {
            data.to_vec()
        };

        Ok(Self { header, pixels })
    }

    /// Read and parse a `.tex` file
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading texture from {:?}", path);
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let texture = Self::parse(&bytes)?;
        log::info!(
            "Loaded texture {}x{} from {:?}",
            texture.header.width,
            texture.header.height,
            path
        );
        Ok(texture)
    }

    /// Decode a PNG (or any format the `image` crate was built with) into RGBA8
    pub fn from_image_file(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| TextureError::Image(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        let (width, height) = img.dimensions();

        Ok(Self {
            header: TextureHeader {
                width,
                height,
                format: PIXEL_FORMAT_RGBA,
                pixel_type: PIXEL_TYPE_UNSIGNED_BYTE,
            },
            pixels: img.into_raw(),
        })
    }

    /// Serialize as a 4-channel `.tex` image
    pub fn encode(&self) -> Vec<u8> {
        let header = TextureHeader {
            format: PIXEL_FORMAT_RGBA,
            pixel_type: PIXEL_TYPE_UNSIGNED_BYTE,
            ..self.header
        };
        let mut out = Vec::with_capacity(HEADER_SIZE + self.pixels.len());
        header.write(&mut out);
        out.extend_from_slice(&self.pixels);
        out
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Size of the RGBA data in bytes
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}

/// Check that a diffuse/normal pair can share one two-layer image.
///
/// Headers must match field for field and the expanded data sizes must agree.
pub fn check_compatible(diffuse: &TextureData, normal: &TextureData) -> TextureResult<()> {
    if diffuse.header != normal.header || diffuse.size_bytes() != normal.size_bytes() {
        return Err(TextureError::Incompatible);
    }
    Ok(())
}
