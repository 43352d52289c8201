//! Loading input images for a generation request.
//!
//! [`FileImageSource`] reads a local file, sniffs its format from the
//! header bytes, checks it decodes far enough to yield dimensions, and
//! base64-encodes it as an inline image part.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use genflow_client::InlineImage;
use image::{ImageFormat, ImageReader};

/// Largest accepted input image (20 MiB).
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Formats accepted as generation input.
pub const SUPPORTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

#[derive(Debug, thiserror::Error)]
pub enum ImageSourceError {
    #[error("Cannot read input image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input image {path} is {size} bytes, the limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Input image {path} is not a PNG, JPEG or WebP file")]
    Unsupported { path: PathBuf },

    #[error("Input image {path} is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}

/// Turns an input image reference into an inline image part.
///
/// Loading is synchronous; async callers run it on the blocking pool.
pub trait ImageSource: Send + Sync + 'static {
    fn load(&self, path: &Path) -> Result<InlineImage, ImageSourceError>;
}

/// [`ImageSource`] over the local filesystem.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    max_bytes: u64,
}

impl Default for FileImageSource {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl FileImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl ImageSource for FileImageSource {
    fn load(&self, path: &Path) -> Result<InlineImage, ImageSourceError> {
        let read_err = |source| ImageSourceError::Read {
            path: path.to_path_buf(),
            source,
        };

        let size = std::fs::metadata(path).map_err(read_err)?.len();
        if size > self.max_bytes {
            return Err(ImageSourceError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(read_err)?;

        let format = image::guess_format(&bytes)
            .ok()
            .filter(|f| SUPPORTED_FORMATS.contains(f))
            .ok_or_else(|| ImageSourceError::Unsupported {
                path: path.to_path_buf(),
            })?;

        ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| ImageSourceError::Corrupt {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        Ok(InlineImage {
            mime_type: format.to_mime_type().to_string(),
            data: STANDARD.encode(&bytes),
        })
    }
}
