use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

const DATA_URL_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("malformed image reference: {message}")]
    MalformedDataUrl { message: String },
    #[error("image payload is not valid base64: {message}")]
    InvalidBase64 { message: String },
    #[error("failed to read image file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported image file {path}: {detected}")]
    UnsupportedFormat { path: PathBuf, detected: String },
    #[error("failed to decode image: {message}")]
    Decode { message: String },
}

pub type ImageRefResult<T> = std::result::Result<T, ImageRefError>;

/// Encoded image carried as a `data:<mime>;base64,<payload>` URL.
///
/// Values are never mutated; every processing step produces a new reference.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    /// Accepts a data URL after checking it has the `data:<mime>;base64,<payload>` shape.
    pub fn parse(value: impl Into<String>) -> ImageRefResult<Self> {
        let value = value.into();
        split_data_url(&value)?;
        Ok(Self(value))
    }

    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self(format!("{DATA_URL_SCHEME}{mime_type}{BASE64_MARKER}{payload}"))
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &BASE64.encode(bytes))
    }

    /// Reads a PNG, JPEG or WEBP file fully into memory.
    ///
    /// The format is sniffed from the file contents, not the extension.
    pub fn from_file(path: &Path) -> ImageRefResult<Self> {
        let bytes = std::fs::read(path).map_err(|err| ImageRefError::ReadFile {
            path: path.to_path_buf(),
            source: err,
        })?;
        let format = image::guess_format(&bytes).map_err(|err| ImageRefError::UnsupportedFormat {
            path: path.to_path_buf(),
            detected: err.to_string(),
        })?;
        if !is_accepted_input_format(format) {
            return Err(ImageRefError::UnsupportedFormat {
                path: path.to_path_buf(),
                detected: format!("{format:?} is not PNG, JPEG or WEBP"),
            });
        }

        tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "loaded image file");
        Ok(Self::from_bytes(format.to_mime_type(), &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the reference into its mime type and base64 payload.
    pub fn decompose(&self) -> ImageRefResult<(&str, &str)> {
        split_data_url(&self.0)
    }

    pub fn mime_type(&self) -> ImageRefResult<&str> {
        self.decompose().map(|(mime, _)| mime)
    }

    pub fn decode_bytes(&self) -> ImageRefResult<Vec<u8>> {
        let (_, payload) = self.decompose()?;
        BASE64
            .decode(payload.as_bytes())
            .map_err(|err| ImageRefError::InvalidBase64 {
                message: err.to_string(),
            })
    }

    pub fn decode_image(&self) -> ImageRefResult<DynamicImage> {
        let bytes = self.decode_bytes()?;
        image::load_from_memory(&bytes).map_err(|err| ImageRefError::Decode {
            message: err.to_string(),
        })
    }

    /// File extension matching the mime type, `png` when unknown.
    pub fn file_extension(&self) -> &'static str {
        self.mime_type()
            .ok()
            .and_then(ImageFormat::from_mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads run to megabytes; only the header and size are useful in logs.
        match self.decompose() {
            Ok((mime, payload)) => write!(f, "ImageRef({mime}, {} b64 chars)", payload.len()),
            Err(_) => write!(f, "ImageRef(<malformed>)"),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn split_data_url(value: &str) -> ImageRefResult<(&str, &str)> {
    let Some(rest) = value.strip_prefix(DATA_URL_SCHEME) else {
        return Err(ImageRefError::MalformedDataUrl {
            message: "missing data: scheme".to_string(),
        });
    };
    let Some((mime, payload)) = rest.split_once(BASE64_MARKER) else {
        return Err(ImageRefError::MalformedDataUrl {
            message: "expected data:<mime>;base64,<payload>".to_string(),
        });
    };
    if mime.is_empty() {
        return Err(ImageRefError::MalformedDataUrl {
            message: "empty mime type".to_string(),
        });
    }
    if payload.is_empty() {
        return Err(ImageRefError::MalformedDataUrl {
            message: "empty payload".to_string(),
        });
    }
    Ok((mime, payload))
}

fn is_accepted_input_format(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    )
}

#[cfg(test)]
pub(crate) fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> ImageRef {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut io::Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode should succeed");
    ImageRef::from_bytes("image/png", &buf)
}
