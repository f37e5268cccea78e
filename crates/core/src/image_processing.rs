//! Image reading and encoding utilities.
//!
//! This module turns a user-supplied image (a file on disk or bytes already in
//! memory) into the base64 payload and MIME type the Gemini API expects inline.
//!
//! The image content is never re-encoded: the exact bytes the user supplied are
//! what the model sees, so decoding the payload yields them back unchanged.

use crate::error::{AnalysisFailure, FailureKind};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::ImageFormat;
use std::path::PathBuf;
use std::sync::Arc;

/// A handle to the image the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Read lazily from disk when a run starts.
    File(PathBuf),
    /// Bytes already held in memory (clipboard, drag-and-drop, tests).
    Bytes {
        data: Arc<[u8]>,
        mime_type: Option<String>,
    },
}

impl ImageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn bytes(data: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            data: data.into(),
            mime_type: None,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Bytes { data, .. } => format!("<{} bytes in memory>", data.len()),
        }
    }
}

/// Transport-safe form of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub bytes_base64: String,
}

impl EncodedImage {
    /// Decodes the payload back into raw bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.bytes_base64)
    }
}

/// Image processing utilities for the analysis pipeline.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Reads the image behind `source` and encodes it to base64.
    ///
    /// Suspends while the file is read. The MIME type comes from the caller if
    /// given, otherwise it is sniffed from the content.
    ///
    /// # Errors
    ///
    /// Returns [`FailureKind::ImageRead`] if the file cannot be read or is empty.
    /// Returns [`FailureKind::UnsupportedImage`] if the content is not a
    /// recognized image format.
    pub async fn encode(source: &ImageSource) -> Result<EncodedImage, AnalysisFailure> {
        let (data, declared): (Arc<[u8]>, Option<String>) = match source {
            ImageSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    AnalysisFailure::new(
                        FailureKind::ImageRead,
                        format!("Failed to read image {}: {}", path.display(), e),
                    )
                })?;
                (bytes.into(), None)
            }
            ImageSource::Bytes { data, mime_type } => (Arc::clone(data), mime_type.clone()),
        };

        if data.is_empty() {
            return Err(AnalysisFailure::new(
                FailureKind::ImageRead,
                format!("Image {} is empty", source.describe()),
            ));
        }

        let mime_type = match declared {
            Some(mime) => mime,
            None => Self::sniff_mime_type(&data)?,
        };

        if !mime_type.starts_with("image/") {
            return Err(AnalysisFailure::new(
                FailureKind::UnsupportedImage,
                format!("Expected an image, got {}", mime_type),
            ));
        }

        Ok(EncodedImage {
            mime_type,
            bytes_base64: BASE64.encode(&data),
        })
    }

    /// Detects the MIME type from magic bytes.
    fn sniff_mime_type(data: &[u8]) -> Result<String, AnalysisFailure> {
        image::guess_format(data)
            .map(|format: ImageFormat| format.to_mime_type().to_string())
            .map_err(|_| {
                AnalysisFailure::new(
                    FailureKind::UnsupportedImage,
                    "Please provide an image file (e.g., JPEG, PNG, GIF).",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'];

    #[tokio::test]
    async fn test_bytes_are_preserved() {
        let mut payload = PNG_HEADER.to_vec();
        payload.extend((0..=255u8).cycle().take(4096));

        let encoded = ImageProcessor::encode(&ImageSource::bytes(payload.clone()))
            .await
            .unwrap();

        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!(encoded.decode_bytes().unwrap(), payload);
    }

    #[tokio::test]
    async fn test_reads_file() {
        let mut payload = JPEG_HEADER.to_vec();
        payload.extend((0..=255u8).rev().cycle().take(2048));
        payload.extend([0xFF, 0xD9]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&payload).unwrap();
        file.flush().unwrap();

        let encoded = ImageProcessor::encode(&ImageSource::file(file.path()))
            .await
            .unwrap();

        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!(encoded.decode_bytes().unwrap(), payload);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let err = ImageProcessor::encode(&ImageSource::file("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::ImageRead);
    }

    #[tokio::test]
    async fn test_non_image_is_rejected() {
        let err = ImageProcessor::encode(&ImageSource::bytes(b"hello, world".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::UnsupportedImage);
    }

    #[tokio::test]
    async fn test_declared_mime_type_wins() {
        let source = ImageSource::Bytes {
            data: b"opaque".to_vec().into(),
            mime_type: Some("image/webp".to_string()),
        };
        let encoded = ImageProcessor::encode(&source).await.unwrap();
        assert_eq!(encoded.mime_type, "image/webp");
    }

    #[tokio::test]
    async fn test_declared_formats_round_trip() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend([1, 0, 1, 0, 0x80, 0, 0, 0xFF, 0xFF, 0xFF, 0, 0, 0, b';']);

        let mut webp = b"RIFF".to_vec();
        webp.extend(30u32.to_le_bytes());
        webp.extend(b"WEBPVP8L");
        webp.extend((0..22u8).map(|b| b.wrapping_mul(37)));

        for (data, mime) in [(gif, "image/gif"), (webp, "image/webp")] {
            let source = ImageSource::Bytes {
                data: data.clone().into(),
                mime_type: Some(mime.to_string()),
            };
            let encoded = ImageProcessor::encode(&source).await.unwrap();

            assert_eq!(encoded.mime_type, mime);
            assert_eq!(encoded.decode_bytes().unwrap(), data);
            // Sniffing agrees with the declared type.
            let sniffed = ImageProcessor::encode(&ImageSource::bytes(data.clone()))
                .await
                .unwrap();
            assert_eq!(sniffed.mime_type, mime);
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_read_error() {
        let err = ImageProcessor::encode(&ImageSource::bytes(Vec::<u8>::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::ImageRead);
    }
}
