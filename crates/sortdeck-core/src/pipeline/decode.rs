//! Image decoding with format detection and size limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::layout::ImageDimensions;

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and fully decode an image, enforcing file size and dimension limits.
    ///
    /// The format is detected from content first and from the extension only
    /// when content sniffing is inconclusive.
    pub fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let file_size = self.check_file_size(path)?;

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let decoded = Self::decode_bytes(bytes, path)?;
        self.check_dimensions(path, decoded.width, decoded.height)?;

        Ok(DecodedImage {
            file_size,
            ..decoded
        })
    }

    /// Pixel dimensions from the image header, without decoding pixel data.
    pub fn read_dimensions(&self, path: &Path) -> Result<ImageDimensions, PipelineError> {
        self.check_file_size(path)?;

        let reader = image::ImageReader::open(path)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        if reader.format().is_none() {
            return Err(unsupported(path));
        }

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        self.check_dimensions(path, width, height)?;

        Ok(ImageDimensions::new(width, height))
    }

    fn check_file_size(&self, path: &Path) -> Result<u64, PipelineError> {
        let meta = std::fs::metadata(path).map_err(|_| PipelineError::FileNotFound(path.to_path_buf()))?;
        let size = meta.len();
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(size)
    }

    fn check_dimensions(&self, path: &Path, width: u32, height: u32) -> Result<(), PipelineError> {
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }
        Ok(())
    }

    fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
        use std::io::Cursor;

        let file_size = bytes.len() as u64;
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => {
                let f = ImageFormat::from_path(path).map_err(|_| unsupported(path))?;
                reader.set_format(f);
                f
            }
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

fn unsupported(path: &Path) -> PipelineError {
    PipelineError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default())
    }

    #[test]
    fn test_decode_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 30, 20);

        let decoded = decoder().decode(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (30, 20));
        assert_eq!(decoded.format, ImageFormat::Png);
        assert!(decoded.file_size > 0);
    }

    #[test]
    fn test_format_detected_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let misnamed = dir.path().join("test_misnamed.jpg");
        write_png(&misnamed, 8, 8);

        let result = decoder().decode(&misnamed).unwrap();
        assert_eq!(result.format, ImageFormat::Png);
    }

    #[test]
    fn test_huge_size_limit_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 4, 4);

        let limits = LimitsConfig {
            max_file_size_mb: u64::MAX,
            ..LimitsConfig::default()
        };
        let decoded = ImageDecoder::new(limits).decode(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 4));
    }

    #[test]
    fn test_garbage_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = decoder().decode(&path).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.skip_reason(), "undecodable");
    }

    #[test]
    fn test_missing_file() {
        let err = decoder().decode(Path::new("/no/such/file.png")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_dimension_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 64, 8);

        let strict = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 32,
            ..Default::default()
        });
        assert!(matches!(
            strict.decode(&path).unwrap_err(),
            PipelineError::ImageTooLarge { .. }
        ));
        assert!(matches!(
            strict.read_dimensions(&path).unwrap_err(),
            PipelineError::ImageTooLarge { .. }
        ));
    }

    #[test]
    fn test_read_dimensions_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        write_png(&path, 12, 34);

        assert_eq!(
            decoder().read_dimensions(&path).unwrap(),
            ImageDimensions::new(12, 34)
        );
    }
}
