//! Fixed-size "cover" thumbnails, cached by file existence.
//!
//! A thumbnail is never regenerated once it exists, so replacing an original
//! with different content under the same name leaves the old thumbnail in
//! place until it is deleted by hand.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

use crate::config::{LimitsConfig, ThumbnailConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{SourceImage, ThumbnailStatus};

use super::decode::ImageDecoder;
use super::metadata::MetadataExtractor;
use super::orientation::Orientation;
use super::validate::Validator;

/// Derives thumbnails from source photos.
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
    decoder: ImageDecoder,
    validator: Validator,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator with the given configuration.
    pub fn new(config: ThumbnailConfig, limits: LimitsConfig) -> Self {
        Self {
            config,
            decoder: ImageDecoder::new(limits.clone()),
            validator: Validator::new(limits),
        }
    }

    /// Make sure `target` holds a thumbnail of `source`.
    ///
    /// Existing files are left alone. On a miss the source is decoded,
    /// oriented upright, cropped to fill the configured box and published
    /// without replacing anything another worker wrote in the meantime.
    pub async fn derive(
        &self,
        source: &SourceImage,
        target: &Path,
    ) -> PipelineResult<ThumbnailStatus> {
        match tokio::fs::try_exists(target).await {
            Ok(true) => {
                tracing::trace!("Thumbnail cache hit: {:?}", target);
                return Ok(ThumbnailStatus::Cached);
            }
            Ok(false) => {}
            // Treated as a miss; publishing still refuses to clobber.
            Err(e) => tracing::debug!("Cannot stat thumbnail {:?}: {}", target, e),
        }

        self.validator.check_size(&source.path).await?;
        let bytes = tokio::fs::read(&source.path)
            .await
            .map_err(|source_err| PipelineError::Read {
                path: source.path.clone(),
                source: source_err,
            })?;
        self.validator.check_header(&source.path, &bytes)?;

        let bytes = Arc::new(bytes);
        let decoded = self
            .decoder
            .decode_from_bytes(Arc::clone(&bytes), &source.path)
            .await?;

        let config = self.config.clone();
        let target_owned = target.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let orientation = MetadataExtractor::orientation_from_bytes(&bytes);
            let thumbnail = Self::render(decoded.image, orientation, &config);
            let encoded = Self::encode(&thumbnail, &target_owned, config.jpeg_quality)?;
            Self::publish(&encoded, &target_owned)
        })
        .await
        .map_err(|e| PipelineError::Task {
            path: source.path.clone(),
            message: format!("thumbnail task failed: {}", e),
        })?
    }

    /// Normalize orientation, then scale to fill the box and crop the overflow.
    ///
    /// Orientation must come first: rotating after the crop would compute the
    /// crop window against the stored axes.
    pub fn render(
        image: DynamicImage,
        orientation: Orientation,
        config: &ThumbnailConfig,
    ) -> DynamicImage {
        orientation
            .apply(image)
            .resize_to_fill(config.width, config.height, FilterType::Lanczos3)
    }

    /// Encode in the format implied by the derivative's extension.
    fn encode(image: &DynamicImage, target: &Path, jpeg_quality: u8) -> PipelineResult<Vec<u8>> {
        let write_err = |message: String| PipelineError::ThumbnailWrite {
            path: target.to_path_buf(),
            message,
        };

        let format = ImageFormat::from_path(target)
            .map_err(|e| write_err(format!("no encoder for extension: {}", e)))?;

        let mut buffer = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut buffer, jpeg_quality)
                    .encode_image(&rgb)
                    .map_err(|e| write_err(e.to_string()))?;
            }
            ImageFormat::WebP => {
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_to(&mut buffer, format)
                    .map_err(|e| write_err(e.to_string()))?;
            }
            _ => image
                .write_to(&mut buffer, format)
                .map_err(|e| write_err(e.to_string()))?,
        }
        Ok(buffer.into_inner())
    }

    /// Create `target` from `bytes` unless it already exists.
    ///
    /// The data goes to a hidden temp file next to the target first and is
    /// then linked into place without clobbering, so readers never observe a
    /// half-written thumbnail and a racing writer's file wins untouched.
    fn publish(bytes: &[u8], target: &Path) -> PipelineResult<ThumbnailStatus> {
        let write_err = |message: String| PipelineError::ThumbnailWrite {
            path: target.to_path_buf(),
            message,
        };

        let dir = target
            .parent()
            .ok_or_else(|| write_err("thumbnail path has no parent directory".to_string()))?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".pinmap-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(bytes).map_err(|e| write_err(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| write_err(e.to_string()))?;

        match tmp.persist_noclobber(target) {
            Ok(_) => {
                tracing::info!("Created thumbnail: {:?}", target);
                Ok(ThumbnailStatus::Created)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("Thumbnail appeared concurrently, keeping it: {:?}", target);
                Ok(ThumbnailStatus::Cached)
            }
            Err(e) => Err(write_err(e.error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use image::GenericImageView;

    fn generator(width: u32, height: u32) -> ThumbnailGenerator {
        ThumbnailGenerator::new(
            ThumbnailConfig {
                width,
                height,
                ..ThumbnailConfig::default()
            },
            LimitsConfig::default(),
        )
    }

    fn source_in(dir: &Path, name: &str, bytes: &[u8]) -> SourceImage {
        testutil::write(dir, name, bytes);
        SourceImage::new(name, dir.join(name))
    }

    fn thumbs_dir(dir: &Path) -> std::path::PathBuf {
        let thumbs = dir.join("thumbs");
        std::fs::create_dir_all(&thumbs).unwrap();
        thumbs
    }

    #[test]
    fn test_render_exact_dimensions_for_any_aspect() {
        let config = ThumbnailConfig::default();
        for (w, h) in [(1000, 500), (300, 900), (64, 64), (50, 20)] {
            let out = ThumbnailGenerator::render(
                testutil::solid_rgb(w, h, [9, 9, 9]),
                Orientation::Normal,
                &config,
            );
            assert_eq!(out.dimensions(), (200, 200), "source {w}x{h}");
        }
    }

    #[test]
    fn test_render_crops_instead_of_letterboxing() {
        // Wide image with a red strip on the far left. Cover crops the sides,
        // so neither the strip nor any padding color survives.
        let img = image::RgbImage::from_fn(300, 100, |x, _| {
            if x < 50 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 255, 0])
            }
        });
        let config = ThumbnailConfig {
            width: 100,
            height: 100,
            ..ThumbnailConfig::default()
        };
        let out = ThumbnailGenerator::render(
            DynamicImage::ImageRgb8(img),
            Orientation::Normal,
            &config,
        );
        // Center crop keeps x in 100..200 of the source: all green
        let corner = out.get_pixel(0, 0);
        assert!(corner[1] > 200 && corner[0] < 50, "got {:?}", corner);
        let bottom_right = out.get_pixel(99, 99);
        assert!(bottom_right[1] > 200, "got {:?}", bottom_right);
    }

    #[test]
    fn test_encode_follows_extension() {
        let img = testutil::solid_rgb(8, 8, [1, 2, 3]);
        let jpeg = ThumbnailGenerator::encode(&img, Path::new("t/a.JPG"), 80).unwrap();
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
        let png = ThumbnailGenerator::encode(&img, Path::new("t/b.png"), 80).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let webp = ThumbnailGenerator::encode(&img, Path::new("t/c.webp"), 80).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_derive_creates_then_caches() {
        let dir = tempfile::tempdir().unwrap();
        let thumbs = thumbs_dir(dir.path());
        let jpeg = testutil::jpeg_bytes(&testutil::solid_rgb(400, 300, [0, 0, 200]));
        let source = source_in(dir.path(), "a.jpg", &jpeg);
        let target = source.thumbnail_path(&thumbs);
        let gen = generator(200, 200);

        let status = gen.derive(&source, &target).await.unwrap();
        assert_eq!(status, ThumbnailStatus::Created);
        let thumb = image::open(&target).unwrap();
        assert_eq!(thumb.dimensions(), (200, 200));

        std::fs::write(&target, b"sentinel").unwrap();
        let status = gen.derive(&source, &target).await.unwrap();
        assert_eq!(status, ThumbnailStatus::Cached);
        assert_eq!(std::fs::read(&target).unwrap(), b"sentinel");
    }

    #[tokio::test]
    async fn test_derive_applies_orientation_before_crop() {
        // Upright picture: 20x40, red top half, blue bottom half. Stored
        // rotated a quarter turn counter-clockwise with orientation 6, so a
        // viewer rotating clockwise shows it upright.
        let upright = testutil::two_tone(20, 40, [255, 0, 0], [0, 0, 255]);
        let stored = upright.rotate270();
        let jpeg = testutil::with_exif(
            &testutil::jpeg_bytes(&stored),
            &[testutil::orientation_field(6)],
        );

        let dir = tempfile::tempdir().unwrap();
        let thumbs = thumbs_dir(dir.path());
        let source = source_in(dir.path(), "portrait.jpg", &jpeg);
        let target = source.thumbnail_path(&thumbs);
        generator(16, 16).derive(&source, &target).await.unwrap();

        let thumb = image::open(&target).unwrap().to_rgb8();
        assert_eq!(thumb.dimensions(), (16, 16));
        // The whole top row band is red and the bottom band blue; on the raw
        // stored pixels the split would be vertical instead.
        for (x, y) in [(2, 2), (13, 2)] {
            let p = thumb.get_pixel(x, y);
            assert!(p[0] > 150 && p[2] < 100, "({x},{y}) should be red: {:?}", p);
        }
        for (x, y) in [(2, 13), (13, 13)] {
            let p = thumb.get_pixel(x, y);
            assert!(p[2] > 150 && p[0] < 100, "({x},{y}) should be blue: {:?}", p);
        }
    }

    #[tokio::test]
    async fn test_derive_corrupt_source_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let thumbs = thumbs_dir(dir.path());
        let source = source_in(dir.path(), "c.webp", b"RIFF\x10\0\0\0WEBPVP8 garbage!");
        let target = source.thumbnail_path(&thumbs);

        let err = generator(200, 200).derive(&source, &target).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }), "got {err}");
        assert!(!target.exists());
        // No temp file is left behind either
        assert_eq!(std::fs::read_dir(&thumbs).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_derive_unstatable_target_reports_write_error() {
        // The thumbs "directory" is a regular file: stat fails with
        // ENOTDIR, which is treated as a miss, and publishing then fails.
        let dir = tempfile::tempdir().unwrap();
        let png = testutil::png_bytes(&testutil::solid_rgb(40, 40, [5, 5, 5]));
        let source = source_in(dir.path(), "a.png", &png);
        let blocker = dir.path().join("thumbs");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = generator(16, 16)
            .derive(&source, &blocker.join("a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ThumbnailWrite { .. }), "got {err}");
        assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
    }

    #[test]
    fn test_publish_does_not_clobber_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        std::fs::write(&target, b"first writer").unwrap();

        let status = ThumbnailGenerator::publish(b"second writer", &target).unwrap();
        assert_eq!(status, ThumbnailStatus::Cached);
        assert_eq!(std::fs::read(&target).unwrap(), b"first writer");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_derive_same_target() {
        let dir = tempfile::tempdir().unwrap();
        let thumbs = thumbs_dir(dir.path());
        let png = testutil::png_bytes(&testutil::solid_rgb(120, 80, [50, 60, 70]));
        let source = source_in(dir.path(), "race.png", &png);
        let target = source.thumbnail_path(&thumbs);
        let gen = generator(32, 32);

        let (a, b) = tokio::join!(gen.derive(&source, &target), gen.derive(&source, &target));
        let statuses = [a.unwrap(), b.unwrap()];
        assert!(statuses.contains(&ThumbnailStatus::Created));
        assert_eq!(image::open(&target).unwrap().dimensions(), (32, 32));
        assert_eq!(std::fs::read_dir(&thumbs).unwrap().count(), 1);
    }
}
