//! Pure Rust image backend — no ImageMagick, no libvips.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, …) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` (Nearest / CatmullRom) |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Pad | `image::imageops::overlay` onto a background canvas |
//! | Sharpen | `image::DynamicImage::filter3x3` |
//! | EXIF orientation | `kamadak-exif` (read at decode time) |
//! | Encode (JPEG, PNG, WebP, GIF) | `image` codec encoders |
//!
//! The pure-Rust encoders write no EXIF or ICC chunks, so a `Strip` request
//! is always honored; conversely, metadata from the source is not carried
//! into the output even without `Strip`. Orientation is the exception that
//! matters: it is read into the handle at decode time so auto-orientation
//! can consume and clear it.

use super::backend::{BackendError, ImageBackend, ImageHandle, Rotation};
use super::geometry::{CropRegion, PadSpec, ResampleKernel};
use super::params::{EncodeOptions, PngCompression, SharpenKernel};
use crate::format::ImageFormat;
use exif::{In, Tag, Value};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Rgba, RgbaImage};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }

    /// Read dimensions from container metadata without a full decode.
    pub fn identify(path: &Path) -> Result<(u32, u32), BackendError> {
        image::image_dimensions(path)
            .map_err(|e| BackendError::Decode(format!("failed to read dimensions: {e}")))
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded image with its source format and orientation tag.
pub struct RustImage {
    img: DynamicImage,
    source_format: ImageFormat,
    orientation: Option<u16>,
}

impl ImageBackend for RustBackend {
    type Image = RustImage;

    fn decode(&self, path: &Path) -> Result<RustImage, BackendError> {
        let source_format = ImageFormat::from_path(path);
        let img = decode_image(path, source_format)?;
        let orientation = read_orientation(path);
        tracing::debug!(
            path = %path.display(),
            format = %source_format,
            width = img.width(),
            height = img.height(),
            orientation,
            "decoded source image"
        );
        Ok(RustImage {
            img,
            source_format,
            orientation,
        })
    }
}

/// Decode with a sequential read for formats whose decoders stream well
/// (JPEG, PNG): the known format skips content sniffing and the buffered
/// reader is consumed front to back. Everything else goes through format
/// guessing.
fn decode_image(path: &Path, format: ImageFormat) -> Result<DynamicImage, BackendError> {
    let decode_err =
        |e: image::ImageError| BackendError::Decode(format!("{}: {e}", path.display()));
    match format {
        ImageFormat::Jpeg | ImageFormat::Png => {
            let file = File::open(path).map_err(BackendError::Io)?;
            let container = match format {
                ImageFormat::Jpeg => image::ImageFormat::Jpeg,
                _ => image::ImageFormat::Png,
            };
            ImageReader::with_format(BufReader::new(file), container)
                .decode()
                .map_err(decode_err)
        }
        _ => ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(decode_err),
    }
}

/// EXIF orientation from the primary IFD, falling back to the thumbnail IFD.
/// Lenient: any read or parse failure is treated as "no tag".
fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    orientation_value(exif.get_field(Tag::Orientation, In::PRIMARY))
        .or_else(|| orientation_value(exif.get_field(Tag::Orientation, In::THUMBNAIL)))
}

fn orientation_value(field: Option<&exif::Field>) -> Option<u16> {
    field.and_then(|f| match &f.value {
        Value::Short(v) => v.first().copied(),
        _ => None,
    })
}

impl ImageHandle for RustImage {
    fn width(&self) -> u32 {
        self.img.width()
    }

    fn height(&self) -> u32 {
        self.img.height()
    }

    fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    fn resize(&mut self, ratio: f64, kernel: ResampleKernel) -> Result<(), BackendError> {
        let width = ((self.img.width() as f64 * ratio).round() as u32).max(1);
        let height = ((self.img.height() as f64 * ratio).round() as u32).max(1);
        let filter = match kernel {
            ResampleKernel::Nearest => FilterType::Nearest,
            ResampleKernel::CatmullRom => FilterType::CatmullRom,
        };
        self.img = self.img.resize_exact(width, height, filter);
        Ok(())
    }

    fn crop(&mut self, region: CropRegion) -> Result<(), BackendError> {
        // Invariant: the extraction never exceeds the image, whatever the
        // caller's rounding produced.
        let left = region.left.min(self.img.width().saturating_sub(1));
        let top = region.top.min(self.img.height().saturating_sub(1));
        let width = region.width.min(self.img.width() - left).max(1);
        let height = region.height.min(self.img.height() - top).max(1);
        self.img = self.img.crop_imm(left, top, width, height);
        Ok(())
    }

    fn pad(&mut self, spec: PadSpec, background: [u8; 4]) -> Result<(), BackendError> {
        let mut canvas = RgbaImage::from_pixel(spec.width, spec.height, Rgba(background));
        image::imageops::overlay(&mut canvas, &self.img, spec.left as i64, spec.top as i64);
        self.img = DynamicImage::ImageRgba8(canvas);
        Ok(())
    }

    fn convolve(&mut self, kernel: &SharpenKernel) -> Result<(), BackendError> {
        self.img = self.img.filter3x3(&kernel.normalized());
        Ok(())
    }

    fn rotate(&mut self, rotation: Rotation) -> Result<(), BackendError> {
        self.img = match rotation {
            Rotation::Deg90 => self.img.rotate90(),
            Rotation::Deg180 => self.img.rotate180(),
            Rotation::Deg270 => self.img.rotate270(),
        };
        Ok(())
    }

    fn orientation(&self) -> Option<u16> {
        self.orientation
    }

    fn clear_orientation(&mut self) {
        self.orientation = None;
    }

    fn encode_to(
        &self,
        path: &Path,
        format: ImageFormat,
        options: &EncodeOptions,
    ) -> Result<(), BackendError> {
        tracing::debug!(
            path = %path.display(),
            format = %format,
            strip = options.strip,
            "encoding output"
        );
        let file = File::create(path).map_err(BackendError::Io)?;
        let writer = BufWriter::new(file);
        let encode_err = |e: image::ImageError| BackendError::Encode(format!("{format}: {e}"));

        match format {
            ImageFormat::Jpeg => {
                let quality = options.quality.unwrap_or_default().value() as u8;
                let rgb = self.img.to_rgb8();
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality)
                    .write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_err)
            }
            ImageFormat::Png => {
                use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
                let compression = match options.png_compression {
                    PngCompression::Fast => CompressionType::Fast,
                    PngCompression::Default => CompressionType::Default,
                    PngCompression::Best => CompressionType::Best,
                };
                let rgba = self.img.to_rgba8();
                PngEncoder::new_with_quality(writer, compression, PngFilter::Adaptive)
                    .write_image(
                        rgba.as_raw(),
                        rgba.width(),
                        rgba.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(encode_err)
            }
            ImageFormat::Webp => {
                let rgba = self.img.to_rgba8();
                image::codecs::webp::WebPEncoder::new_lossless(writer)
                    .write_image(
                        rgba.as_raw(),
                        rgba.width(),
                        rgba.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(encode_err)
            }
            ImageFormat::Gif => {
                let rgba = self.img.to_rgba8();
                let (width, height) = (rgba.width(), rgba.height());
                image::codecs::gif::GifEncoder::new(writer)
                    .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_err)
            }
            ImageFormat::Other => Err(BackendError::Encode(
                "no encoder for unrecognized output format".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = File::create(path).unwrap();
        let writer = BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn decode(path: &Path) -> RustImage {
        RustBackend::new().decode(path).unwrap()
    }

    #[test]
    fn decode_reads_dimensions_and_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let img = decode(&path);
        assert_eq!((img.width(), img.height()), (200, 150));
        assert_eq!(img.source_format(), ImageFormat::Jpeg);
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn identify_reads_dimensions_without_decode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 320, 240);
        assert_eq!(RustBackend::identify(&path).unwrap(), (320, 240));
    }

    #[test]
    fn synthetic_jpeg_has_no_orientation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 64, 64);
        assert_eq!(decode(&path).orientation(), None);
    }

    #[test]
    fn resize_by_ratio_updates_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 640, 480);

        let mut img = decode(&path);
        img.resize(0.3125, ResampleKernel::CatmullRom).unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }

    #[test]
    fn crop_extracts_region() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 100, 80);

        let mut img = decode(&path);
        img.crop(CropRegion {
            left: 10,
            top: 5,
            width: 50,
            height: 40,
        })
        .unwrap();
        assert_eq!((img.width(), img.height()), (50, 40));
    }

    #[test]
    fn crop_clamps_oversized_region() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 100, 80);

        let mut img = decode(&path);
        img.crop(CropRegion {
            left: 50,
            top: 0,
            width: 100,
            height: 81,
        })
        .unwrap();
        assert_eq!((img.width(), img.height()), (50, 80));
    }

    #[test]
    fn pad_produces_exact_canvas() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 100, 50);

        let mut img = decode(&path);
        img.pad(
            PadSpec {
                width: 100,
                height: 100,
                left: 0,
                top: 25,
            },
            [0, 0, 0, 255],
        )
        .unwrap();
        assert_eq!((img.width(), img.height()), (100, 100));
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 60, 40);

        let mut img = decode(&path);
        img.rotate(Rotation::Deg270).unwrap();
        assert_eq!((img.width(), img.height()), (40, 60));
    }

    #[test]
    fn convolve_preserves_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 64, 48);

        let mut img = decode(&path);
        img.convolve(&SharpenKernel::classic()).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn encode_png_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src.jpg");
        create_test_jpeg(&src, 80, 60);

        let out = tmp.path().join("out.png");
        decode(&src)
            .encode_to(&out, ImageFormat::Png, &EncodeOptions::default())
            .unwrap();

        let round = decode(&out);
        assert_eq!(round.source_format(), ImageFormat::Png);
        assert_eq!((round.width(), round.height()), (80, 60));
    }

    #[test]
    fn encode_jpeg_honors_quality() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src.jpg");
        create_test_jpeg(&src, 200, 200);

        let img = decode(&src);
        let low = tmp.path().join("low.jpg");
        let high = tmp.path().join("high.jpg");
        let opts = |q| EncodeOptions {
            quality: Some(super::super::params::Quality::new(q)),
            ..EncodeOptions::default()
        };
        img.encode_to(&low, ImageFormat::Jpeg, &opts(20)).unwrap();
        img.encode_to(&high, ImageFormat::Jpeg, &opts(95)).unwrap();

        let low_size = std::fs::metadata(&low).unwrap().len();
        let high_size = std::fs::metadata(&high).unwrap().len();
        assert!(low_size < high_size);
    }

    #[test]
    fn encode_png_ignores_quality() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src.jpg");
        create_test_jpeg(&src, 50, 50);

        let out = tmp.path().join("out.png");
        let opts = EncodeOptions {
            quality: Some(super::super::params::Quality::new(5)),
            ..EncodeOptions::default()
        };
        decode(&src).encode_to(&out, ImageFormat::Png, &opts).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn encode_webp_and_gif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src.jpg");
        create_test_jpeg(&src, 40, 30);
        let img = decode(&src);

        let webp = tmp.path().join("out.webp");
        img.encode_to(&webp, ImageFormat::Webp, &EncodeOptions::default())
            .unwrap();
        assert!(std::fs::metadata(&webp).unwrap().len() > 0);

        let gif = tmp.path().join("out.gif");
        img.encode_to(&gif, ImageFormat::Gif, &EncodeOptions::default())
            .unwrap();
        assert!(std::fs::metadata(&gif).unwrap().len() > 0);
    }

    #[test]
    fn encode_other_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src.jpg");
        create_test_jpeg(&src, 10, 10);

        let out = tmp.path().join("out.tiff");
        let result = decode(&src).encode_to(&out, ImageFormat::Other, &EncodeOptions::default());
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
