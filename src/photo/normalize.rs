/// Image normalization
///
/// Turns whatever the user handed over (a photo file, a dropped image,
/// a camera frame) into one bounded JPEG data URL:
/// - longest edge clamped to 1280px, aspect ratio kept
/// - opaque RGB, JPEG quality 80
/// - `data:image/jpeg;base64,...` so it can be stored inline with the item

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, ImageDecoder, ImageReader, ImageResult, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::PhotoError;

/// Longest edge of a stored picture
pub const MAX_EDGE: u32 = 1280;

/// JPEG quality (0.8 on the usual 0..1 scale)
pub const JPEG_QUALITY: u8 = 80;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_edge: u32,
    pub quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_edge: MAX_EDGE,
            quality: JPEG_QUALITY,
        }
    }
}

/// One RGBA video frame as handed over by a camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Anything the normalizer accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded file bytes (JPEG, PNG, WebP, ...)
    Encoded(Vec<u8>),
    /// Uncompressed camera frame
    Frame(RawFrame),
}

/// Result of a normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Target size for `width x height` so the longest edge is at most `max_edge`.
/// Never upscales, rounds to the nearest pixel, never returns 0.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = (max_edge as f64 / longest).min(1.0);
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Decode with format sniffing, honoring the EXIF orientation tag
fn decode_oriented(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Decode encoded bytes: orientation-aware path first, plain load as fallback
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PhotoError> {
    match decode_oriented(bytes) {
        Ok(img) => Ok(img),
        Err(fast_err) => {
            debug!("Oriented decode failed ({}), retrying plain decode", fast_err);
            image::load_from_memory(bytes).map_err(PhotoError::Decode)
        }
    }
}

fn frame_to_image(frame: &RawFrame) -> Result<DynamicImage, PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::EmptyFrame);
    }
    let buffer = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or(
        PhotoError::BadFrame {
            width: frame.width,
            height: frame.height,
        },
    )?;
    Ok(DynamicImage::ImageRgba8(buffer))
}

/// Encode as an opaque JPEG data URL
pub fn encode_jpeg_data_url(img: &DynamicImage, quality: u8) -> Result<String, PhotoError> {
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder).map_err(PhotoError::Encode)?;

    let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    data_url.push_str(DATA_URL_PREFIX);
    STANDARD.encode_string(&jpeg, &mut data_url);
    Ok(data_url)
}

/// Normalize one source into a bounded JPEG data URL
pub fn normalize(source: &ImageSource, opts: &NormalizeOptions) -> Result<NormalizedImage, PhotoError> {
    let img = match source {
        ImageSource::Encoded(bytes) => decode(bytes)?,
        ImageSource::Frame(frame) => frame_to_image(frame)?,
    };

    let (width, height) = fit_within(img.width(), img.height(), opts.max_edge);
    let scaled = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    let data_url = encode_jpeg_data_url(&scaled, opts.quality)?;
    debug!("Normalized image to {}x{} ({} KB)", width, height, data_url.len() / 1024);

    Ok(NormalizedImage {
        data_url,
        width,
        height,
    })
}

/// Split a base64 data URL into its MIME type and payload bytes
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let rest = data_url.strip_prefix("data:").ok_or(PhotoError::DataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(PhotoError::DataUrl)?;
    let mime = meta.strip_suffix(";base64").ok_or(PhotoError::DataUrl)?;
    let bytes = STANDARD.decode(payload).map_err(|_| PhotoError::DataUrl)?;
    Ok((mime.to_string(), bytes))
}

/// Pixel size of the picture inside a data URL
pub fn data_url_dimensions(data_url: &str) -> Result<(u32, u32), PhotoError> {
    let (_, bytes) = decode_data_url(data_url)?;
    let img = decode(&bytes)?;
    Ok((img.width(), img.height()))
}

/// True only for absolute http(s) URLs
pub fn looks_like_url(input: &str) -> bool {
    url::Url::parse(input.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// MIME check by extension; non-images are rejected before any decode
pub fn is_image_file(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(4000, 3000, 1280), (1280, 960));
        assert_eq!(fit_within(3000, 4000, 1280), (960, 1280));
        assert_eq!(fit_within(800, 600, 1280), (800, 600));
        assert_eq!(fit_within(10000, 3, 1280), (1280, 1));
        assert_eq!(fit_within(1281, 1281, 1280), (1280, 1280));
    }

    #[test]
    fn test_normalize_large_png() {
        let source = ImageSource::Encoded(png_bytes(2000, 1000));
        let out = normalize(&source, &NormalizeOptions::default()).unwrap();

        assert!(out.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!((out.width, out.height), (1280, 640));
        assert_eq!(data_url_dimensions(&out.data_url).unwrap(), (1280, 640));

        let (mime, bytes) = decode_data_url(&out.data_url).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_normalize_keeps_small_images() {
        let source = ImageSource::Encoded(png_bytes(300, 200));
        let out = normalize(&source, &NormalizeOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
    }

    #[test]
    fn test_normalize_frame() {
        let frame = RawFrame {
            width: 1920,
            height: 1080,
            rgba: vec![200; 1920 * 1080 * 4],
        };
        let out = normalize(&ImageSource::Frame(frame), &NormalizeOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (1280, 720));

        let empty = RawFrame { width: 0, height: 720, rgba: vec![] };
        assert!(matches!(
            normalize(&ImageSource::Frame(empty), &NormalizeOptions::default()),
            Err(PhotoError::EmptyFrame)
        ));

        let short = RawFrame { width: 4, height: 4, rgba: vec![0; 10] };
        assert!(matches!(
            normalize(&ImageSource::Frame(short), &NormalizeOptions::default()),
            Err(PhotoError::BadFrame { .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let source = ImageSource::Encoded(b"definitely not a picture".to_vec());
        assert!(matches!(
            normalize(&source, &NormalizeOptions::default()),
            Err(PhotoError::Decode(_))
        ));
    }

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("https://example.com/shirt.jpg"));
        assert!(looks_like_url(" http://example.com/a.png "));
        assert!(!looks_like_url("ftp://example.com/a.png"));
        assert!(!looks_like_url("shirt.jpg"));
        assert!(!looks_like_url(""));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("IMG_0001.JPG")));
        assert!(is_image_file(Path::new("photo.webp")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_bad_data_url() {
        assert!(decode_data_url("https://example.com/a.jpg").is_err());
        assert!(decode_data_url("data:image/jpeg,plain").is_err());
        assert!(decode_data_url("data:image/jpeg;base64,***").is_err());
    }
}
