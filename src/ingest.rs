//! Upload decoding: bytes in, upright RGB bitmap out.
//!
//! The primary decoder sniffs the format from the content. When that fails the
//! fallback decoder tries the format implied by the upload's file name, then
//! formats without a magic number, then a lenient pass over cut-off JPEG and
//! PNG data, then HEIF (behind the `heif` feature). EXIF orientation is applied afterwards so phone photos reach the model the
//! right way up.

use std::io::Cursor;
use std::path::Path;

use image::codecs::png::PngDecoder;
use image::{
    ColorType, DynamicImage, GrayAlphaImage, GrayImage, ImageDecoder, ImageFormat, ImageReader,
    RgbImage, RgbaImage,
};
use tracing::{debug, warn};

use crate::error::{DiagnosisError, Result};

/// Extensions the upload widget accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "heic", "heif"];

/// Formats `image` cannot recognise from their first bytes.
const SIGNATURELESS_FORMATS: [ImageFormat; 1] = [ImageFormat::Tga];

const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedBy {
    Primary,
    Fallback,
}

#[derive(Debug)]
pub struct DecodedImage {
    pub rgb: RgbImage,
    pub decoded_by: DecodedBy,
    /// EXIF orientation tag that was applied (1 = none).
    pub orientation: u32,
}

pub fn is_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an uploaded image. `name_hint` is the uploaded file name, if known.
pub fn decode_upload(bytes: &[u8], name_hint: Option<&str>) -> Result<DecodedImage> {
    if bytes.is_empty() {
        return Err(DiagnosisError::EmptyInput);
    }

    let (image, decoded_by, oriented) = match decode_primary(bytes) {
        Ok(image) => (image, DecodedBy::Primary, false),
        Err(primary) => {
            debug!(error = %primary, "primary decoder rejected upload, trying fallback");
            match decode_fallback(bytes, name_hint) {
                Ok((image, oriented)) => (image, DecodedBy::Fallback, oriented),
                Err(fallback) => {
                    return Err(DiagnosisError::DecodeFailure {
                        primary: primary.to_string(),
                        fallback,
                    });
                }
            }
        }
    };

    // HEIF decoding already applies the container's rotation.
    let orientation = if oriented { 1 } else { read_exif_orientation(bytes) };
    let image = apply_orientation(image, orientation);

    debug!(
        width = image.width(),
        height = image.height(),
        orientation,
        ?decoded_by,
        "decoded upload"
    );

    Ok(DecodedImage {
        rgb: image.to_rgb8(),
        decoded_by,
        orientation,
    })
}

fn decode_primary(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
}

/// Returns the image and whether orientation was already applied. On failure
/// every attempted format's error is reported, hinted format first.
fn decode_fallback(bytes: &[u8], name_hint: Option<&str>) -> std::result::Result<(DynamicImage, bool), String> {
    let mut errors = Vec::new();

    let hinted = name_hint.and_then(|name| ImageFormat::from_path(name).ok());
    let candidates = hinted
        .into_iter()
        .chain(SIGNATURELESS_FORMATS.iter().copied().filter(|f| Some(*f) != hinted));

    for format in candidates {
        match image::load_from_memory_with_format(bytes, format) {
            Ok(image) => return Ok((image, false)),
            Err(err) => errors.push(format!("{format:?}: {err}")),
        }
    }

    let truncated = match image::guess_format(bytes).ok().or(hinted) {
        Some(ImageFormat::Jpeg) => Some((ImageFormat::Jpeg, decode_truncated_jpeg(bytes))),
        Some(ImageFormat::Png) => Some((ImageFormat::Png, decode_truncated_png(bytes))),
        _ => None,
    };
    match truncated {
        Some((format, Ok(image))) => {
            warn!(?format, "upload is cut off, missing rows are padded");
            return Ok((image, false));
        }
        Some((format, Err(err))) => errors.push(format!("truncated {format:?}: {err}")),
        None => {}
    }

    #[cfg(feature = "heif")]
    match heif::decode(bytes) {
        Ok(image) => return Ok((image, true)),
        Err(err) => errors.push(format!("HEIF: {err}")),
    }

    if errors.is_empty() {
        errors.push("no fallback format applies".to_string());
    }
    Err(errors.join("; "))
}

/// The JPEG decoder already fills a short scan with padding; a missing
/// end-of-image marker is the part it refuses.
fn decode_truncated_jpeg(bytes: &[u8]) -> std::result::Result<DynamicImage, String> {
    let mut patched = Vec::with_capacity(bytes.len() + JPEG_EOI.len());
    patched.extend_from_slice(bytes);
    patched.extend_from_slice(&JPEG_EOI);
    image::load_from_memory_with_format(&patched, ImageFormat::Jpeg).map_err(|e| e.to_string())
}

/// Keeps the rows decoded before the data ran out; the rest stay black.
/// Needs an intact header and 8-bit samples.
fn decode_truncated_png(bytes: &[u8]) -> std::result::Result<DynamicImage, String> {
    let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    let len = usize::try_from(decoder.total_bytes()).map_err(|e| e.to_string())?;

    let mut buf = vec![0u8; len];
    if let Err(err) = decoder.read_image(&mut buf) {
        debug!(error = %err, "PNG data ended early");
    }

    let image = match color {
        ColorType::L8 => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
        ColorType::La8 => GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8),
        ColorType::Rgb8 => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
        ColorType::Rgba8 => RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8),
        other => return Err(format!("cannot pad {other:?} samples")),
    };
    image.ok_or_else(|| "PNG buffer size does not match its dimensions".to_string())
}

/// Read EXIF orientation tag (0x0112) from raw image bytes.
/// Returns 1 (normal) if there is no EXIF data or no tag.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(_) => return 1,
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(1)
}

/// 1 = normal, 2 = mirrored, 3 = 180, 4 = flipped vertically,
/// 5 = mirrored + 90 CW, 6 = 90 CW, 7 = mirrored + 270 CW, 8 = 270 CW.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(feature = "heif")]
mod heif {
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, String> {
        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(|e| e.to_string())?;
        let handle = ctx.primary_image_handle().map_err(|e| e.to_string())?;
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| e.to_string())?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or("HEIF image has no interleaved RGB plane")?;
        let row_len = plane.width as usize * 3;

        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        RgbImage::from_raw(plane.width, plane.height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "HEIF plane size does not match its dimensions".to_string())
    }
}
