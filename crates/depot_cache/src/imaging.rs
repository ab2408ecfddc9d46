//! Image decode, transform and encode.
//!
//! Everything here is synchronous and CPU-bound. Async callers go through
//! [`render_blocking`], which moves the work onto the blocking pool.

use depot_core::{Fit, OutputFormat, TransformDescriptor};
use depot_error::{DepotResult, TransformError, TransformErrorKind};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

const FILTER: FilterType = FilterType::Lanczos3;

/// Pixel dimensions read from the image header, without a full decode.
///
/// # Errors
///
/// Returns an unsupported-format error when the format is unknown and a
/// decode error when the header is unreadable.
pub fn dimensions(data: &[u8]) -> DepotResult<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::new(TransformErrorKind::Decode(e.to_string())))?;
    let dims = reader.into_dimensions().map_err(decode_error)?;
    Ok(dims)
}

/// Encoding an artifact gets when the descriptor does not name one.
///
/// The source format is kept when we can encode it, otherwise PNG.
pub fn output_format(descriptor: &TransformDescriptor, source_mime: &str) -> OutputFormat {
    descriptor
        .format
        .or_else(|| OutputFormat::from_mime(source_mime))
        .unwrap_or(OutputFormat::Png)
}

/// Run the transform pipeline: resize, blur, grayscale, encode.
///
/// # Errors
///
/// Returns a transform error when the source cannot be decoded or the
/// result cannot be encoded. Formats the `image` crate has no codec for
/// come back as [`TransformErrorKind::UnsupportedFormat`].
pub fn render(
    source: &[u8],
    descriptor: &TransformDescriptor,
    format: OutputFormat,
) -> DepotResult<Vec<u8>> {
    let mut img = image::load_from_memory(source).map_err(decode_error)?;

    if let Some((width, height)) = target_box(descriptor, img.width(), img.height()) {
        img = resize(&img, descriptor.fit.unwrap_or_default(), width, height, format);
    }
    if let Some(sigma) = descriptor.effective_blur() {
        img = img.blur(sigma);
    }
    if descriptor.grayscale == Some(true) {
        img = img.grayscale();
    }

    encode(&img, format, descriptor.effective_quality())
}

/// [`render`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`render`], plus a task error if the worker panics.
pub async fn render_blocking(
    source: Vec<u8>,
    descriptor: TransformDescriptor,
    format: OutputFormat,
) -> DepotResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || render(&source, &descriptor, format))
        .await
        .map_err(|e| TransformError::new(TransformErrorKind::Task(e.to_string())))?
}

/// The box the image is resized into, or `None` when no resize was asked for.
///
/// A single requested side derives the other from the source aspect ratio.
/// The box never exceeds the source except for [`Fit::Fill`].
fn target_box(
    descriptor: &TransformDescriptor,
    src_w: u32,
    src_h: u32,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = (src_w.max(1), src_h.max(1));
    let (width, height) = match (descriptor.width, descriptor.height) {
        (None, None) => return None,
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, proportional(src_h, w, src_w)),
        (None, Some(h)) => (proportional(src_w, h, src_h), h),
    };

    let (width, height) = if descriptor.fit == Some(Fit::Fill) {
        (width, height)
    } else {
        (width.min(src_w), height.min(src_h))
    };
    Some((width.max(1), height.max(1)))
}

fn proportional(other: u32, target: u32, side: u32) -> u32 {
    let scaled = (u64::from(other) * u64::from(target) + u64::from(side) / 2) / u64::from(side);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

fn resize(
    img: &DynamicImage,
    fit: Fit,
    width: u32,
    height: u32,
    format: OutputFormat,
) -> DynamicImage {
    match fit {
        Fit::Cover => img.resize_to_fill(width, height, FILTER),
        Fit::Fill => img.resize_exact(width, height, FILTER),
        Fit::Inside => img.resize(width, height, FILTER),
        Fit::Outside => {
            let scale = (f64::from(width) / f64::from(img.width()))
                .max(f64::from(height) / f64::from(img.height()));
            let w = (f64::from(img.width()) * scale).round().max(1.0) as u32;
            let h = (f64::from(img.height()) * scale).round().max(1.0) as u32;
            img.resize_exact(w, h, FILTER)
        }
        Fit::Contain => {
            let inner = img.resize(width, height, FILTER).to_rgba8();
            // JPEG has no alpha channel
            let background = if format == OutputFormat::Jpeg {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            };
            let mut canvas = RgbaImage::from_pixel(width, height, background);
            let x = i64::from((width - inner.width()) / 2);
            let y = i64::from((height - inner.height()) / 2);
            imageops::overlay(&mut canvas, &inner, x, y);
            DynamicImage::ImageRgba8(canvas)
        }
    }
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> DepotResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            img.to_rgb8().write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut out, ImageFormat::Png),
        OutputFormat::Webp => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut out, ImageFormat::WebP)
        }
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut out, ImageFormat::Gif)
        }
    };
    result.map_err(encode_error)?;
    Ok(out.into_inner())
}

fn decode_error(e: ImageError) -> TransformError {
    match e {
        ImageError::Unsupported(_) => {
            TransformError::new(TransformErrorKind::UnsupportedFormat(e.to_string()))
        }
        _ => TransformError::new(TransformErrorKind::Decode(e.to_string())),
    }
}

fn encode_error(e: ImageError) -> TransformError {
    match e {
        ImageError::Unsupported(_) => {
            TransformError::new(TransformErrorKind::UnsupportedFormat(e.to_string()))
        }
        _ => TransformError::new(TransformErrorKind::Encode(e.to_string())),
    }
}
