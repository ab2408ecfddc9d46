//! Named transform presets.

use crate::{Fit, OutputFormat, TransformDescriptor};
use depot_error::{DepotResult, NotFoundError, NotFoundErrorKind};

/// Name of the preset used for upload-time thumbnails.
pub const THUMBNAIL_PRESET: &str = "thumbnail";

/// Every preset name, in display order.
pub const PRESET_NAMES: [&str; 6] = [
    "thumbnail",
    "small",
    "medium",
    "large",
    "avatar",
    "banner",
];

/// Look up a preset by name.
///
/// # Examples
///
/// ```
/// use depot_core::preset;
///
/// let avatar = preset("avatar").unwrap();
/// assert_eq!(avatar.width, Some(128));
/// assert!(preset("poster").is_none());
/// ```
pub fn preset(name: &str) -> Option<TransformDescriptor> {
    let descriptor = match name {
        "thumbnail" => boxed(200, 200, Fit::Cover, OutputFormat::Jpeg, 80),
        "small" => bounded(320, OutputFormat::Jpeg, 80),
        "medium" => bounded(640, OutputFormat::Jpeg, 85),
        "large" => bounded(1280, OutputFormat::Jpeg, 85),
        "avatar" => boxed(128, 128, Fit::Cover, OutputFormat::Png, 90),
        "banner" => boxed(1200, 300, Fit::Cover, OutputFormat::Jpeg, 85),
        _ => return None,
    };
    Some(descriptor)
}

/// All presets with their descriptors.
pub fn presets() -> Vec<(&'static str, TransformDescriptor)> {
    PRESET_NAMES
        .iter()
        .filter_map(|name| preset(name).map(|d| (*name, d)))
        .collect()
}

/// Resolve a transform request: a named preset wins, explicit parameters
/// are only consulted when no preset is named.
///
/// # Errors
///
/// Returns not-found for an unknown preset name and a validation error for
/// malformed explicit parameters.
pub fn resolve_descriptor<'a>(
    preset_name: Option<&str>,
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> DepotResult<TransformDescriptor> {
    match preset_name.map(str::trim).filter(|p| !p.is_empty()) {
        Some(name) => preset(&name.to_ascii_lowercase())
            .ok_or_else(|| NotFoundError::new(NotFoundErrorKind::Preset(name.to_string())).into()),
        None => TransformDescriptor::from_params(params),
    }
}

fn boxed(
    width: u32,
    height: u32,
    fit: Fit,
    format: OutputFormat,
    quality: u8,
) -> TransformDescriptor {
    TransformDescriptor {
        width: Some(width),
        height: Some(height),
        quality: Some(quality),
        format: Some(format),
        fit: Some(fit),
        ..Default::default()
    }
}

fn bounded(width: u32, format: OutputFormat, quality: u8) -> TransformDescriptor {
    TransformDescriptor {
        width: Some(width),
        quality: Some(quality),
        format: Some(format),
        fit: Some(Fit::Inside),
        ..Default::default()
    }
}
