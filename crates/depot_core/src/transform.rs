//! Transform descriptors for derived image artifacts.
//!
//! A [`TransformDescriptor`] names one derived artifact. Its canonical form
//! is part of the artifact cache key, so two descriptors with the same set
//! fields always map to the same cached bytes.

use depot_error::{DepotResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Largest accepted blur sigma. Larger requests are clamped.
pub const MAX_BLUR: f32 = 100.0;

/// Quality used when a descriptor does not set one.
pub const DEFAULT_QUALITY: u8 = 80;

/// How a resize fits the source into the requested box.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Fill the box, preserving aspect ratio, cropping the overflow
    #[default]
    #[display("cover")]
    Cover,
    /// Fit inside the box, preserving aspect ratio, padding the remainder
    #[display("contain")]
    Contain,
    /// Stretch to the box, ignoring aspect ratio
    #[display("fill")]
    Fill,
    /// Fit within the box, preserving aspect ratio, no padding
    #[display("inside")]
    Inside,
    /// Cover the box, preserving aspect ratio, no cropping
    #[display("outside")]
    Outside,
}

impl std::str::FromStr for Fit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" => Ok(Fit::Cover),
            "contain" => Ok(Fit::Contain),
            "fill" => Ok(Fit::Fill),
            "inside" => Ok(Fit::Inside),
            "outside" => Ok(Fit::Outside),
            _ => Err(format!("Unknown fit: {}", s)),
        }
    }
}

/// Encodings the artifact cache can produce.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG, lossy, honours quality
    #[display("jpeg")]
    Jpeg,
    /// PNG, lossless
    #[display("png")]
    Png,
    /// WebP, lossless
    #[display("webp")]
    Webp,
    /// GIF
    #[display("gif")]
    Gif,
}

impl OutputFormat {
    /// File extension used for cached artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Gif => "gif",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Gif => "image/gif",
        }
    }

    /// Format matching a MIME type, if it is one we can encode.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::Webp),
            "image/gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            "gif" => Ok(OutputFormat::Gif),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Parameters defining one derived artifact. Unset fields are no-ops.
///
/// # Examples
///
/// ```
/// use depot_core::{Fit, TransformDescriptor};
///
/// let descriptor = TransformDescriptor {
///     width: Some(300),
///     fit: Some(Fit::Inside),
///     grayscale: Some(true),
///     ..Default::default()
/// };
/// assert_eq!(descriptor.canonical(), "fit=inside&grayscale=true&width=300");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    /// Target width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Target height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Encoder quality, 1 to 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Output encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// Resize fit policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<Fit>,
    /// Gaussian blur sigma
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
    /// Convert to grayscale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
}

impl TransformDescriptor {
    /// Deterministic serialization of the set fields, ordered by field name.
    pub fn canonical(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(blur) = self.effective_blur() {
            parts.push(format!("blur={}", blur));
        }
        if let Some(fit) = self.fit {
            parts.push(format!("fit={}", fit));
        }
        if let Some(format) = self.format {
            parts.push(format!("format={}", format));
        }
        if let Some(grayscale) = self.grayscale {
            parts.push(format!("grayscale={}", grayscale));
        }
        if let Some(height) = self.height {
            parts.push(format!("height={}", height));
        }
        if let Some(quality) = self.quality {
            parts.push(format!("quality={}", quality.clamp(1, 100)));
        }
        if let Some(width) = self.width {
            parts.push(format!("width={}", width));
        }
        parts.join("&")
    }

    /// Blur sigma after clamping, or `None` when blur is a no-op.
    pub fn effective_blur(&self) -> Option<f32> {
        self.blur
            .filter(|b| b.is_finite())
            .map(|b| b.clamp(0.0, MAX_BLUR))
            .filter(|b| *b > 0.0)
    }

    /// Quality after clamping, with the default applied.
    pub fn effective_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_QUALITY).clamp(1, 100)
    }

    /// True when the descriptor requests a resize.
    pub fn has_resize(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Parse CDN-style query parameters.
    ///
    /// Accepts `w|width`, `h|height`, `q|quality`, `f|format`, `fit`, `blur`
    /// and `grayscale`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a recognised key has an invalid value.
    pub fn from_params<'a>(
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> DepotResult<Self> {
        let mut descriptor = Self::default();
        for (key, value) in params {
            let value = value.trim();
            match key {
                "w" | "width" => descriptor.width = Some(parse_dimension("width", value)?),
                "h" | "height" => descriptor.height = Some(parse_dimension("height", value)?),
                "q" | "quality" => {
                    let quality: u8 = value.parse().map_err(|_| {
                        ValidationError::invalid_parameter("quality", "must be 1-100")
                    })?;
                    if !(1..=100).contains(&quality) {
                        return Err(
                            ValidationError::invalid_parameter("quality", "must be 1-100").into(),
                        );
                    }
                    descriptor.quality = Some(quality);
                }
                "f" | "format" => {
                    descriptor.format = Some(
                        value
                            .parse()
                            .map_err(|e: String| ValidationError::invalid_parameter("format", e))?,
                    );
                }
                "fit" => {
                    descriptor.fit = Some(
                        value
                            .parse()
                            .map_err(|e: String| ValidationError::invalid_parameter("fit", e))?,
                    );
                }
                "blur" => {
                    let blur: f32 = value.parse().map_err(|_| {
                        ValidationError::invalid_parameter("blur", "must be a number")
                    })?;
                    if !blur.is_finite() || blur < 0.0 {
                        return Err(ValidationError::invalid_parameter(
                            "blur",
                            "must be a non-negative number",
                        )
                        .into());
                    }
                    descriptor.blur = Some(blur.min(MAX_BLUR));
                }
                "grayscale" | "greyscale" => {
                    descriptor.grayscale = Some(matches!(
                        value.to_ascii_lowercase().as_str(),
                        "" | "true" | "1" | "yes"
                    ));
                }
                _ => {}
            }
        }
        Ok(descriptor)
    }
}

fn parse_dimension(name: &str, value: &str) -> DepotResult<u32> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| ValidationError::invalid_parameter(name, "must be a positive integer"))?;
    if parsed == 0 || parsed > 10_000 {
        return Err(ValidationError::invalid_parameter(name, "must be between 1 and 10000").into());
    }
    Ok(parsed)
}
