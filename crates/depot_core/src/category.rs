//! File category enumeration.

use serde::{Deserialize, Serialize};

/// Closed set of storage categories.
///
/// Every stored file belongs to exactly one category, derived from its
/// MIME type. The category decides the on-disk directory and the size and
/// type policy applied at upload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Raster and vector images
    #[display("images")]
    Images,
    /// PDFs, text, office formats
    #[display("documents")]
    Documents,
    /// Video content
    #[display("videos")]
    Videos,
    /// Audio content
    #[display("audio")]
    Audio,
    /// Anything else
    #[display("others")]
    Others,
}

impl Category {
    /// String form used for directories, config keys and the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Videos => "videos",
            Category::Audio => "audio",
            Category::Others => "others",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(Category::Images),
            "documents" | "document" => Ok(Category::Documents),
            "videos" | "video" => Ok(Category::Videos),
            "audio" => Ok(Category::Audio),
            "others" | "other" => Ok(Category::Others),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}
