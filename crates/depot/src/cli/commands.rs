//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Depot - file storage with metadata, listings and cached image transforms
#[derive(Parser, Debug)]
#[command(name = "depot")]
#[command(
    about = "File storage with metadata, listings and cached image transforms",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Load configuration from this file instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as an anonymous caller instead of the operator
    #[arg(long, global = true)]
    pub anonymous: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file
    Upload {
        /// File to upload
        file: PathBuf,

        /// Name to record instead of the file's own name
        #[arg(long)]
        name: Option<String>,

        /// Declared MIME type
        #[arg(long)]
        mime: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Require authentication to read the content
        #[arg(long)]
        private: bool,

        /// Expire after this many seconds
        #[arg(long)]
        expires_in: Option<u64>,

        /// Skip thumbnail generation
        #[arg(long)]
        no_thumbnail: bool,

        /// Shrink images so neither side exceeds this many pixels
        #[arg(long)]
        max_dimension: Option<u32>,

        /// Encoder quality used when shrinking
        #[arg(long)]
        quality: Option<u8>,
    },

    /// Show a record, optionally saving its content
    Get {
        /// Record id
        id: String,

        /// Write the content here (counts as a download)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List records
    List {
        /// Category filter (`all`, `images`, `documents`, `videos`, `audio`, `others`)
        #[arg(long, default_value = "all")]
        category: String,

        /// Substring of the name or a tag
        #[arg(long)]
        search: Option<String>,

        /// Sort key (`uploadedAt`, `size`, `originalName`, `downloads`)
        #[arg(long, default_value = "uploadedAt")]
        sort: String,

        /// Sort order (`asc` or `desc`)
        #[arg(long, default_value = "desc")]
        order: String,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Page size
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Change the public flag, tags or expiry of a record
    Update {
        /// Record id
        id: String,

        /// New public flag
        #[arg(long)]
        public: Option<bool>,

        /// Replacement tag (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,

        /// Expire this many seconds from now
        #[arg(long, conflicts_with = "no_expiry")]
        expires_in: Option<u64>,

        /// Remove the expiry
        #[arg(long)]
        no_expiry: bool,
    },

    /// Delete a record with its content and cached variants
    Delete {
        /// Record id
        id: String,
    },

    /// Delete every expired record
    Sweep,

    /// Produce a derived image
    Transform {
        /// Record id
        id: String,

        /// Named preset; wins over parameters
        #[arg(long)]
        preset: Option<String>,

        /// Transform parameter as `key=value` (repeatable), e.g. `w=300`
        #[arg(long = "param")]
        params: Vec<String>,

        /// Where to write the result
        #[arg(long)]
        output: PathBuf,
    },

    /// Show storage totals
    Stats,

    /// List the named transform presets
    Presets,

    /// Report records whose stored content is missing
    Verify,
}
