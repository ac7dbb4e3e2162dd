//! Command-line interface for vodpipe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Media processing pipeline
#[derive(Parser, Debug)]
#[command(name = "vodpipe", version, about = "Transcribe, caption and package uploaded video")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stage progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the audio track of a video URL and upload it
    Audio {
        /// Source video URL
        url: String,
    },

    /// Transcribe an uploaded audio blob into captions and a transcript
    Captions {
        /// Audio blob name (e.g. talk.wav)
        blob: String,
    },

    /// Transcode a video URL into HLS renditions and upload the tree
    Hls {
        /// Source video URL
        url: String,
    },

    /// Run the full pipeline: audio, captions, then HLS packaging
    Run {
        /// Source video URL
        url: String,
    },

    /// Check external dependencies and configuration
    Check,
}
