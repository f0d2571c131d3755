//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Digit Canvas - draw a digit, snapshot it, classify it
#[derive(Parser, Debug)]
#[command(name = "digit-canvas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline on scripted digit gestures
    Demo {
        /// Digit to draw (0-9)
        #[arg(short, long, default_value = "7")]
        digit: u8,

        /// Number of snapshot ticks to run
        #[arg(short, long, default_value = "3")]
        ticks: u64,

        /// Weight file for the on-device model
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Classify against a remote endpoint instead of the local model
        #[arg(short, long)]
        remote: Option<String>,

        /// Write the final preview snapshot as a PGM file
        #[arg(short, long)]
        preview: bool,
    },

    /// Classify a single image (or a scripted digit) once and print rankings
    Classify {
        /// PGM image to classify; omitted means --digit is rendered instead
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Digit to render when no input file is given
        #[arg(short, long, default_value = "7")]
        digit: u8,

        /// Weight file for the on-device model
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Build the bundled template model from the scripted digits
    MakeModel {
        /// Where to write the weight file
        #[arg(short, long, default_value = "model.bin")]
        output: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
