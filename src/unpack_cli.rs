//! CLI argument parsing for rads-unpack

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output text layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Tab separated
    Tsv,
    /// Comma separated
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "rads-unpack")]
#[command(author, version, about = "Convert rads --out capture records to TSV/CSV", long_about = None)]
pub struct UnpackCli {
    /// Binary capture file written by rads --out
    pub input: PathBuf,

    /// Output text file (default: <input> with a .tsv or .csv extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output delimiter format
    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    pub format: Format,

    /// Convert channel samples to volts (see --vref)
    #[arg(long)]
    pub to_volts: bool,

    /// Reference voltage for --to-volts
    #[arg(long, default_value_t = 2.5)]
    pub vref: f64,
}
