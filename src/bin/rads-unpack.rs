//! rads-unpack - Convert binary capture records to delimited text
//!
//! Usage: rads-unpack capture.bin [--format csv] [--to-volts --vref 2.5]

use clap::Parser;
use rads_core::record::{self, TextFormat};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[path = "../unpack_cli.rs"]
mod unpack_cli;

use unpack_cli::{Format, UnpackCli};

impl From<Format> for TextFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Tsv => TextFormat::Tsv,
            Format::Csv => TextFormat::Csv,
        }
    }
}

/// Where the text goes when `--output` is not given
fn output_path(cli: &UnpackCli) -> PathBuf {
    match &cli.output {
        Some(path) => path.clone(),
        None => cli
            .input
            .with_extension(TextFormat::from(cli.format).extension()),
    }
}

/// Convert the capture; returns the record count and the output path
fn unpack(cli: &UnpackCli) -> Result<(u64, PathBuf), Box<dyn std::error::Error>> {
    let out_path = output_path(cli);
    let input = BufReader::new(File::open(&cli.input)?);
    let output = BufWriter::new(File::create(&out_path)?);
    let vref = cli.to_volts.then_some(cli.vref);

    log::debug!(
        "Unpacking {} to {} ({:?}, vref={:?})",
        cli.input.display(),
        out_path.display(),
        cli.format,
        vref
    );
    let n = record::export_text(input, output, cli.format.into(), vref)?;
    Ok((n, out_path))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = UnpackCli::parse();
    match unpack(&cli) {
        Ok((n, path)) => println!("Wrote {} record(s) to {}", n, path.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
