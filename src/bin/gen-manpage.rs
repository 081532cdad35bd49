//! Man page generator for the rads tools
//!
//! Writes `rads.1` and `rads-unpack.1`.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

#[path = "../unpack_cli.rs"]
#[allow(dead_code)]
mod unpack_cli;

/// Render one command's page into `dir`, returning the file written
fn render(cmd: clap::Command, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(format!("{}.1", cmd.get_name()));
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    fs::write(&path, buffer)?;
    Ok(path)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    for cmd in [cli::Cli::command(), unpack_cli::UnpackCli::command()] {
        let path = render(cmd, &output_dir)?;
        println!("Generated {} (view with: man -l {})", path.display(), path.display());
    }

    Ok(())
}
