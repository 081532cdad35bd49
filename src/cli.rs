//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Parse a GPIO endpoint: a global line number, optionally prefixed `sysfs:`
pub fn parse_gpio_endpoint(s: &str) -> Result<u32, String> {
    let number = s.strip_prefix("sysfs:").unwrap_or(s);
    number
        .parse::<u32>()
        .map_err(|e| format!("Invalid GPIO number '{}': {}", s, e))
}

/// Parse an SPI mode in 0..=3
fn parse_spi_mode(s: &str) -> Result<u8, String> {
    match s.parse::<u8>() {
        Ok(mode) if mode <= 3 => Ok(mode),
        Ok(mode) => Err(format!("SPI mode must be 0..3, got {}", mode)),
        Err(e) => Err(format!("Invalid SPI mode: {}", e)),
    }
}

/// Parse a nonzero frame count
fn parse_frame_count(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Frame count must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Invalid number: {}", e)),
    }
}

#[derive(Parser, Debug)]
#[command(name = "rads")]
#[command(author, version, about = "ADS1278 frame capture utility", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// SPI device node
    #[arg(long, default_value = "/dev/spidev2.0")]
    pub spidev: String,

    /// SPI clock in Hz
    #[arg(long, default_value_t = 1_000_000)]
    pub sclk_hz: u32,

    /// SPI mode (0..3)
    #[arg(long, default_value_t = 0, value_parser = parse_spi_mode)]
    pub spi_mode: u8,

    /// DRDY input GPIO (N or sysfs:N)
    #[arg(long, value_parser = parse_gpio_endpoint)]
    pub drdy: u32,

    /// SYNC output GPIO (N or sysfs:N)
    #[arg(
        long,
        value_parser = parse_gpio_endpoint,
        required_unless_present = "no_sync"
    )]
    pub sync: Option<u32>,

    /// Disable the SYNC pulse (overrides --sync)
    #[arg(long)]
    pub no_sync: bool,

    /// Frames to discard after the SYNC pulse
    #[arg(long, default_value_t = 0)]
    pub settle_frames: u32,

    /// DRDY wait timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub drdy_timeout_ms: u32,

    /// Frames to capture
    #[arg(long, default_value_t = 1000, value_parser = parse_frame_count)]
    pub frames: u64,

    /// Write binary capture records to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Pretty-print each frame
    #[arg(long)]
    pub print: bool,

    /// Hex dump the first N raw SPI frames
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub hex: u64,

    /// Use the simulated converter instead of hardware
    #[arg(long)]
    pub dummy: bool,
}
