//! rads - ADS1278 frame capture utility
//!
//! Opens the converter on a spidev bus with sysfs GPIO data-ready and sync
//! lines, captures a fixed number of frames, and optionally prints them,
//! hex-dumps the raw TDM frames, or writes binary records to a file.

mod cli;
mod commands;
mod platforms;

use clap::Parser;
use cli::Cli;
use commands::capture::CaptureOptions;
use rads_core::DeviceConfig;

/// Build the driver configuration from the command line
fn device_config(cli: &Cli) -> DeviceConfig {
    let config = DeviceConfig::new(cli.drdy)
        .with_spidev(cli.spidev.as_str())
        .with_sclk_hz(cli.sclk_hz)
        .with_spi_mode(cli.spi_mode)
        .with_no_cs(true)
        .with_drdy_timeout_ms(cli.drdy_timeout_ms);

    match cli.sync {
        Some(line) if !cli.no_sync => config.with_sync(line, cli.settle_frames),
        _ => config,
    }
}

/// Logger with `RUST_LOG` applied, where `-v`/`-vv` override the default level
fn logger(verbose: u8) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_env(env_logger::Env::default());
    match verbose {
        0 => {} // RUST_LOG or info
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder
}

fn main() {
    let cli = Cli::parse();
    logger(cli.verbose).init();

    log::debug!("Platforms: {}", platforms::platform_names_short());

    let config = device_config(&cli);
    let opts = CaptureOptions {
        frames: cli.frames,
        out: cli.out.clone(),
        print: cli.print,
        hex_frames: cli.hex,
    };

    match platforms::run_capture(cli.dummy, &config, &opts) {
        Ok(captured) => eprintln!("Captured {} frame(s).", captured),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_config_from_cli() {
        let cli = Cli::try_parse_from([
            "rads",
            "--drdy",
            "968",
            "--sync",
            "sysfs:969",
            "--settle-frames",
            "4",
            "--spi-mode",
            "1",
        ])
        .unwrap();

        let eff = device_config(&cli).effective().unwrap();
        assert_eq!(eff.spidev_path, "/dev/spidev2.0");
        assert_eq!(eff.spi_mode, 1);
        assert!(eff.spi_no_cs);
        assert_eq!(eff.sync_line, Some(969));
        assert_eq!(eff.settle_frames, 4);
    }

    #[test]
    fn test_no_sync_wins_over_sync() {
        let cli =
            Cli::try_parse_from(["rads", "--drdy", "968", "--sync", "969", "--no-sync"]).unwrap();
        let eff = device_config(&cli).effective().unwrap();
        assert!(!eff.use_sync());
        assert_eq!(eff.sync_line, None);
    }

    #[test]
    fn test_verbose_raises_log_level() {
        assert_eq!(logger(1).build().filter(), log::LevelFilter::Debug);
        assert_eq!(logger(2).build().filter(), log::LevelFilter::Trace);
        assert_eq!(logger(3).build().filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_no_sync_config() {
        let cli = Cli::try_parse_from(["rads", "--drdy", "968", "--no-sync"]).unwrap();
        let eff = device_config(&cli).effective().unwrap();
        assert!(!eff.use_sync());
        assert_eq!(eff.drdy_timeout_ms, 2000);
    }
}
