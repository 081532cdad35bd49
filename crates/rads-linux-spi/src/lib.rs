//! rads-linux-spi - Linux spidev transport
//!
//! This crate moves TDM frames out of the converter through the
//! `/dev/spidevX.Y` character device.
//!
//! # Overview
//!
//! The ADS1278 has no chip-select input, so the bus is normally opened with
//! `SPI_NO_CS`. Some controller drivers reject that flag; in that case the
//! mode is written once more without it and the transfer still works because
//! the converter ignores the chip-select line.
//!
//! The converter is receive-only: every exchange clocks out zeros and keeps
//! what comes back.
//!
//! # Example
//!
//! ```no_run
//! use rads_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use rads_core::platform::FrameTransport;
//! use rads_core::FRAME_BYTES;
//!
//! let config = LinuxSpiConfig::new("/dev/spidev2.0")
//!     .with_speed(1_000_000)
//!     .with_no_cs(true);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! let mut rx = [0u8; FRAME_BYTES];
//! spi.exchange(&[0u8; FRAME_BYTES], &mut rx)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`

pub mod device;
pub mod error;

// Re-exports
pub use device::{LinuxSpi, LinuxSpiConfig, SpiModeFlags};
pub use error::{LinuxSpiError, Result};
