//! Device configuration
//!
//! `DeviceConfig` is what callers fill in; zero or unset numeric fields are
//! replaced with defaults by [`DeviceConfig::effective`] before the driver
//! touches any hardware.

use crate::error::{Error, Result};

use std::time::Duration;

/// Default spidev node the converter is wired to
pub const DEFAULT_SPIDEV: &str = "/dev/spidev2.0";

/// Default SPI clock in Hz (1 MHz)
pub const DEFAULT_SCLK_HZ: u32 = 1_000_000;

/// Default data-ready wait timeout in milliseconds
pub const DEFAULT_DRDY_TIMEOUT_MS: u32 = 2000;

/// Highest valid SPI mode number
pub const MAX_SPI_MODE: u8 = 3;

/// Configuration for opening the converter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// spidev path (default: `/dev/spidev2.0`)
    pub spidev_path: Option<String>,
    /// SPI clock in Hz (0 selects the default)
    pub sclk_hz: u32,
    /// SPI mode 0-3
    pub spi_mode: u8,
    /// Request a transfer mode without chip-select
    pub spi_no_cs: bool,
    /// Data-ready input line (sysfs global GPIO number)
    pub drdy_line: u32,
    /// Sync output line (sysfs global GPIO number)
    pub sync_line: Option<u32>,
    /// Pulse sync on start
    pub use_sync: bool,
    /// Frames discarded after the sync pulse
    pub settle_frames: u32,
    /// Data-ready wait timeout in ms (0 selects the default)
    pub drdy_timeout_ms: u32,
}

impl DeviceConfig {
    /// Create a configuration for the given data-ready line
    ///
    /// Sync is disabled until [`DeviceConfig::with_sync`] is called.
    pub fn new(drdy_line: u32) -> Self {
        Self {
            drdy_line,
            ..Default::default()
        }
    }

    /// Set the spidev path
    pub fn with_spidev(mut self, path: impl Into<String>) -> Self {
        self.spidev_path = Some(path.into());
        self
    }

    /// Set the SPI clock in Hz
    pub fn with_sclk_hz(mut self, sclk_hz: u32) -> Self {
        self.sclk_hz = sclk_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_spi_mode(mut self, mode: u8) -> Self {
        self.spi_mode = mode;
        self
    }

    /// Request a transfer mode without chip-select
    pub fn with_no_cs(mut self, no_cs: bool) -> Self {
        self.spi_no_cs = no_cs;
        self
    }

    /// Enable the sync pulse on the given output line
    pub fn with_sync(mut self, sync_line: u32, settle_frames: u32) -> Self {
        self.sync_line = Some(sync_line);
        self.use_sync = true;
        self.settle_frames = settle_frames;
        self
    }

    /// Set the data-ready timeout in ms
    pub fn with_drdy_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.drdy_timeout_ms = timeout_ms;
        self
    }

    /// Apply defaults and validate
    pub fn effective(&self) -> Result<EffectiveConfig> {
        if self.spi_mode > MAX_SPI_MODE {
            return Err(Error::InvalidArgument(format!(
                "SPI mode {} (must be 0-{})",
                self.spi_mode, MAX_SPI_MODE
            )));
        }

        let sync_line = if self.use_sync {
            match self.sync_line {
                Some(line) => Some(line),
                None => {
                    return Err(Error::InvalidArgument(
                        "sync enabled but no sync line given".into(),
                    ))
                }
            }
        } else {
            None
        };

        let spidev_path = match self.spidev_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => DEFAULT_SPIDEV.to_string(),
        };

        Ok(EffectiveConfig {
            spidev_path,
            sclk_hz: if self.sclk_hz == 0 {
                DEFAULT_SCLK_HZ
            } else {
                self.sclk_hz
            },
            spi_mode: self.spi_mode,
            spi_no_cs: self.spi_no_cs,
            drdy_line: self.drdy_line,
            sync_line,
            settle_frames: self.settle_frames,
            drdy_timeout_ms: if self.drdy_timeout_ms == 0 {
                DEFAULT_DRDY_TIMEOUT_MS
            } else {
                self.drdy_timeout_ms
            },
        })
    }
}

/// Configuration with defaults applied; immutable while the device is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    /// spidev path
    pub spidev_path: String,
    /// SPI clock in Hz
    pub sclk_hz: u32,
    /// SPI mode 0-3
    pub spi_mode: u8,
    /// Request a transfer mode without chip-select
    pub spi_no_cs: bool,
    /// Data-ready input line
    pub drdy_line: u32,
    /// Sync output line, present only when sync is enabled
    pub sync_line: Option<u32>,
    /// Frames discarded after the sync pulse
    pub settle_frames: u32,
    /// Data-ready wait timeout in ms
    pub drdy_timeout_ms: u32,
}

impl EffectiveConfig {
    /// Whether start pulses the sync line
    pub fn use_sync(&self) -> bool {
        self.sync_line.is_some()
    }

    /// The data-ready timeout as a `Duration`
    pub fn drdy_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.drdy_timeout_ms))
    }

    /// The transport part of the configuration
    pub fn transport(&self) -> TransportConfig<'_> {
        TransportConfig {
            path: &self.spidev_path,
            sclk_hz: self.sclk_hz,
            mode: self.spi_mode,
            no_cs: self.spi_no_cs,
        }
    }
}

/// Parameters handed to [`crate::platform::Platform::open_transport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig<'a> {
    /// Bus device path
    pub path: &'a str,
    /// Maximum clock rate in Hz
    pub sclk_hz: u32,
    /// Transfer mode 0-3
    pub mode: u8,
    /// Try a mode without chip-select first
    pub no_cs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let cfg = DeviceConfig::new(968).effective().unwrap();
        assert_eq!(cfg.spidev_path, DEFAULT_SPIDEV);
        assert_eq!(cfg.sclk_hz, DEFAULT_SCLK_HZ);
        assert_eq!(cfg.drdy_timeout_ms, DEFAULT_DRDY_TIMEOUT_MS);
        assert_eq!(cfg.drdy_line, 968);
        assert!(!cfg.use_sync());
    }

    #[test]
    fn test_explicit_values_kept() {
        let cfg = DeviceConfig::new(1)
            .with_spidev("/dev/spidev0.1")
            .with_sclk_hz(4_000_000)
            .with_spi_mode(1)
            .with_no_cs(true)
            .with_sync(2, 5)
            .with_drdy_timeout_ms(50)
            .effective()
            .unwrap();

        assert_eq!(cfg.spidev_path, "/dev/spidev0.1");
        assert_eq!(cfg.sclk_hz, 4_000_000);
        assert_eq!(cfg.sync_line, Some(2));
        assert_eq!(cfg.settle_frames, 5);
        assert_eq!(cfg.drdy_timeout(), Duration::from_millis(50));
        assert!(cfg.transport().no_cs);
    }

    #[test]
    fn test_empty_path_uses_default() {
        let cfg = DeviceConfig::new(1).with_spidev("").effective().unwrap();
        assert_eq!(cfg.spidev_path, DEFAULT_SPIDEV);
    }

    #[test]
    fn test_sync_without_line_rejected() {
        let cfg = DeviceConfig {
            use_sync: true,
            ..DeviceConfig::new(1)
        };
        assert!(matches!(cfg.effective(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_sync_line_ignored_when_disabled() {
        let cfg = DeviceConfig {
            sync_line: Some(7),
            use_sync: false,
            ..DeviceConfig::new(1)
        };
        assert_eq!(cfg.effective().unwrap().sync_line, None);
    }

    #[test]
    fn test_bad_mode_rejected() {
        let cfg = DeviceConfig::new(1).with_spi_mode(4);
        assert!(matches!(cfg.effective(), Err(Error::InvalidArgument(_))));
    }
}
