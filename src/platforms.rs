//! Platform registration and dispatch
//!
//! Each host platform is feature-gated; the capture command is generic over
//! `Platform` and this module picks the concrete one at run time.

use crate::commands::capture::{self, CaptureOptions};
use rads_core::DeviceConfig;

/// Platforms enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_platforms() -> Vec<&'static str> {
    let mut platforms = Vec::new();

    #[cfg(feature = "linux")]
    platforms.push("linux");

    #[cfg(feature = "dummy")]
    platforms.push("dummy");

    platforms
}

/// Comma-separated list of compiled-in platforms
pub fn platform_names_short() -> String {
    available_platforms().join(", ")
}

/// Run a capture on the selected platform
pub fn run_capture(
    dummy: bool,
    config: &DeviceConfig,
    opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    if dummy {
        run_dummy(config, opts)
    } else {
        run_linux(config, opts)
    }
}

#[cfg(feature = "dummy")]
fn run_dummy(
    config: &DeviceConfig,
    opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    log::info!("Using simulated converter");
    capture::run(rads_dummy::DummyAdc::default(), config, opts)
}

#[cfg(not(feature = "dummy"))]
fn run_dummy(
    _config: &DeviceConfig,
    _opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    Err(format!(
        "Simulated converter support not compiled in [available: {}]",
        platform_names_short()
    )
    .into())
}

#[cfg(feature = "linux")]
fn run_linux(
    config: &DeviceConfig,
    opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    capture::run(linux::LinuxPlatform::new(), config, opts)
}

#[cfg(not(feature = "linux"))]
fn run_linux(
    _config: &DeviceConfig,
    _opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    Err(format!(
        "Linux hardware support not compiled in [available: {}]",
        platform_names_short()
    )
    .into())
}

#[cfg(feature = "linux")]
pub mod linux {
    //! spidev + sysfs GPIO host platform

    use nix::time::{clock_gettime, ClockId};
    use rads_core::config::TransportConfig;
    use rads_core::platform::{Level, Platform};
    use rads_core::Result;
    use rads_linux_gpio::{GpioLine, SysfsGpio};
    use rads_linux_spi::{LinuxSpi, LinuxSpiConfig};
    use std::time::Duration;

    /// A Linux host with the converter on spidev and sysfs GPIO
    #[derive(Debug, Clone, Default)]
    pub struct LinuxPlatform {
        sysfs: SysfsGpio,
    }

    impl LinuxPlatform {
        /// Use the default sysfs GPIO root
        pub fn new() -> Self {
            Self::default()
        }

        /// Use an alternate sysfs GPIO root
        pub fn with_sysfs(sysfs: SysfsGpio) -> Self {
            Self { sysfs }
        }
    }

    impl Platform for LinuxPlatform {
        type Transport = LinuxSpi;
        type DataReady = GpioLine;
        type Sync = GpioLine;

        fn open_transport(&mut self, config: &TransportConfig<'_>) -> Result<LinuxSpi> {
            Ok(LinuxSpi::open(&LinuxSpiConfig::from(config))?)
        }

        fn acquire_data_ready(&mut self, line: u32) -> Result<GpioLine> {
            Ok(self.sysfs.acquire_input(line)?)
        }

        fn acquire_sync(&mut self, line: u32, initial: Level) -> Result<GpioLine> {
            Ok(self.sysfs.acquire_output(line, initial)?)
        }

        fn now_ns(&self) -> u64 {
            match clock_gettime(ClockId::CLOCK_MONOTONIC) {
                Ok(ts) => (ts.tv_sec() as u64) * 1_000_000_000 + ts.tv_nsec() as u64,
                Err(e) => {
                    log::debug!("CLOCK_MONOTONIC unavailable: {}", e);
                    0
                }
            }
        }

        fn delay_us(&mut self, us: u32) {
            std::thread::sleep(Duration::from_micros(u64::from(us)));
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "dummy")]
    fn test_dummy_dispatch() {
        assert!(available_platforms().contains(&"dummy"));

        let opts = CaptureOptions {
            frames: 2,
            ..Default::default()
        };
        let config = DeviceConfig::new(968).with_sync(969, 1);
        assert_eq!(run_capture(true, &config, &opts).unwrap(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_capture() {
        let opts = CaptureOptions {
            frames: 1,
            ..Default::default()
        };
        let config = DeviceConfig::new(968).with_spi_mode(7);
        assert!(run_capture(true, &config, &opts).is_err());
    }
}
