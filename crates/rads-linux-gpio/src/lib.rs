//! rads-linux-gpio - sysfs GPIO line management
//!
//! This crate reserves and drives the converter's data-ready and sync lines
//! through the legacy sysfs GPIO interface (`/sys/class/gpio`).
//!
//! # Overview
//!
//! Lines are addressed by their global GPIO number (as listed in
//! `/sys/kernel/debug/gpio`), not by chip offset. A line that is already
//! exported by another owner is used as-is and left exported on release.
//!
//! # Example
//!
//! ```no_run
//! use rads_linux_gpio::SysfsGpio;
//! use rads_core::platform::Level;
//! use std::time::Duration;
//!
//! let sysfs = SysfsGpio::new();
//! let mut drdy = sysfs.acquire_input(968)?;
//! let mut sync = sysfs.acquire_output(969, Level::High)?;
//!
//! sync.set_value(Level::Low)?;
//! sync.set_value(Level::High)?;
//! drdy.wait(Duration::from_millis(2000))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `CONFIG_GPIO_SYSFS`
//! - Write access to `/sys/class/gpio/export` and the line attributes

pub mod device;
pub mod error;

// Re-exports
pub use device::{Direction, GpioLine, SysfsGpio, DEFAULT_SYSFS_ROOT};
pub use error::{Result, SysfsGpioError};
