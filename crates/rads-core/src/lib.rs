//! rads-core - Acquisition driver for ADS1278-class converters
//!
//! This crate contains the platform-independent part of the driver: frame
//! decoding, configuration, the error taxonomy, the traits a host platform
//! implements, and the `Ads1278` lifecycle state machine.
//!
//! # Example
//!
//! ```ignore
//! use rads_core::{Ads1278, DeviceConfig};
//!
//! let config = DeviceConfig::new(968).with_sync(969, 4);
//! let mut adc = Ads1278::open_with(platform, &config)?;
//! adc.start()?;
//! let frame = adc.read_frame()?;
//! println!("seq={} ch0={}", frame.seq, frame.channels[0]);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod platform;
pub mod record;

pub use config::{DeviceConfig, EffectiveConfig, TransportConfig};
pub use driver::{Ads1278, DriverState};
pub use error::{Error, Result};
pub use frame::{Frame, RawFrame, CHANNEL_COUNT, FRAME_BYTES};
