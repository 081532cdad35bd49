//! Platform trait definitions
//!
//! The driver reaches the hardware only through these traits. A platform is
//! a factory: each `open`/`acquire` call hands back an owned resource whose
//! `Drop` releases whatever the call reserved, so a failure partway through
//! `open` unwinds the earlier acquisitions automatically.

use crate::config::TransportConfig;
use crate::error::Result;
use crate::frame::FRAME_BYTES;

use std::time::Duration;

/// Logic level of a digital output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Driven to 0
    Low,
    /// Driven to 1
    High,
}

impl Level {
    /// The sysfs text value for this level
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "0",
            Self::High => "1",
        }
    }

    /// The sysfs value as a single byte
    pub fn as_char(self) -> u8 {
        self.as_str().as_bytes()[0]
    }
}

/// An input line configured for falling-edge notification
pub trait DataReadyLine {
    /// Block until the next edge or until `timeout` elapses
    ///
    /// Implementations must clear any pending notification before waiting
    /// and again after a successful wait, so a stale edge never satisfies
    /// the next call. Timeout must be reported as `Error::TimedOut`.
    fn wait_edge(&mut self, timeout: Duration) -> Result<()>;
}

/// An output line driving the converter's sync input
pub trait SyncLine {
    /// Drive the line to `level`
    fn set_level(&mut self, level: Level) -> Result<()>;
}

/// A configured serial bus endpoint
pub trait FrameTransport {
    /// Exchange one TDM frame
    ///
    /// Either all `FRAME_BYTES` bytes move or the call fails.
    fn exchange(&mut self, tx: &[u8; FRAME_BYTES], rx: &mut [u8; FRAME_BYTES]) -> Result<()>;
}

/// Everything the acquisition driver needs from the host
pub trait Platform {
    /// Serial bus handle
    type Transport: FrameTransport;
    /// Data-ready input line handle
    type DataReady: DataReadyLine;
    /// Sync output line handle
    type Sync: SyncLine;

    /// Open and configure the serial bus
    fn open_transport(&mut self, config: &TransportConfig<'_>) -> Result<Self::Transport>;

    /// Reserve `line` as an input with falling-edge detection
    fn acquire_data_ready(&mut self, line: u32) -> Result<Self::DataReady>;

    /// Reserve `line` as an output driven to `initial`
    fn acquire_sync(&mut self, line: u32, initial: Level) -> Result<Self::Sync>;

    /// Monotonic clock in nanoseconds; 0 means the clock could not be read
    fn now_ns(&self) -> u64;

    /// Busy or sleeping delay
    fn delay_us(&mut self, us: u32);
}
