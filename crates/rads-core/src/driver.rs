//! ADS1278 acquisition driver
//!
//! `Ads1278` owns one converter instance and sequences its lifecycle:
//!
//! ```text
//! Closed --open--> Opened --start--> Started
//!    ^                |  <---stop---     |
//!    +------close-----+--------close-----+
//! ```
//!
//! Each `read_frame` waits for the data-ready edge, stamps the time of the
//! edge, shifts one 24-byte TDM frame out of the converter and decodes it.
//! Resources acquired by `open` live in a single `Session` value, so closing
//! (or failing halfway through `open`) is just dropping it.

use crate::config::{DeviceConfig, EffectiveConfig};
use crate::error::{Error, Result};
use crate::frame::{decode_channels, Frame, RawFrame, FRAME_BYTES};
use crate::platform::{DataReadyLine, FrameTransport, Level, Platform, SyncLine};

/// Width of the sync pulse in microseconds
pub const SYNC_PULSE_US: u32 = 10;

/// Edge-to-transfer-complete time above which an overrun is likely
pub const OVERRUN_WARN_US: u64 = 5000;

/// The converter is receive-only; the bus is clocked with zeros
const TX_ZEROS: [u8; FRAME_BYTES] = [0u8; FRAME_BYTES];

/// Lifecycle state of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No resources held
    Closed,
    /// Bus and lines acquired, not acquiring
    Opened,
    /// Frames may be read
    Started,
}

/// Resources held between `open` and `close`
///
/// Field order is drop order: bus first, then data-ready, then sync.
struct Session<P: Platform> {
    transport: P::Transport,
    drdy: P::DataReady,
    sync: Option<P::Sync>,
    config: EffectiveConfig,
}

/// Acquisition driver for one ADS1278 connected over a TDM serial link
pub struct Ads1278<P: Platform> {
    platform: P,
    session: Option<Session<P>>,
    started: bool,
    seq: u64,
    last_raw: RawFrame,
    overruns: u64,
}

impl<P: Platform> Ads1278<P> {
    /// Create a closed driver on top of `platform`
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            session: None,
            started: false,
            seq: 0,
            last_raw: RawFrame::default(),
            overruns: 0,
        }
    }

    /// Create a driver and open it in one step
    pub fn open_with(platform: P, config: &DeviceConfig) -> Result<Self> {
        let mut driver = Self::new(platform);
        driver.open(config)?;
        Ok(driver)
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        match (&self.session, self.started) {
            (None, _) => DriverState::Closed,
            (Some(_), false) => DriverState::Opened,
            (Some(_), true) => DriverState::Started,
        }
    }

    /// The configuration in effect, if open
    pub fn config(&self) -> Option<&EffectiveConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// The underlying platform
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Number of slow-transfer warnings since the last open
    pub fn overrun_warnings(&self) -> u64 {
        self.overruns
    }

    /// Open the bus and acquire the lines
    ///
    /// On failure every resource acquired so far has been released and the
    /// driver is still closed.
    pub fn open(&mut self, config: &DeviceConfig) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let config = config.effective()?;
        log::debug!(
            "ads1278: Opening {} (drdy={}, sync={:?})",
            config.spidev_path,
            config.drdy_line,
            config.sync_line
        );

        let transport = self.platform.open_transport(&config.transport())?;
        let drdy = self.platform.acquire_data_ready(config.drdy_line)?;
        let sync = match config.sync_line {
            Some(line) => Some(self.platform.acquire_sync(line, Level::High)?),
            None => None,
        };

        log::info!(
            "ads1278: Opened {} at {} kHz, drdy timeout {} ms",
            config.spidev_path,
            config.sclk_hz / 1000,
            config.drdy_timeout_ms
        );

        self.session = Some(Session {
            transport,
            drdy,
            sync,
            config,
        });
        self.started = false;
        self.seq = 0;
        self.last_raw = RawFrame::default();
        self.overruns = 0;
        Ok(())
    }

    /// Start acquisition
    ///
    /// With sync enabled this pulses the sync line low for
    /// [`SYNC_PULSE_US`] and then discards `settle_frames` frames. Each
    /// discarded frame still takes a sequence number, so after N settle
    /// frames the first frame returned carries `seq == N`. Calling `start`
    /// while already started does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Err(Error::NotOpen);
        }
        if self.started {
            return Ok(());
        }

        self.started = true;
        if let Err(e) = self.sync_and_settle() {
            self.started = false;
            return Err(e);
        }
        Ok(())
    }

    fn sync_and_settle(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotOpen)?;
        let settle_frames = session.config.settle_frames;
        let Some(sync) = session.sync.as_mut() else {
            return Ok(());
        };

        sync.set_level(Level::Low)?;
        self.platform.delay_us(SYNC_PULSE_US);
        sync.set_level(Level::High)?;

        log::debug!(
            "ads1278: Sync pulse sent, discarding {} settle frame(s)",
            settle_frames
        );
        // Settle frames consume sequence numbers but never reach the shadow
        for _ in 0..settle_frames {
            self.acquire()?;
            self.seq += 1;
        }
        Ok(())
    }

    /// Read the next frame
    ///
    /// Blocks until data-ready fires or the configured timeout elapses. A
    /// failed read leaves the sequence counter and the raw shadow untouched.
    pub fn read_frame(&mut self) -> Result<Frame> {
        if !self.started {
            return Err(Error::NotPermitted);
        }

        let (timestamp_ns, raw) = self.acquire()?;
        let channels = decode_channels(&raw);
        self.last_raw = RawFrame(raw);

        let seq = self.seq;
        self.seq += 1;

        Ok(Frame {
            seq,
            timestamp_ns,
            channels,
        })
    }

    /// Wait for data-ready and shift out one raw frame
    fn acquire(&mut self) -> Result<(u64, [u8; FRAME_BYTES])> {
        let session = self.session.as_mut().ok_or(Error::NotPermitted)?;

        session.drdy.wait_edge(session.config.drdy_timeout())?;
        let drdy_ns = self.platform.now_ns();

        let mut raw = [0u8; FRAME_BYTES];
        session.transport.exchange(&TX_ZEROS, &mut raw)?;
        let done_ns = self.platform.now_ns();

        if drdy_ns != 0 && done_ns > drdy_ns {
            let elapsed_us = (done_ns - drdy_ns) / 1000;
            if elapsed_us > OVERRUN_WARN_US {
                self.overruns += 1;
                log::warn!(
                    "ads1278: Slow transfer ({} us), overrun risk",
                    elapsed_us
                );
            }
        }

        Ok((drdy_ns, raw))
    }

    /// Copy of the most recently captured raw frame
    ///
    /// All zeros if no frame has been read since the last open or close.
    pub fn last_raw_frame(&self) -> RawFrame {
        self.last_raw
    }

    /// Stop acquisition, keeping the bus and lines
    pub fn stop(&mut self) {
        self.started = false;
    }

    /// Release everything and return to `Closed`
    ///
    /// Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("ads1278: Closing {}", session.config.spidev_path);
            drop(session);
        }
        self.last_raw = RawFrame::default();
        self.seq = 0;
        self.started = false;
    }
}

impl<P: Platform> Drop for Ads1278<P> {
    fn drop(&mut self) {
        self.close();
    }
}
