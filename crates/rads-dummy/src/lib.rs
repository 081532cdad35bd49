//! rads-dummy - Simulated converter platform
//!
//! This crate provides a `Platform` whose data-ready line fires immediately
//! and whose bus returns synthesized (or scripted) TDM frames. Time is
//! virtual: the clock only moves when the driver waits for a conversion or
//! clocks a frame out, so captures are fully deterministic.

use rads_core::config::TransportConfig;
use rads_core::error::{Error, Result};
use rads_core::frame::{encode_sample, BYTES_PER_SAMPLE, CHANNEL_COUNT, FRAME_BYTES};
use rads_core::platform::{DataReadyLine, FrameTransport, Level, Platform, SyncLine};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Configuration for the simulated converter
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Time between conversions in nanoseconds
    pub conversion_period_ns: u64,
    /// Per-conversion increment of channel 0's ramp; channel N uses N+1 times this
    pub ramp_step: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            conversion_period_ns: 20_000,
            ramp_step: 1024,
        }
    }
}

#[derive(Debug)]
struct State {
    config: DummyConfig,
    clock_ns: u64,
    conversion: u64,
    sclk_hz: u32,
    scripted: VecDeque<[u8; FRAME_BYTES]>,
    sync_level: Level,
    sync_pulses: u64,
    frames_served: u64,
    stalled: bool,
    open_transports: usize,
    held_lines: Vec<u32>,
    failing_lines: Vec<u32>,
}

impl State {
    fn synthesize(&self) -> [u8; FRAME_BYTES] {
        let mut raw = [0u8; FRAME_BYTES];
        for channel in 0..CHANNEL_COUNT {
            let step = self.config.ramp_step.wrapping_mul(channel as u32 + 1);
            let value = (self.conversion as u32).wrapping_mul(step);
            let offset = channel * BYTES_PER_SAMPLE;
            raw[offset..offset + BYTES_PER_SAMPLE].copy_from_slice(&encode_sample(value as i32));
        }
        raw
    }

    /// Time to shift one frame out at the configured clock
    fn transfer_ns(&self) -> u64 {
        let bits = (FRAME_BYTES * 8) as u64;
        bits * 1_000_000_000 / u64::from(self.sclk_hz.max(1))
    }
}

type Shared = Rc<RefCell<State>>;

/// Simulated host platform with an ADS1278 attached
#[derive(Debug, Clone)]
pub struct DummyAdc {
    state: Shared,
}

impl Default for DummyAdc {
    fn default() -> Self {
        Self::new(DummyConfig::default())
    }
}

impl DummyAdc {
    /// Create a simulated converter
    pub fn new(config: DummyConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                config,
                clock_ns: 1,
                conversion: 0,
                sclk_hz: rads_core::config::DEFAULT_SCLK_HZ,
                scripted: VecDeque::new(),
                sync_level: Level::High,
                sync_pulses: 0,
                frames_served: 0,
                stalled: false,
                open_transports: 0,
                held_lines: Vec::new(),
                failing_lines: Vec::new(),
            })),
        }
    }

    /// Queue raw bytes to be returned by the next exchange instead of the ramp
    pub fn push_frame(&self, raw: [u8; FRAME_BYTES]) {
        self.state.borrow_mut().scripted.push_back(raw);
    }

    /// Make data-ready stop firing (every wait times out)
    pub fn stall(&self, stalled: bool) {
        self.state.borrow_mut().stalled = stalled;
    }

    /// Make every acquisition of `line` fail with an I/O error
    pub fn fail_line(&self, line: u32) {
        self.state.borrow_mut().failing_lines.push(line);
    }

    /// Frames clocked out so far
    pub fn frames_served(&self) -> u64 {
        self.state.borrow().frames_served
    }

    /// Complete low-high pulses seen on the sync line
    pub fn sync_pulses(&self) -> u64 {
        self.state.borrow().sync_pulses
    }

    /// Lines currently reserved
    pub fn held_lines(&self) -> Vec<u32> {
        self.state.borrow().held_lines.clone()
    }

    /// Bus handles currently open
    pub fn open_transports(&self) -> usize {
        self.state.borrow().open_transports
    }

    /// The frame the ramp generator would produce for conversion `n`
    pub fn ramp_frame(&self, n: u64) -> [u8; FRAME_BYTES] {
        let mut state = self.state.borrow_mut();
        let saved = state.conversion;
        state.conversion = n;
        let raw = state.synthesize();
        state.conversion = saved;
        raw
    }

    /// Reserve `line`
    ///
    /// A line that is already held is shared, not refused, and the sharer
    /// leaves it held when dropped.
    fn reserve(&self, line: u32) -> Result<DummyLine> {
        let mut state = self.state.borrow_mut();
        if state.failing_lines.contains(&line) {
            return Err(Error::io(
                format!("Failed to reserve line {}", line),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }

        let owned = !state.held_lines.contains(&line);
        if owned {
            state.held_lines.push(line);
        } else {
            log::debug!("dummy: Line {} already held, sharing it", line);
        }
        Ok(DummyLine {
            state: self.state.clone(),
            line,
            owned,
        })
    }
}

/// Simulated bus handle
#[derive(Debug)]
pub struct DummyTransport {
    state: Shared,
}

impl Drop for DummyTransport {
    fn drop(&mut self) {
        self.state.borrow_mut().open_transports -= 1;
    }
}

impl FrameTransport for DummyTransport {
    fn exchange(&mut self, _tx: &[u8; FRAME_BYTES], rx: &mut [u8; FRAME_BYTES]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        *rx = match state.scripted.pop_front() {
            Some(raw) => raw,
            None => state.synthesize(),
        };
        state.clock_ns += state.transfer_ns();
        state.frames_served += 1;
        Ok(())
    }
}

/// Simulated data-ready or sync line
#[derive(Debug)]
pub struct DummyLine {
    state: Shared,
    line: u32,
    owned: bool,
}

impl Drop for DummyLine {
    fn drop(&mut self) {
        if self.owned {
            self.state.borrow_mut().held_lines.retain(|&l| l != self.line);
        }
    }
}

impl DataReadyLine for DummyLine {
    fn wait_edge(&mut self, timeout: Duration) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.stalled {
            state.clock_ns += timeout.as_nanos() as u64;
            return Err(Error::TimedOut);
        }

        let period = state.config.conversion_period_ns.max(1);
        state.clock_ns = (state.clock_ns / period + 1) * period;
        state.conversion += 1;
        Ok(())
    }
}

impl SyncLine for DummyLine {
    fn set_level(&mut self, level: Level) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.sync_level == Level::Low && level == Level::High {
            // Rising edge of the pulse restarts the conversion phase
            state.sync_pulses += 1;
            state.conversion = 0;
            log::debug!("dummy: Sync pulse, conversion phase reset");
        }
        state.sync_level = level;
        Ok(())
    }
}

impl Platform for DummyAdc {
    type Transport = DummyTransport;
    type DataReady = DummyLine;
    type Sync = DummyLine;

    fn open_transport(&mut self, config: &TransportConfig<'_>) -> Result<DummyTransport> {
        let mut state = self.state.borrow_mut();
        state.sclk_hz = config.sclk_hz;
        state.open_transports += 1;
        log::debug!(
            "dummy: Opened simulated bus {} at {} Hz",
            config.path,
            config.sclk_hz
        );
        Ok(DummyTransport {
            state: self.state.clone(),
        })
    }

    fn acquire_data_ready(&mut self, line: u32) -> Result<DummyLine> {
        self.reserve(line)
    }

    fn acquire_sync(&mut self, line: u32, initial: Level) -> Result<DummyLine> {
        let sync = self.reserve(line)?;
        self.state.borrow_mut().sync_level = initial;
        Ok(sync)
    }

    fn now_ns(&self) -> u64 {
        self.state.borrow().clock_ns
    }

    fn delay_us(&mut self, us: u32) {
        self.state.borrow_mut().clock_ns += u64::from(us) * 1000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rads_core::frame::decode_channels;
    use rads_core::{Ads1278, DeviceConfig, DriverState, RawFrame};

    #[test]
    fn test_capture_without_sync() {
        let adc = DummyAdc::default();
        let mut drv = Ads1278::open_with(adc.clone(), &DeviceConfig::new(968)).unwrap();
        drv.start().unwrap();

        let frames: Vec<_> = (0..3).map(|_| drv.read_frame().unwrap()).collect();

        assert_eq!(frames.iter().map(|f| f.seq).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(frames
            .windows(2)
            .all(|w| w[0].timestamp_ns <= w[1].timestamp_ns));
        for (n, frame) in frames.iter().enumerate() {
            // Conversion index is 1-based: the first edge completes conversion 1
            assert_eq!(frame.channels, decode_channels(&adc.ramp_frame(n as u64 + 1)));
        }
        assert_eq!(drv.last_raw_frame(), RawFrame(adc.ramp_frame(3)));
    }

    #[test]
    fn test_scripted_frames_decode() {
        let adc = DummyAdc::default();
        let mut raw = [0u8; FRAME_BYTES];
        raw[0..3].copy_from_slice(&[0x00, 0x00, 0x01]);
        raw[3..6].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        raw[6..9].copy_from_slice(&[0x80, 0x00, 0x00]);
        raw[9..12].copy_from_slice(&[0x7F, 0xFF, 0xFF]);
        adc.push_frame(raw);

        let mut drv = Ads1278::open_with(adc.clone(), &DeviceConfig::new(968)).unwrap();
        drv.start().unwrap();
        let frame = drv.read_frame().unwrap();

        assert_eq!(
            frame.channels,
            [1, -1, -8_388_608, 8_388_607, 0, 0, 0, 0]
        );
        assert_eq!(drv.last_raw_frame().as_bytes(), &raw);
    }

    #[test]
    fn test_sync_and_settle() {
        let adc = DummyAdc::default();
        let config = DeviceConfig::new(968).with_sync(969, 4);
        let mut drv = Ads1278::open_with(adc.clone(), &config).unwrap();
        drv.start().unwrap();

        assert_eq!(adc.sync_pulses(), 1);
        assert_eq!(adc.frames_served(), 4);
        assert_eq!(drv.last_raw_frame(), RawFrame::default());

        let frame = drv.read_frame().unwrap();
        // Settle frames consumed seq 0-3
        assert_eq!(frame.seq, 4);
        // Sync reset the phase; four settle conversions came first
        assert_eq!(frame.channels, decode_channels(&adc.ramp_frame(5)));
    }

    #[test]
    fn test_close_releases_everything() {
        let adc = DummyAdc::default();
        let config = DeviceConfig::new(968).with_sync(969, 0);
        let mut drv = Ads1278::open_with(adc.clone(), &config).unwrap();
        assert_eq!(adc.held_lines(), [968, 969]);
        assert_eq!(adc.open_transports(), 1);

        drv.close();
        assert!(adc.held_lines().is_empty());
        assert_eq!(adc.open_transports(), 0);
        assert_eq!(drv.state(), DriverState::Closed);
    }

    #[test]
    fn test_held_line_is_shared() {
        // drdy and sync on the same line: the second reservation shares it
        let adc = DummyAdc::default();
        let config = DeviceConfig::new(7).with_sync(7, 0);

        let mut drv = Ads1278::open_with(adc.clone(), &config).unwrap();
        assert_eq!(drv.state(), DriverState::Opened);
        assert_eq!(adc.held_lines(), [7]);

        drv.close();
        assert!(adc.held_lines().is_empty());
    }

    #[test]
    fn test_failed_sync_acquire_rolls_back_open() {
        let adc = DummyAdc::default();
        adc.fail_line(969);
        let config = DeviceConfig::new(968).with_sync(969, 0);

        assert!(matches!(
            Ads1278::open_with(adc.clone(), &config),
            Err(Error::Io { .. })
        ));
        assert!(adc.held_lines().is_empty());
        assert_eq!(adc.open_transports(), 0);
    }

    #[test]
    fn test_stalled_drdy_times_out() {
        let adc = DummyAdc::default();
        let mut drv = Ads1278::open_with(
            adc.clone(),
            &DeviceConfig::new(968).with_drdy_timeout_ms(5),
        )
        .unwrap();
        drv.start().unwrap();
        adc.stall(true);

        assert!(drv.read_frame().unwrap_err().is_timeout());
        assert_eq!(adc.frames_served(), 0);

        adc.stall(false);
        assert_eq!(drv.read_frame().unwrap().seq, 0);
    }

    #[test]
    fn test_slow_clock_triggers_overrun_warning() {
        // 24 bytes at 30 kHz take 6.4 ms
        let adc = DummyAdc::default();
        let config = DeviceConfig::new(968).with_sclk_hz(30_000);
        let mut drv = Ads1278::open_with(adc, &config).unwrap();
        drv.start().unwrap();

        drv.read_frame().unwrap();
        assert_eq!(drv.overrun_warnings(), 1);
    }
}
