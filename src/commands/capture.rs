//! Capture command implementation

use indicatif::{ProgressBar, ProgressStyle};
use rads_core::platform::Platform;
use rads_core::record::RecordWriter;
use rads_core::{Ads1278, DeviceConfig, Frame, RawFrame};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// What to do with captured frames
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Frames to capture
    pub frames: u64,
    /// Binary record output
    pub out: Option<PathBuf>,
    /// Pretty-print every frame
    pub print: bool,
    /// Hex dump this many leading raw frames
    pub hex_frames: u64,
}

impl CaptureOptions {
    fn show_progress(&self) -> bool {
        !self.print && self.hex_frames == 0
    }
}

/// Run the capture command against `platform`
///
/// Returns the number of frames captured.
pub fn run<P: Platform>(
    platform: P,
    config: &DeviceConfig,
    opts: &CaptureOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut records = match &opts.out {
        Some(path) => Some(RecordWriter::new(BufWriter::new(File::create(path)?))),
        None => None,
    };

    let stdout = std::io::stdout();
    let mut console = stdout.lock();
    let captured = capture(platform, config, opts, &mut console, records.as_mut())?;

    if let (Some(mut writer), Some(path)) = (records, &opts.out) {
        writer.flush()?;
        log::info!(
            "Wrote {} record(s) to {}",
            writer.records_written(),
            path.display()
        );
    }

    Ok(captured)
}

/// Open, start, and read `opts.frames` frames into the given sinks
///
/// The driver is stopped and closed on every exit path.
pub fn capture<P: Platform, W: Write, R: Write>(
    platform: P,
    config: &DeviceConfig,
    opts: &CaptureOptions,
    console: &mut W,
    mut records: Option<&mut RecordWriter<R>>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut adc = Ads1278::open_with(platform, config)?;
    adc.start()?;

    let pb = if opts.show_progress() {
        let pb = ProgressBar::new(opts.frames);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({per_sec}, {eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut captured = 0u64;
    for idx in 0..opts.frames {
        let frame = adc.read_frame()?;
        captured += 1;

        if opts.print {
            writeln!(console, "{}", format_frame(&frame))?;
        }
        if idx < opts.hex_frames {
            writeln!(console, "{}", format_raw(&adc.last_raw_frame(), frame.seq))?;
        }
        if let Some(writer) = records.as_mut() {
            writer.write_frame(&frame)?;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Capture complete");

    if adc.overrun_warnings() > 0 {
        log::warn!(
            "{} slow transfer(s) during capture; frames may have been overwritten",
            adc.overrun_warnings()
        );
    }

    adc.stop();
    adc.close();
    Ok(captured)
}

/// `seq=N tstamp_ns=T ch=[c0, c1, ...]`
pub fn format_frame(frame: &Frame) -> String {
    let channels: Vec<String> = frame.channels.iter().map(|c| c.to_string()).collect();
    format!(
        "seq={} tstamp_ns={} ch=[{}]",
        frame.seq,
        frame.timestamp_ns,
        channels.join(", ")
    )
}

/// `raw seq=N: XX XX ...`
pub fn format_raw(raw: &RawFrame, seq: u64) -> String {
    let mut line = format!("raw seq={}:", seq);
    for byte in raw.as_bytes() {
        line.push_str(&format!(" {:02X}", byte));
    }
    line
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use rads_core::record;
    use rads_dummy::DummyAdc;

    fn opts(frames: u64) -> CaptureOptions {
        CaptureOptions {
            frames,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_frame() {
        let frame = Frame {
            seq: 7,
            timestamp_ns: 123,
            channels: [1, -1, 0, 8_388_607, -8_388_608, 2, 3, 4],
        };
        assert_eq!(
            format_frame(&frame),
            "seq=7 tstamp_ns=123 ch=[1, -1, 0, 8388607, -8388608, 2, 3, 4]"
        );
    }

    #[test]
    fn test_format_raw() {
        let mut bytes = [0u8; 24];
        bytes[0] = 0xAB;
        bytes[23] = 0x0F;
        let line = format_raw(&RawFrame(bytes), 3);
        assert!(line.starts_with("raw seq=3: AB 00"));
        assert!(line.ends_with(" 00 0F"));
        assert_eq!(line.split(' ').count(), 2 + 24);
    }

    #[test]
    fn test_capture_prints_and_dumps() {
        let mut console = Vec::new();
        let options = CaptureOptions {
            frames: 3,
            print: true,
            hex_frames: 2,
            ..Default::default()
        };

        let captured = capture(
            DummyAdc::default(),
            &DeviceConfig::new(968),
            &options,
            &mut console,
            None::<&mut RecordWriter<Vec<u8>>>,
        )
        .unwrap();
        assert_eq!(captured, 3);

        let text = String::from_utf8(console).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("seq=0 "));
        assert!(lines[1].starts_with("raw seq=0:"));
        assert!(lines[2].starts_with("seq=1 "));
        assert!(lines[3].starts_with("raw seq=1:"));
        assert!(lines[4].starts_with("seq=2 "));
    }

    #[test]
    fn test_capture_writes_records() {
        let adc = DummyAdc::default();
        let mut writer = RecordWriter::new(Vec::new());
        let config = DeviceConfig::new(968).with_sync(969, 2);

        capture(adc.clone(), &config, &opts(5), &mut Vec::new(), Some(&mut writer)).unwrap();
        assert_eq!(writer.records_written(), 5);

        let frames = record::read_all(writer.into_inner().as_slice()).unwrap();
        assert_eq!(
            frames.iter().map(|f| f.seq).collect::<Vec<_>>(),
            [2, 3, 4, 5, 6]
        );
        assert_eq!(adc.sync_pulses(), 1);
        assert_eq!(adc.frames_served(), 7);
        assert!(adc.held_lines().is_empty());
    }

    #[test]
    fn test_capture_failure_releases_resources() {
        let adc = DummyAdc::default();
        adc.stall(true);
        let config = DeviceConfig::new(968)
            .with_sync(969, 0)
            .with_drdy_timeout_ms(1);

        let err = capture(
            adc.clone(),
            &config,
            &opts(1),
            &mut Vec::new(),
            None::<&mut RecordWriter<Vec<u8>>>,
        )
        .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("timed out"));
        assert!(adc.held_lines().is_empty());
        assert_eq!(adc.open_transports(), 0);
    }

    #[test]
    fn test_run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        let options = CaptureOptions {
            frames: 4,
            out: Some(path.clone()),
            ..Default::default()
        };

        assert_eq!(
            run(DummyAdc::default(), &DeviceConfig::new(968), &options).unwrap(),
            4
        );

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4 * record::RECORD_SIZE);
        let frames = record::read_all(bytes.as_slice()).unwrap();
        assert_eq!(frames[3].seq, 3);
    }
}
