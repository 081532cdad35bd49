//! Binary capture record format
//!
//! Each captured frame is persisted as a fixed-size little-endian record:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 8    | `seq` (u64) |
//! | 8      | 8    | `timestamp_ns` (u64) |
//! | 16     | 32   | channels 0-7 (i32 each) |

use crate::frame::{Frame, CHANNEL_COUNT};

use std::io::{self, Read, Write};

/// Size of one encoded record in bytes
pub const RECORD_SIZE: usize = 8 + 8 + CHANNEL_COUNT * 4;

const CHANNELS_OFFSET: usize = 16;

/// Encode a frame into its on-disk form
pub fn encode(frame: &Frame) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&frame.seq.to_le_bytes());
    buf[8..16].copy_from_slice(&frame.timestamp_ns.to_le_bytes());
    for (i, value) in frame.channels.iter().enumerate() {
        let offset = CHANNELS_OFFSET + i * 4;
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Decode one on-disk record
pub fn decode(buf: &[u8; RECORD_SIZE]) -> Frame {
    let mut seq = [0u8; 8];
    let mut timestamp = [0u8; 8];
    seq.copy_from_slice(&buf[0..8]);
    timestamp.copy_from_slice(&buf[8..16]);

    let mut channels = [0i32; CHANNEL_COUNT];
    for (i, channel) in channels.iter_mut().enumerate() {
        let offset = CHANNELS_OFFSET + i * 4;
        *channel = i32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ]);
    }

    Frame {
        seq: u64::from_le_bytes(seq),
        timestamp_ns: u64::from_le_bytes(timestamp),
        channels,
    }
}

/// Writes frames as consecutive records
pub struct RecordWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Append one frame
    pub fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.inner.write_all(&encode(frame))?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Streaming reader for a capture file
pub struct RecordReader<R: Read> {
    inner: R,
    records_read: u64,
}

impl<R: Read> RecordReader<R> {
    /// Read records from `inner`
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            records_read: 0,
        }
    }

    /// Next record, or `None` at a clean end of input
    ///
    /// Input that ends partway through a record is `UnexpectedEof`.
    pub fn read_frame(&mut self) -> io::Result<Option<Frame>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        match filled {
            0 => Ok(None),
            RECORD_SIZE => {
                self.records_read += 1;
                Ok(Some(decode(&buf)))
            }
            n => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Truncated record at byte {}: got {} bytes",
                    self.records_read * RECORD_SIZE as u64,
                    n
                ),
            )),
        }
    }

    /// Complete records returned so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = io::Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Read every complete record from `reader`
///
/// A trailing partial record is reported as `UnexpectedEof`.
pub fn read_all<R: Read>(reader: R) -> io::Result<Vec<Frame>> {
    RecordReader::new(reader).collect()
}

/// Delimited text layouts for exported captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Tab separated
    Tsv,
    /// Comma separated
    Csv,
}

impl TextFormat {
    /// Field separator
    pub fn delimiter(self) -> &'static str {
        match self {
            Self::Tsv => "\t",
            Self::Csv => ",",
        }
    }

    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tsv => "tsv",
            Self::Csv => "csv",
        }
    }
}

/// Convert a signed 24-bit code to volts for a bipolar +/-`vref` full scale
pub fn code_to_volts(code: i32, vref: f64) -> f64 {
    f64::from(code) / f64::from(1u32 << 23) * vref
}

/// Export a binary capture as delimited text with a header row
///
/// Channels are named `ch1`..`ch8`, or `ch1_V`..`ch8_V` when `vref` is
/// given and samples are converted to volts. Returns the record count.
pub fn export_text<R: Read, W: Write>(
    reader: R,
    mut out: W,
    format: TextFormat,
    vref: Option<f64>,
) -> io::Result<u64> {
    let delim = format.delimiter();
    let suffix = if vref.is_some() { "_V" } else { "" };

    let mut header = vec!["seq".to_string(), "tstamp_ns".to_string()];
    header.extend((1..=CHANNEL_COUNT).map(|i| format!("ch{}{}", i, suffix)));
    writeln!(out, "{}", header.join(delim))?;

    let mut records = RecordReader::new(reader);
    while let Some(frame) = records.read_frame()? {
        let mut row = vec![frame.seq.to_string(), frame.timestamp_ns.to_string()];
        row.extend(frame.channels.iter().map(|&code| match vref {
            Some(vref) => code_to_volts(code, vref).to_string(),
            None => code.to_string(),
        }));
        writeln!(out, "{}", row.join(delim))?;
    }
    out.flush()?;

    Ok(records.records_read())
}
