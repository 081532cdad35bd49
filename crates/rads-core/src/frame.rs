//! Frame types and 24-bit sample decoding
//!
//! One TDM frame carries all eight channels of a single conversion cycle,
//! each as a 24-bit two's-complement word shifted out MSB first.

/// Number of converter channels carried in one TDM frame
pub const CHANNEL_COUNT: usize = 8;

/// Bytes per channel sample on the wire
pub const BYTES_PER_SAMPLE: usize = 3;

/// Bytes in one TDM frame (8 channels x 3 bytes)
pub const FRAME_BYTES: usize = CHANNEL_COUNT * BYTES_PER_SAMPLE;

/// Sign bit of a 24-bit sample
const SIGN_BIT_24: u32 = 0x0080_0000;

/// Bits OR-ed in when sign-extending a negative 24-bit sample
const SIGN_EXTEND_MASK: u32 = 0xFF00_0000;

/// One decoded conversion result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    /// Sequence number, 0 for the first frame after open
    pub seq: u64,
    /// Monotonic timestamp (ns) taken when data-ready was observed
    pub timestamp_ns: u64,
    /// Sign-extended channel values, channel 0 first
    pub channels: [i32; CHANNEL_COUNT],
}

/// The raw bytes of the most recent exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame(pub [u8; FRAME_BYTES]);

impl Default for RawFrame {
    fn default() -> Self {
        Self([0u8; FRAME_BYTES])
    }
}

impl RawFrame {
    /// Raw bytes, in wire order
    pub fn as_bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    /// The three wire bytes of one channel, or `None` past the last channel
    pub fn channel_bytes(&self, channel: usize) -> Option<[u8; BYTES_PER_SAMPLE]> {
        if channel >= CHANNEL_COUNT {
            return None;
        }
        let offset = channel * BYTES_PER_SAMPLE;
        Some([self.0[offset], self.0[offset + 1], self.0[offset + 2]])
    }

    /// Decode every channel of this frame
    pub fn decode(&self) -> [i32; CHANNEL_COUNT] {
        decode_channels(&self.0)
    }
}

/// Decode one 24-bit MSB-first two's-complement sample
pub fn decode_sample(bytes: [u8; BYTES_PER_SAMPLE]) -> i32 {
    let mut raw24 = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);

    if raw24 & SIGN_BIT_24 != 0 {
        raw24 |= SIGN_EXTEND_MASK;
    }

    raw24 as i32
}

/// Decode all channels of a raw TDM frame
pub fn decode_channels(raw: &[u8; FRAME_BYTES]) -> [i32; CHANNEL_COUNT] {
    let mut channels = [0i32; CHANNEL_COUNT];
    for (channel, chunk) in channels.iter_mut().zip(raw.chunks_exact(BYTES_PER_SAMPLE)) {
        *channel = decode_sample([chunk[0], chunk[1], chunk[2]]);
    }
    channels
}

/// Encode a sample back to its 24-bit wire form
///
/// Values outside the 24-bit range are truncated to their low 24 bits.
pub fn encode_sample(value: i32) -> [u8; BYTES_PER_SAMPLE] {
    let bits = value as u32;
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_boundaries() {
        assert_eq!(decode_sample([0x00, 0x00, 0x01]), 1);
        assert_eq!(decode_sample([0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(decode_sample([0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(decode_sample([0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(decode_sample([0x00, 0x00, 0x00]), 0);
    }

    #[test]
    fn test_decode_is_msb_first() {
        assert_eq!(decode_sample([0x01, 0x02, 0x03]), 0x0001_0203);
        assert_eq!(decode_sample([0xFE, 0xDC, 0xBA]), 0xFFFE_DCBAu32 as i32);
    }

    #[test]
    fn test_decode_channels_order() {
        let mut raw = [0u8; FRAME_BYTES];
        for channel in 0..CHANNEL_COUNT {
            let bytes = encode_sample(channel as i32 - 4);
            raw[channel * 3..channel * 3 + 3].copy_from_slice(&bytes);
        }

        assert_eq!(decode_channels(&raw), [-4, -3, -2, -1, 0, 1, 2, 3]);
    }

    #[test]
    fn test_every_sign_boundary_byte() {
        // Every top byte with bit 7 set must decode negative
        for top in 0u8..=0xFF {
            let value = decode_sample([top, 0x12, 0x34]);
            assert_eq!(value < 0, top & 0x80 != 0, "top byte 0x{:02X}", top);
            assert!((-8_388_608..=8_388_607).contains(&value));
        }
    }

    #[test]
    fn test_raw_frame_channel_bytes() {
        let mut raw = RawFrame::default();
        raw.0[21..24].copy_from_slice(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(raw.channel_bytes(7), Some([0xAA, 0xBB, 0xCC]));
        assert_eq!(raw.channel_bytes(0), Some([0, 0, 0]));
        assert_eq!(raw.channel_bytes(CHANNEL_COUNT), None);
    }
}
