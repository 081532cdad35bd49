//! Error types for Linux SPI operations

use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to 0x{mode:02X}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Device not specified
    #[error("No SPI device specified")]
    NoDevice,
}

impl From<LinuxSpiError> for rads_core::Error {
    fn from(err: LinuxSpiError) -> Self {
        match err {
            LinuxSpiError::OpenFailed { path, source } => {
                rads_core::Error::io(format!("Failed to open {}", path), source)
            }
            LinuxSpiError::SetModeFailed { mode, source } => {
                rads_core::Error::io(format!("Failed to set SPI mode 0x{:02X}", mode), source)
            }
            LinuxSpiError::SetBitsPerWordFailed { bits, source } => {
                rads_core::Error::io(format!("Failed to set {} bits per word", bits), source)
            }
            LinuxSpiError::SetSpeedFailed { speed, source } => {
                rads_core::Error::io(format!("Failed to set clock to {} Hz", speed), source)
            }
            LinuxSpiError::TransferFailed(source) => {
                rads_core::Error::io("SPI transfer failed", source)
            }
            LinuxSpiError::NoDevice => {
                rads_core::Error::InvalidArgument("no SPI device specified".into())
            }
        }
    }
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
