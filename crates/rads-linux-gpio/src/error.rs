//! Error types for sysfs GPIO operations

use thiserror::Error;

/// sysfs GPIO specific errors
#[derive(Debug, Error)]
pub enum SysfsGpioError {
    /// Writing the line number to `export` failed
    #[error("Failed to export GPIO {line}: {source}")]
    ExportFailed {
        line: u32,
        #[source]
        source: std::io::Error,
    },

    /// Writing a line attribute failed
    #[error("Failed to set GPIO {line} {attr}: {source}")]
    AttributeFailed {
        line: u32,
        attr: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Opening the line's `value` file failed
    #[error("Failed to open GPIO {line} value: {source}")]
    OpenValueFailed {
        line: u32,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for an edge failed
    #[error("Failed waiting for GPIO {line} edge: {source}")]
    WaitFailed {
        line: u32,
        #[source]
        source: std::io::Error,
    },

    /// No edge within the timeout
    #[error("Timed out after {timeout_ms} ms waiting for GPIO {line} edge")]
    TimedOut { line: u32, timeout_ms: u128 },

    /// Driving an output failed
    #[error("Failed to set GPIO {line} value: {source}")]
    SetValueFailed {
        line: u32,
        #[source]
        source: std::io::Error,
    },

    /// The line has no open value handle
    #[error("GPIO {line} is not open")]
    NotOpen { line: u32 },

    /// `set_value` on a line acquired as input
    #[error("GPIO {line} is not an output")]
    NotOutput { line: u32 },
}

impl From<SysfsGpioError> for rads_core::Error {
    fn from(err: SysfsGpioError) -> Self {
        match err {
            SysfsGpioError::TimedOut { .. } => rads_core::Error::TimedOut,
            SysfsGpioError::NotOutput { .. } => rads_core::Error::NotPermitted,
            SysfsGpioError::NotOpen { line } => rads_core::Error::io(
                format!("GPIO {} is not open", line),
                std::io::Error::from_raw_os_error(nix::libc::EBADF),
            ),
            SysfsGpioError::ExportFailed { line, source } => {
                rads_core::Error::io(format!("Failed to export GPIO {}", line), source)
            }
            SysfsGpioError::AttributeFailed { line, attr, source } => {
                rads_core::Error::io(format!("Failed to set GPIO {} {}", line, attr), source)
            }
            SysfsGpioError::OpenValueFailed { line, source } => {
                rads_core::Error::io(format!("Failed to open GPIO {} value", line), source)
            }
            SysfsGpioError::WaitFailed { line, source } => {
                rads_core::Error::io(format!("Failed waiting for GPIO {} edge", line), source)
            }
            SysfsGpioError::SetValueFailed { line, source } => {
                rads_core::Error::io(format!("Failed to set GPIO {} value", line), source)
            }
        }
    }
}

/// Result type for sysfs GPIO operations
pub type Result<T> = std::result::Result<T, SysfsGpioError>;
