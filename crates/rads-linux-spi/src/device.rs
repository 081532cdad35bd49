//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `FrameTransport` trait using Linux's spidev interface.

use crate::error::{LinuxSpiError, Result};

use bitflags::bitflags;
use nix::errno::Errno;
use rads_core::config::TransportConfig;
use rads_core::frame::FRAME_BYTES;
use rads_core::platform::FrameTransport;

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, RawFd};

/// Word size used for every transfer
const BITS_PER_WORD: u8 = 8;

bitflags! {
    /// spidev mode bits (`SPI_IOC_WR_MODE`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiModeFlags: u8 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Chip-select active high
        const CS_HIGH   = 0x04;
        /// LSB first on the wire
        const LSB_FIRST = 0x08;
        /// Shared SI/SO line
        const THREE_WIRE = 0x10;
        /// Loopback
        const LOOP      = 0x20;
        /// No chip-select at all
        const NO_CS     = 0x40;
        /// Slave pulls low to pause
        const READY     = 0x80;

        /// Mode 0-3 bits
        const MODE_MASK = Self::CPHA.bits() | Self::CPOL.bits();
    }
}

impl SpiModeFlags {
    /// Flags for SPI mode 0-3
    pub fn from_mode(mode: u8) -> Self {
        Self::from_bits_truncate(mode) & Self::MODE_MASK
    }
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of spi_ioc_transfer struct
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    ///
    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr), _IOC_WRITE = 1
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev2.0")
    pub device: String,
    /// Maximum SPI clock speed in Hz
    pub speed_hz: u32,
    /// SPI mode (0-3)
    pub mode: u8,
    /// Ask for a mode without chip-select
    pub no_cs: bool,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: rads_core::config::DEFAULT_SCLK_HZ,
            mode: 0,
            no_cs: false,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    /// Request a mode without chip-select
    pub fn with_no_cs(mut self, no_cs: bool) -> Self {
        self.no_cs = no_cs;
        self
    }
}

impl From<&TransportConfig<'_>> for LinuxSpiConfig {
    fn from(config: &TransportConfig<'_>) -> Self {
        Self::new(config.path)
            .with_speed(config.sclk_hz)
            .with_mode(config.mode)
            .with_no_cs(config.no_cs)
    }
}

/// Linux SPI transport using the spidev interface
///
/// The file is closed when this value is dropped, including when `open`
/// fails after the device node was opened.
#[derive(Debug)]
pub struct LinuxSpi {
    /// File handle for spidev device
    file: File,
    /// Mode actually accepted by the kernel
    mode: SpiModeFlags,
    /// Current speed in Hz
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mode = set_mode(fd, config)?;

        let bits = BITS_PER_WORD;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: Opened {} (mode=0x{:02X}, speed={} kHz)",
            config.device,
            mode.bits(),
            speed / 1000
        );

        Ok(Self {
            file,
            mode,
            speed_hz: speed,
        })
    }

    /// Mode bits accepted by the kernel
    pub fn mode(&self) -> SpiModeFlags {
        self.mode
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Perform one full-duplex transfer of `tx.len()` bytes
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        debug_assert_eq!(tx.len(), rx.len());

        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len: tx.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: BITS_PER_WORD,
            ..Default::default()
        };

        let ioctl_num = ioctl::spi_ioc_message(1);
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ioctl_num,
                &transfer as *const SpiIocTransfer,
            )
        };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }
}

impl FrameTransport for LinuxSpi {
    fn exchange(
        &mut self,
        tx: &[u8; FRAME_BYTES],
        rx: &mut [u8; FRAME_BYTES],
    ) -> rads_core::Result<()> {
        Ok(self.transfer(tx, rx)?)
    }
}

/// Write the mode, falling back once to plain mode if `SPI_NO_CS` is rejected
///
/// Some controller drivers refuse `SPI_NO_CS` with `EINVAL` even though the
/// flag is defined.
fn set_mode(fd: RawFd, config: &LinuxSpiConfig) -> Result<SpiModeFlags> {
    let base = SpiModeFlags::from_mode(config.mode);
    let requested = if config.no_cs {
        base | SpiModeFlags::NO_CS
    } else {
        base
    };

    match write_mode(fd, requested) {
        Ok(()) => Ok(requested),
        Err(Errno::EINVAL) if config.no_cs => {
            log::warn!(
                "linux_spi: {} rejected SPI_NO_CS, using mode {} with chip-select",
                config.device,
                config.mode
            );
            write_mode(fd, base).map_err(|e| LinuxSpiError::SetModeFailed {
                mode: base.bits(),
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
            Ok(base)
        }
        Err(e) => Err(LinuxSpiError::SetModeFailed {
            mode: requested.bits(),
            source: std::io::Error::from_raw_os_error(e as i32),
        }),
    }
}

fn write_mode(fd: RawFd, mode: SpiModeFlags) -> nix::Result<()> {
    let bits = mode.bits();
    unsafe { ioctl::spi_ioc_wr_mode(fd, &bits) }.map(|_| ())
}
