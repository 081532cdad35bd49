//! sysfs GPIO line implementation
//!
//! A line is reserved by writing its global number to `<root>/export`, then
//! configured through the attribute files under `<root>/gpioN/`. Edge waits
//! use `poll(POLLPRI)` on the `value` file, which the kernel signals when
//! the configured edge occurs.

use crate::error::{Result, SysfsGpioError};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use rads_core::platform::{DataReadyLine, Level, SyncLine};

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default sysfs GPIO class directory
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input with falling-edge notification
    In,
    /// Output
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// Handle on the sysfs GPIO class directory
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpio {
    /// Use the system GPIO class directory
    pub fn new() -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT)
    }

    /// Use a different class directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The class directory in use
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_attr(&self, line: u32, attr: &str) -> PathBuf {
        self.root.join(format!("gpio{}", line)).join(attr)
    }

    /// Export `line`; returns whether this call performed the export
    ///
    /// `EBUSY` means the line is already exported by someone else, which is
    /// not an error.
    fn export(&self, line: u32) -> Result<bool> {
        match write_text_file(&self.root.join("export"), &line.to_string()) {
            Ok(()) => Ok(true),
            Err(e) if is_busy(&e) => {
                log::debug!("sysfs_gpio: GPIO {} already exported", line);
                Ok(false)
            }
            Err(source) => Err(SysfsGpioError::ExportFailed { line, source }),
        }
    }

    fn unexport(&self, line: u32) -> io::Result<()> {
        write_text_file(&self.root.join("unexport"), &line.to_string())
    }

    fn set_attr(&self, line: u32, attr: &'static str, value: &str) -> Result<()> {
        write_text_file(&self.line_attr(line, attr), value)
            .map_err(|source| SysfsGpioError::AttributeFailed { line, attr, source })
    }

    /// Reserve `line` as an input with falling-edge detection
    pub fn acquire_input(&self, line: u32) -> Result<GpioLine> {
        let mut gpio = GpioLine::reserve(self, line, Direction::In)?;

        self.set_attr(line, "direction", Direction::In.as_str())?;
        self.set_attr(line, "edge", "falling")?;

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(self.line_attr(line, "value"))
            .map_err(|source| SysfsGpioError::OpenValueFailed { line, source })?;
        gpio.file = Some(file);

        log::debug!(
            "sysfs_gpio: GPIO {} acquired as falling-edge input",
            line
        );
        Ok(gpio)
    }

    /// Reserve `line` as an output driven to `initial`
    pub fn acquire_output(&self, line: u32, initial: Level) -> Result<GpioLine> {
        let mut gpio = GpioLine::reserve(self, line, Direction::Out)?;

        self.set_attr(line, "direction", Direction::Out.as_str())?;
        self.set_attr(line, "value", initial.as_str())?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.line_attr(line, "value"))
            .map_err(|source| SysfsGpioError::OpenValueFailed { line, source })?;
        gpio.file = Some(file);

        log::debug!("sysfs_gpio: GPIO {} acquired as output ({:?})", line, initial);
        Ok(gpio)
    }
}

/// One reserved sysfs GPIO line
///
/// Dropping the line closes its value handle and unexports it if the
/// export was ours. Any failure after the export in `acquire_*` therefore
/// undoes the export on the way out.
#[derive(Debug)]
pub struct GpioLine {
    sysfs: SysfsGpio,
    line: u32,
    direction: Direction,
    exported: bool,
    file: Option<File>,
}

impl GpioLine {
    fn reserve(sysfs: &SysfsGpio, line: u32, direction: Direction) -> Result<Self> {
        let exported = sysfs.export(line)?;
        Ok(Self {
            sysfs: sysfs.clone(),
            line,
            direction,
            exported,
            file: None,
        })
    }

    /// Global line number
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Line direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this handle performed the export
    pub fn exported(&self) -> bool {
        self.exported
    }

    /// Whether the value handle is open
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Wait for the configured edge
    pub fn wait(&mut self, timeout: Duration) -> Result<()> {
        let line = self.line;
        let file = self.file.as_mut().ok_or(SysfsGpioError::NotOpen { line })?;

        drain(file).map_err(|source| SysfsGpioError::WaitFailed { line, source })?;

        let ready = {
            let mut fds = [PollFd::new(
                file.as_fd(),
                PollFlags::POLLPRI | PollFlags::POLLERR,
            )];
            let poll_timeout = PollTimeout::try_from(timeout).unwrap_or(PollTimeout::MAX);
            poll(&mut fds, poll_timeout).map_err(|e| SysfsGpioError::WaitFailed {
                line,
                source: io::Error::from(e),
            })?
        };

        if ready == 0 {
            return Err(SysfsGpioError::TimedOut {
                line,
                timeout_ms: timeout.as_millis(),
            });
        }

        drain(file).map_err(|source| SysfsGpioError::WaitFailed { line, source })
    }

    /// Drive an output line
    pub fn set_value(&mut self, level: Level) -> Result<()> {
        let line = self.line;
        if self.direction != Direction::Out {
            return Err(SysfsGpioError::NotOutput { line });
        }
        let file = self.file.as_mut().ok_or(SysfsGpioError::NotOpen { line })?;

        file.seek(SeekFrom::Start(0))
            .map_err(|source| SysfsGpioError::SetValueFailed { line, source })?;
        match file.write(&[level.as_char()]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(SysfsGpioError::SetValueFailed {
                line,
                source: io::Error::from_raw_os_error(Errno::EIO as i32),
            }),
            Err(source) => Err(SysfsGpioError::SetValueFailed { line, source }),
        }
    }

    /// Close the value handle and undo our export
    ///
    /// Safe to call repeatedly and on a partially acquired line.
    pub fn release(&mut self) {
        self.file = None;
        if self.exported {
            self.exported = false;
            if let Err(e) = self.sysfs.unexport(self.line) {
                log::warn!("sysfs_gpio: Failed to unexport GPIO {}: {}", self.line, e);
            } else {
                log::debug!("sysfs_gpio: GPIO {} unexported", self.line);
            }
        }
    }
}

impl Drop for GpioLine {
    fn drop(&mut self) {
        self.release();
    }
}

impl DataReadyLine for GpioLine {
    fn wait_edge(&mut self, timeout: Duration) -> rads_core::Result<()> {
        Ok(self.wait(timeout)?)
    }
}

impl SyncLine for GpioLine {
    fn set_level(&mut self, level: Level) -> rads_core::Result<()> {
        Ok(self.set_value(level)?)
    }
}

/// Write `value` with a single write call; a short write is an error
fn write_text_file(path: &Path, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let written = file.write(value.as_bytes())?;
    if written != value.len() {
        return Err(io::Error::from_raw_os_error(Errno::EIO as i32));
    }
    Ok(())
}

/// Re-read the value file to acknowledge any pending edge
fn drain(file: &mut File) -> io::Result<()> {
    let mut junk = [0u8; 8];
    file.seek(SeekFrom::Start(0))?;
    // The read only clears the notification; its result does not matter
    let _ = file.read(&mut junk);
    Ok(())
}

fn is_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(Errno::EBUSY as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Lay out a fake class directory with one line directory
    fn fake_sysfs(lines: &[u32]) -> (tempfile::TempDir, SysfsGpio) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for line in lines {
            let line_dir = dir.path().join(format!("gpio{}", line));
            fs::create_dir(&line_dir).unwrap();
            for attr in ["direction", "edge", "value"] {
                fs::write(line_dir.join(attr), "").unwrap();
            }
        }
        let sysfs = SysfsGpio::with_root(dir.path());
        (dir, sysfs)
    }

    fn read(dir: &tempfile::TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    #[test]
    fn test_acquire_input_configures_line() {
        let (dir, sysfs) = fake_sysfs(&[968]);
        let line = sysfs.acquire_input(968).unwrap();

        assert_eq!(read(&dir, "export"), "968");
        assert_eq!(read(&dir, "gpio968/direction"), "in");
        assert_eq!(read(&dir, "gpio968/edge"), "falling");
        assert!(line.exported());
        assert!(line.is_open());
        assert_eq!(line.direction(), Direction::In);
    }

    #[test]
    fn test_acquire_output_sets_initial_level() {
        let (dir, sysfs) = fake_sysfs(&[969]);
        let mut line = sysfs.acquire_output(969, Level::High).unwrap();

        assert_eq!(read(&dir, "gpio969/direction"), "out");
        assert_eq!(read(&dir, "gpio969/value"), "1");

        line.set_value(Level::Low).unwrap();
        assert_eq!(read(&dir, "gpio969/value"), "0");
        line.set_value(Level::High).unwrap();
        assert_eq!(read(&dir, "gpio969/value"), "1");
    }

    #[test]
    fn test_release_unexports_once() {
        let (dir, sysfs) = fake_sysfs(&[968]);
        let mut line = sysfs.acquire_input(968).unwrap();

        line.release();
        assert_eq!(read(&dir, "unexport"), "968");
        assert!(!line.is_open());
        assert!(!line.exported());

        fs::write(dir.path().join("unexport"), "").unwrap();
        line.release();
        drop(line);
        assert_eq!(read(&dir, "unexport"), "");
    }

    #[test]
    fn test_drop_unexports() {
        let (dir, sysfs) = fake_sysfs(&[5]);
        drop(sysfs.acquire_output(5, Level::High).unwrap());
        assert_eq!(read(&dir, "unexport"), "5");
    }

    #[test]
    fn test_partial_acquire_unexports() {
        // Export succeeds but the line directory never appears
        let (dir, sysfs) = fake_sysfs(&[]);
        let err = sysfs.acquire_input(42).unwrap_err();

        assert!(matches!(
            err,
            SysfsGpioError::AttributeFailed {
                line: 42,
                attr: "direction",
                ..
            }
        ));
        assert_eq!(read(&dir, "unexport"), "42");
    }

    #[test]
    fn test_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sysfs = SysfsGpio::with_root(dir.path().join("missing"));
        assert!(matches!(
            sysfs.acquire_input(1),
            Err(SysfsGpioError::ExportFailed { line: 1, .. })
        ));
    }

    #[test]
    fn test_set_value_on_input_rejected() {
        let (_dir, sysfs) = fake_sysfs(&[968]);
        let mut line = sysfs.acquire_input(968).unwrap();
        assert!(matches!(
            line.set_value(Level::Low),
            Err(SysfsGpioError::NotOutput { line: 968 })
        ));
    }

    #[test]
    fn test_released_line_not_open() {
        let (_dir, sysfs) = fake_sysfs(&[968]);
        let mut line = sysfs.acquire_input(968).unwrap();
        line.release();

        let err = line.wait(Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, SysfsGpioError::NotOpen { line: 968 }));
        assert!(matches!(
            rads_core::Error::from(err),
            rads_core::Error::Io { .. }
        ));
    }

    #[test]
    fn test_wait_times_out_without_edge() {
        // Regular files never raise POLLPRI
        let (_dir, sysfs) = fake_sysfs(&[968]);
        let mut line = sysfs.acquire_input(968).unwrap();

        let err = line.wait(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, SysfsGpioError::TimedOut { line: 968, .. }));
        assert!(rads_core::Error::from(err).is_timeout());
    }

    #[test]
    fn test_line_exported_elsewhere_stays_exported() {
        // What export() hands back when the kernel answers EBUSY
        let (dir, sysfs) = fake_sysfs(&[968]);
        let value = File::open(dir.path().join("gpio968/value")).unwrap();
        let mut line = GpioLine {
            sysfs: sysfs.clone(),
            line: 968,
            direction: Direction::In,
            exported: false,
            file: Some(value),
        };

        line.release();
        assert!(!line.is_open());
        drop(line);
        assert_eq!(read(&dir, "unexport"), "");
    }

    #[test]
    fn test_busy_classification() {
        assert!(is_busy(&io::Error::from_raw_os_error(Errno::EBUSY as i32)));
        assert!(!is_busy(&io::Error::from_raw_os_error(Errno::EINVAL as i32)));
    }
}
