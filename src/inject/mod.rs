//! Terminal input injection.
//!
//! Places a compiled command into the controlling terminal's input queue so
//! it shows up on the shell prompt as if typed; the user still presses Enter
//! to run it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("error opening the controlling terminal")]
    Terminal(#[source] std::io::Error),
    /// A byte failed to inject. The terminal may hold a partial line;
    /// callers must not blindly retry.
    #[error("error injecting text into the terminal input buffer")]
    Injection,
    #[error("terminal injection is not supported on this platform")]
    Unsupported,
}

/// Injects `text` into the controlling terminal's input queue, one byte per
/// ioctl, in order.
#[cfg(any(target_os = "linux", target_os = "macos"))]
pub fn produce(text: &str) -> Result<(), InjectError> {
    use std::os::unix::io::AsRawFd;

    let tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")
        .map_err(InjectError::Terminal)?;

    let fd = tty.as_raw_fd();
    for byte in text.as_bytes() {
        // TIOCSTI pushes a single byte into the terminal input queue.
        let rc = unsafe { libc::ioctl(fd, libc::TIOCSTI, byte as *const u8) };
        if rc != 0 {
            return Err(InjectError::Injection);
        }
    }

    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn produce(_text: &str) -> Result<(), InjectError> {
    Err(InjectError::Unsupported)
}
