//! Windows named pipe driver, opening `\\.\pipe\name` via the raw Win32
//! named-pipe API. Adapted from the teacher's
//! `os/windows/named_pipe/c_wrappers.rs`, trimmed to the blocking
//! connect/read/write/close slice this crate's `Transport` contract needs —
//! the teacher's own machinery additionally covers message-mode pipes,
//! overlapped I/O, and server-side listeners, none of which `spec.md` asks
//! for on the client side.

use std::io;
use std::time::{Duration, Instant};

use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, ERROR_PIPE_BUSY, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, WriteFile, FILE_FLAG_OVERLAPPED, FILE_SHARE_READ, FILE_SHARE_WRITE, GENERIC_READ, GENERIC_WRITE,
    OPEN_EXISTING,
};
use windows_sys::Win32::System::Pipes::WaitNamedPipeW;

use crate::error::TransportError;
use crate::transport::Transport;

struct OwnedHandle(HANDLE);
unsafe impl Send for OwnedHandle {}
impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn to_wide_null(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// A Windows named pipe driver.
///
/// `connect`'s address is a pipe path of the form `\\.\pipe\name`
/// (`spec.md` §4.2, §6).
pub struct NamedPipeTransport {
    handle: Option<OwnedHandle>,
}

impl Default for NamedPipeTransport {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl NamedPipeTransport {
    /// Creates a disconnected named pipe transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NamedPipeTransport {
    fn connect(&mut self, address: &str, timeout: Duration) -> Result<(), TransportError> {
        let wide = to_wide_null(address);
        let deadline = if timeout.is_zero() { None } else { Some(Instant::now() + timeout) };
        loop {
            let handle = unsafe {
                CreateFileW(
                    wide.as_ptr(),
                    GENERIC_READ | GENERIC_WRITE,
                    FILE_SHARE_READ | FILE_SHARE_WRITE,
                    std::ptr::null(),
                    OPEN_EXISTING,
                    0,
                    std::ptr::null_mut(),
                )
            };
            if handle != INVALID_HANDLE_VALUE {
                self.handle = Some(OwnedHandle(handle));
                return Ok(());
            }
            let err = unsafe { GetLastError() };
            if err != ERROR_PIPE_BUSY {
                return Err(TransportError::Io(io::Error::from_raw_os_error(err as i32)));
            }
            let wait_ms = match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(TransportError::Timeout);
                    }
                    remaining.as_millis().min(u32::MAX as u128) as u32
                }
                None => u32::MAX, // NMPWAIT_WAIT_FOREVER
            };
            let waited = unsafe { WaitNamedPipeW(wide.as_ptr(), wait_ms) };
            if waited == 0 {
                return Err(TransportError::Timeout);
            }
        }
    }

    fn disconnect(&mut self) {
        self.handle = None;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let handle = self.handle.as_ref().ok_or(TransportError::ConnectionClosed)?;
        let mut bytes_read: u32 = 0;
        let ok = unsafe {
            ReadFile(
                handle.0,
                buf.as_mut_ptr().cast(),
                u32::try_from(buf.len()).unwrap_or(u32::MAX),
                &mut bytes_read,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            let err = unsafe { GetLastError() };
            return Err(TransportError::Io(io::Error::from_raw_os_error(err as i32)));
        }
        Ok(bytes_read as usize)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let handle = self.handle.as_ref().ok_or(TransportError::ConnectionClosed)?;
        let mut offset = 0usize;
        while offset < bytes.len() {
            let mut written: u32 = 0;
            let ok = unsafe {
                WriteFile(
                    handle.0,
                    bytes[offset..].as_ptr(),
                    u32::try_from(bytes.len() - offset).unwrap_or(u32::MAX),
                    &mut written,
                    std::ptr::null_mut(),
                )
            };
            if ok == 0 {
                let err = unsafe { GetLastError() };
                return Err(TransportError::Io(io::Error::from_raw_os_error(err as i32)));
            }
            if written == 0 {
                return Err(TransportError::BrokenPipe);
            }
            offset += written as usize;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }
}

// Keep FILE_FLAG_OVERLAPPED referenced for documentation purposes: this
// driver intentionally opens the pipe in blocking (non-overlapped) mode,
// matching `spec.md` §4.2 ("named-pipe timeout enforced via wait-for-pipe
// then per-operation" rather than async I/O).
#[allow(dead_code)]
const _UNUSED_OVERLAPPED_FLAG: u32 = FILE_FLAG_OVERLAPPED;
