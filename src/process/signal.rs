//! Platform support for graceful termination.
//!
//! `ffmpeg` finalizes its outputs when it receives `SIGTERM` on Unix. On
//! Windows `TerminateProcess` is a hard kill, so the child is started in its
//! own process group and receives `CTRL_BREAK_EVENT` instead.

use std::io;

use tokio::process::Command;

/// Prepare a command so that [`send_graceful`] can reach the child.
pub(crate) fn prepare(cmd: &mut Command) {
    #[cfg(windows)]
    {
        use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(not(windows))]
    let _ = cmd;
}

/// Ask the process to stop and finalize its output.
#[cfg(unix)]
pub(crate) fn send_graceful(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from)
}

/// Ask the process to stop and finalize its output.
#[cfg(windows)]
#[allow(unsafe_code)]
pub(crate) fn send_graceful(pid: u32) -> io::Result<()> {
    use windows_sys::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};

    // SAFETY: no pointers are passed; the group id is the child's pid because
    // it was spawned with CREATE_NEW_PROCESS_GROUP.
    let ok = unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid) };
    if ok == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn send_graceful(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "graceful termination is not supported on this platform",
    ))
}
