//! `perf_event_open` primitives for system-wide uncore counters
//!
//! This module provides the raw syscall and ioctl wrappers. Ownership of the
//! returned descriptor is handed to the caller as an [`OwnedFd`], so every
//! opened counter is closed exactly once when it is dropped.

use perf_event_open_sys as sys;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

pub type Result<T> = std::result::Result<T, PerfError>;

/// Errors that can occur during perf counter operations
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    #[error("Failed to open counter (pmu type {pmu_type}, config 0x{config:X}) on CPU {cpu}: {source}")]
    OpenFailed {
        pmu_type: u32,
        config: u64,
        cpu: i32,
        source: io::Error,
    },

    #[error("perf ioctl {op} failed: {source}")]
    IoctlFailed {
        op: &'static str,
        source: io::Error,
    },

    #[error("Failed to read counter: {source}")]
    ReadFailed { source: io::Error },
}

/// Build the attribute block for a system-wide counting event
///
/// The counter starts disabled and counts both user and kernel activity.
pub fn counter_attr(pmu_type: u32, config: u64) -> sys::bindings::perf_event_attr {
    let mut attr = sys::bindings::perf_event_attr::default();
    attr.size = std::mem::size_of::<sys::bindings::perf_event_attr>() as u32;
    attr.type_ = pmu_type;
    attr.config = config;
    attr.set_disabled(1);
    attr.set_exclude_kernel(0);
    attr.set_exclude_hv(0);
    attr
}

/// Open a counting event on a logical CPU
///
/// # Arguments
///
/// * `pmu_type` - Dynamic PMU type from `/sys/bus/event_source/devices/<pmu>/type`
/// * `config` - Packed event configuration word
/// * `cpu` - Logical CPU the uncore event is bound to
///
/// # Errors
///
/// Returns [`PerfError::OpenFailed`] when the kernel refuses the event. For
/// uncore PMUs this is the normal outcome on CPUs that do not expose the box.
pub fn open_counter(pmu_type: u32, config: u64, cpu: i32) -> Result<OwnedFd> {
    let mut attr = counter_attr(pmu_type, config);

    let fd = unsafe {
        sys::perf_event_open(
            &mut attr,
            -1, // pid (all processes)
            cpu,
            -1, // group_fd
            sys::bindings::PERF_FLAG_FD_CLOEXEC as libc::c_ulong,
        )
    };

    if fd < 0 {
        return Err(PerfError::OpenFailed {
            pmu_type,
            config,
            cpu,
            source: io::Error::last_os_error(),
        });
    }

    // SAFETY: the kernel just returned this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn check_ioctl(op: &'static str, ret: libc::c_int) -> Result<()> {
    if ret < 0 {
        return Err(PerfError::IoctlFailed {
            op,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Zero the hardware count
pub fn reset(fd: BorrowedFd<'_>) -> Result<()> {
    let ret = unsafe { sys::ioctls::RESET(fd.as_raw_fd(), 0) };
    check_ioctl("RESET", ret)
}

/// Start accumulating
pub fn enable(fd: BorrowedFd<'_>) -> Result<()> {
    let ret = unsafe { sys::ioctls::ENABLE(fd.as_raw_fd(), 0) };
    check_ioctl("ENABLE", ret)
}

/// Stop accumulating
pub fn disable(fd: BorrowedFd<'_>) -> Result<()> {
    let ret = unsafe { sys::ioctls::DISABLE(fd.as_raw_fd(), 0) };
    check_ioctl("DISABLE", ret)
}

/// Read the current count
///
/// Returns `Ok(None)` when the kernel hands back fewer than eight bytes.
pub fn read_count(fd: BorrowedFd<'_>) -> Result<Option<u64>> {
    let mut buffer = [0u8; 8];
    let n = unsafe { libc::read(fd.as_raw_fd(), buffer.as_mut_ptr().cast(), buffer.len()) };

    if n < 0 {
        return Err(PerfError::ReadFailed {
            source: io::Error::last_os_error(),
        });
    }

    if n as usize != buffer.len() {
        return Ok(None);
    }

    Ok(Some(u64::from_ne_bytes(buffer)))
}
