use crate::service::StorageReport;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("path contains an interior NUL byte: {0}")]
    InvalidPath(String),
    #[error("statvfs failed for {path}: {source}")]
    Statvfs {
        path: String,
        source: std::io::Error,
    },
    #[error("volume statistics are not supported on this platform")]
    Unsupported,
}

/// Capacity of the volume holding the sandbox. `free` is the space an
/// unprivileged caller can actually use, not the raw free block count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeCapacity {
    pub total: u64,
    pub free: u64,
}

impl VolumeCapacity {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// Host facilities the storage service depends on. Volume capacity is
/// always queried live; `package_stats` is an optional fast path for
/// hosts that precompute per-category usage, and `None` tells the
/// service to fall back to walking the category roots itself.
pub trait PlatformStats: Send + Sync {
    fn volume_capacity(&self) -> Result<VolumeCapacity, PlatformError>;

    fn package_stats(&self) -> Option<StorageReport> {
        None
    }
}

/// Live statistics for the volume containing `probe_path`.
pub struct HostPlatform {
    probe_path: PathBuf,
}

impl HostPlatform {
    pub fn new(probe_path: impl Into<PathBuf>) -> Self {
        Self {
            probe_path: probe_path.into(),
        }
    }
}

#[cfg(unix)]
impl PlatformStats for HostPlatform {
    fn volume_capacity(&self) -> Result<VolumeCapacity, PlatformError> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let path = &self.probe_path;
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| PlatformError::InvalidPath(path.display().to_string()))?;

        // SAFETY: statvfs only writes into the buffer we hand it, and we
        // read the buffer only after checking the return code.
        unsafe {
            let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
            if libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) != 0 {
                return Err(PlatformError::Statvfs {
                    path: path.display().to_string(),
                    source: std::io::Error::last_os_error(),
                });
            }
            let stat = stat.assume_init();
            let frsize = stat.f_frsize as u64;
            Ok(VolumeCapacity {
                total: stat.f_blocks as u64 * frsize,
                free: stat.f_bavail as u64 * frsize,
            })
        }
    }
}

#[cfg(not(unix))]
impl PlatformStats for HostPlatform {
    fn volume_capacity(&self) -> Result<VolumeCapacity, PlatformError> {
        Err(PlatformError::Unsupported)
    }
}
