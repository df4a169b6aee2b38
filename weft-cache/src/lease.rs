//! Cross-process scan ownership lease.
//!
//! Exactly one process among concurrently booting workers performs the
//! walk; the rest wait on the snapshot it commits. The lease is an OS
//! advisory lock on a file in the cache directory: if the owner crashes
//! mid-scan the kernel releases the lock, so a waiter's next try-acquire
//! promotes it to owner instead of deadlocking. The bounded-wait policy
//! around this primitive lives in the scan coordinator.

use std::fs::File;
use std::path::Path;

use fd_lock::{RwLock, RwLockWriteGuard};

use weft_core::errors::CacheError;

/// Held for the duration of a scan; dropping it releases ownership.
pub struct LeaseGuard<'a> {
    _guard: RwLockWriteGuard<'a, File>,
}

/// The lease file handle. One instance per scan attempt.
pub struct ScanLease {
    lock: RwLock<File>,
}

impl ScanLease {
    /// Open (creating if necessary) the lease file under `cache_dir`.
    pub fn open(cache_dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = cache_dir.join("scan.lease");
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CacheError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            lock: RwLock::new(file),
        })
    }

    /// Try to take ownership without blocking. `None` means another
    /// process currently owns the scan.
    pub fn try_acquire(&mut self) -> Result<Option<LeaseGuard<'_>>, CacheError> {
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(LeaseGuard { _guard: guard })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(CacheError::Io {
                path: "scan.lease".to_string(),
                message: e.to_string(),
            }),
        }
    }
}
