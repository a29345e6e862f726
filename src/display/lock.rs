/*
 *  display/lock.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cross-process panel lock
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! The panel is shared with other services on the same Pi (clock, notifier,
//! whatever else is wired to the HAT). They all agree on a lock file and take an
//! exclusive advisory lock (flock) on it for the duration of one frame transfer.
//! Any process can join in with `flock /tmp/spotipi-matrix.lock <cmd>`.

use log::{debug, warn};
use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::display::error::DisplayError;

const RETRY_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct PanelLock {
    path: PathBuf,
}

/// Held while the panel is being written. Dropping it releases the lock on
/// every path out of the render, error or not.
#[derive(Debug)]
pub struct PanelGuard {
    file: File,
    path: PathBuf,
}

impl PanelLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PanelLock { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, DisplayError> {
        let lock_err = |source: std::io::Error| DisplayError::Lock { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(lock_err)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(lock_err)
    }

    /// Non-blocking attempt; `Ok(None)` when someone else holds the panel.
    pub fn try_acquire(&self) -> Result<Option<PanelGuard>, DisplayError> {
        let file = self.open()?;
        match file.try_lock() {
            Ok(()) => Ok(Some(PanelGuard { file, path: self.path.clone() })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(source)) => Err(DisplayError::Lock { path: self.path.clone(), source }),
        }
    }

    /// Wait for the panel without blocking the runtime.
    pub async fn acquire(&self) -> Result<PanelGuard, DisplayError> {
        let mut announced = false;
        loop {
            if let Some(guard) = self.try_acquire()? {
                return Ok(guard);
            }
            if !announced {
                debug!("Panel busy, waiting on {}", self.path.display());
                announced = true;
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// `acquire` with an upper bound, for paths that must not hang (shutdown).
    pub async fn acquire_within(&self, limit: Duration) -> Result<PanelGuard, DisplayError> {
        tokio::time::timeout(limit, self.acquire())
            .await
            .map_err(|_| DisplayError::LockTimeout { path: self.path.clone(), waited: limit })?
    }
}

impl Drop for PanelGuard {
    fn drop(&mut self) {
        // closing the descriptor drops the flock anyway, unlock to be explicit
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release panel lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = PanelLock::new(dir.path().join("matrix.lock"));
        let other = PanelLock::new(dir.path().join("matrix.lock"));

        let guard = lock.try_acquire().unwrap().expect("first lock");
        assert!(other.try_acquire().unwrap().is_none());

        drop(guard);
        assert!(other.try_acquire().unwrap().is_some());
    }

    #[test]
    fn test_lock_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let lock = PanelLock::new(dir.path().join("run/spotipi/matrix.lock"));
        assert!(lock.try_acquire().unwrap().is_some());
        assert!(lock.path().exists());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.lock");
        let held = PanelLock::new(&path).try_acquire().unwrap().unwrap();

        let waiter = PanelLock::new(&path);
        let task = tokio::spawn(async move { waiter.acquire().await.map(|_| ()) });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!task.is_finished());
        drop(held);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("acquire should finish once released")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_acquire_within_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.lock");
        let _held = PanelLock::new(&path).try_acquire().unwrap().unwrap();

        let err = PanelLock::new(&path).acquire_within(Duration::from_millis(80)).await.unwrap_err();
        assert!(matches!(err, DisplayError::LockTimeout { waited, .. } if waited == Duration::from_millis(80)));
    }
}
