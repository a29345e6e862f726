/*
 *  display/manager.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display sink - serialises frames onto the shared panel
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

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::framebuffer::DisplayFrame;
use crate::display::lock::PanelLock;

/// Sink shared between tasks in this process. The tokio mutex orders writers
/// here, the panel lock orders them against other processes.
pub type SharedSink = Arc<tokio::sync::Mutex<DisplaySink>>;

/// Lock waits longer than this are worth a warning, some other service is
/// hogging the panel.
const SLOW_LOCK_WAIT: Duration = Duration::from_millis(500);

/// Render timing for the panel
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderMetrics {
    /// Time spent waiting on the panel lock for the last frame
    pub lock_wait_us: u64,

    /// Time spent in the driver for the last frame
    pub transfer_time_us: u64,

    /// Frames pushed successfully
    pub frame_count: u64,

    /// Frames the driver refused
    pub failed_count: u64,

    /// Average transfer time
    pub avg_transfer_time_us: u64,
}

impl RenderMetrics {
    pub fn record_frame(&mut self, lock_wait: Duration, transfer: Duration) {
        self.lock_wait_us = lock_wait.as_micros() as u64;
        self.transfer_time_us = transfer.as_micros() as u64;
        self.frame_count += 1;

        // Simple moving average (last average + current) / 2
        if self.avg_transfer_time_us == 0 {
            self.avg_transfer_time_us = self.transfer_time_us;
        } else {
            self.avg_transfer_time_us = (self.avg_transfer_time_us + self.transfer_time_us) / 2;
        }

        if lock_wait > SLOW_LOCK_WAIT {
            warn!("Waited {}ms for the panel lock", lock_wait.as_millis());
        }
    }

    pub fn record_failure(&mut self) {
        self.failed_count += 1;
    }
}

/// Display sink
///
/// Owns the panel driver and the cross-process panel lock. Every write to the
/// panel goes through `render` or `clear`, each of which holds the lock for
/// exactly the duration of the transfer.
pub struct DisplaySink {
    driver: BoxedDriver,
    lock: PanelLock,
    metrics: RenderMetrics,
}

impl DisplaySink {
    pub fn new(driver: BoxedDriver, lock: PanelLock) -> Self {
        DisplaySink { driver, lock, metrics: RenderMetrics::default() }
    }

    /// Bring the panel up and apply brightness where the driver can dim.
    pub fn init(&mut self, brightness: u8) -> Result<(), DisplayError> {
        self.driver.init()?;
        if self.driver.capabilities().supports_brightness {
            self.driver.set_brightness(brightness)?;
        } else {
            debug!("Driver '{}' has no brightness control", self.driver.capabilities().name);
        }
        let (w, h) = self.driver.dimensions();
        info!("Panel ready: {} {}x{} brightness {}%", self.driver.capabilities().name, w, h, brightness);
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.driver.dimensions()
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Push a finished frame to the panel under the panel lock.
    ///
    /// The guard is dropped on every path out, so a failed transfer never
    /// leaves the panel locked.
    pub async fn render(&mut self, frame: DisplayFrame) -> Result<(), DisplayError> {
        let started = Instant::now();
        let _guard = self.lock.acquire().await?;
        let lock_wait = started.elapsed();

        let transfer_start = Instant::now();
        match self.driver.update(&frame) {
            Ok(()) => {
                self.metrics.record_frame(lock_wait, transfer_start.elapsed());
                debug!("Frame {} pushed in {}us", self.metrics.frame_count, self.metrics.transfer_time_us);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    /// Blank the panel under the panel lock
    pub async fn clear(&mut self) -> Result<(), DisplayError> {
        let _guard = self.lock.acquire().await?;
        self.driver.clear()
    }

    /// Blank the panel, giving up if the lock is not free within `limit`.
    pub async fn clear_within(&mut self, limit: Duration) -> Result<(), DisplayError> {
        let _guard = self.lock.acquire_within(limit).await?;
        self.driver.clear()
    }

    /// Wrap in the shared handle the sync loop expects
    pub fn into_shared(self) -> SharedSink {
        Arc::new(tokio::sync::Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockDriver;
    use crate::display::drivers::null::NullDriver;

    fn sink_with_mock(dir: &tempfile::TempDir) -> (DisplaySink, MockDriver) {
        let mock = MockDriver::new(8, 8);
        let sink = DisplaySink::new(Box::new(mock.clone()), PanelLock::new(dir.path().join("panel.lock")));
        (sink, mock)
    }

    #[tokio::test]
    async fn test_render_reaches_driver() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, mock) = sink_with_mock(&dir);
        sink.init(80).unwrap();
        sink.render(DisplayFrame::blank(8, 8)).await.unwrap();

        assert_eq!(mock.frame_count(), 1);
        assert_eq!(sink.metrics().frame_count, 1);
        assert_eq!(mock.state().lock().unwrap().last_brightness, Some(80));
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_render() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, mock) = sink_with_mock(&dir);
        mock.set_fail_updates(true);

        assert!(sink.render(DisplayFrame::blank(8, 8)).await.is_err());
        assert_eq!(sink.metrics().failed_count, 1);

        let probe = PanelLock::new(dir.path().join("panel.lock"));
        assert!(probe.try_acquire().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_render_waits_for_foreign_holder() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, mock) = sink_with_mock(&dir);
        let shared = sink.into_shared();

        let held = PanelLock::new(dir.path().join("panel.lock")).try_acquire().unwrap().unwrap();
        let task = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.lock().await.render(DisplayFrame::blank(8, 8)).await })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(mock.frame_count(), 0);
        drop(held);

        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap().unwrap();
        assert_eq!(mock.frame_count(), 1);
    }

    #[test]
    fn test_init_tolerates_missing_brightness_control() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DisplaySink::new(Box::new(NullDriver::new(8, 8)), PanelLock::new(dir.path().join("p.lock")));
        assert!(sink.init(50).is_ok());
    }

    #[test]
    fn test_init_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, mock) = sink_with_mock(&dir);
        mock.state().lock().unwrap().simulate_init_failure = true;

        assert!(matches!(sink.init(80), Err(DisplayError::InitializationFailed(_))));
        let state = mock.state();
        let state = state.lock().unwrap();
        assert!(!state.is_initialized);
        assert_eq!(state.last_brightness, None);
    }

    #[test]
    fn test_init_rejects_bad_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, _mock) = sink_with_mock(&dir);
        assert!(matches!(sink.init(0), Err(DisplayError::InvalidBrightness(0))));
    }

    #[tokio::test]
    async fn test_clear_within_does_not_wait_forever() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, mock) = sink_with_mock(&dir);
        let held = PanelLock::new(dir.path().join("panel.lock")).try_acquire().unwrap().unwrap();

        let err = sink.clear_within(Duration::from_millis(80)).await.unwrap_err();
        assert!(matches!(err, DisplayError::LockTimeout { .. }));
        assert_eq!(mock.state().lock().unwrap().clear_count, 0);

        drop(held);
        sink.clear_within(Duration::from_millis(500)).await.unwrap();
        assert_eq!(mock.state().lock().unwrap().clear_count, 1);
    }

    #[tokio::test]
    async fn test_clear_goes_through_driver() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, mock) = sink_with_mock(&dir);
        sink.clear().await.unwrap();
        assert_eq!(mock.state().lock().unwrap().clear_count, 1);
    }
}
