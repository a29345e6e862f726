/*
 *  display/drivers/mock.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock panel driver for testing without hardware
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

use std::sync::{Arc, Mutex};

use crate::display::error::DisplayError;
use crate::display::framebuffer::DisplayFrame;
use crate::display::traits::{check_frame_size, DisplayCapabilities, MatrixDriver};

/// Mock panel driver
///
/// Records every operation and keeps the frames it was handed so tests can
/// assert on what reached the "panel". The state is shared behind an `Arc`
/// so a test keeps a handle after the driver moves into a sink.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Every frame accepted by update(), oldest first
    pub frames: Vec<DisplayFrame>,

    /// Simulate failures (for error testing)
    pub simulate_update_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    pub fn new(width: u32, height: u32) -> Self {
        MockDriver {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_brightness: true,
                name: "mock",
            },
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockDriverState) -> T) -> T {
        // a panicking test thread poisons the mutex, the data is still fine to read
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn frame_count(&self) -> usize {
        self.with_state(|s| s.frames.len())
    }

    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.with_state(|s| s.frames.last().cloned())
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.with_state(|s| s.simulate_update_failure = fail);
    }
}

impl MatrixDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.with_state(|state| {
            if state.simulate_init_failure {
                return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
            }
            state.init_count += 1;
            state.is_initialized = true;
            Ok(())
        })
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        if !(1..=100).contains(&value) {
            return Err(DisplayError::InvalidBrightness(value));
        }
        self.with_state(|s| s.last_brightness = Some(value));
        Ok(())
    }

    fn update(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        check_frame_size(&*self, frame)?;
        self.with_state(|state| {
            if state.simulate_update_failure {
                return Err(DisplayError::UpdateFailed("Simulated update failure".to_string()));
            }
            state.frames.push(frame.clone());
            Ok(())
        })
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.with_state(|s| s.clear_count += 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new(64, 32);
        assert_eq!(driver.dimensions(), (64, 32));
        assert_eq!(driver.frame_count(), 0);
    }

    #[test]
    fn test_mock_driver_init() {
        let mut driver = MockDriver::new(64, 64);
        let state = driver.state();
        assert!(!state.lock().unwrap().is_initialized);
        driver.init().unwrap();
        assert_eq!(state.lock().unwrap().init_count, 1);
        assert!(state.lock().unwrap().is_initialized);
    }

    #[test]
    fn test_mock_driver_records_frames() {
        let mut driver = MockDriver::new(64, 64);
        driver.update(&DisplayFrame::blank(64, 64)).unwrap();
        assert_eq!(driver.frame_count(), 1);
    }

    #[test]
    fn test_mock_driver_rejects_wrong_size() {
        let mut driver = MockDriver::new(64, 64);
        let err = driver.update(&DisplayFrame::blank(32, 32)).unwrap_err();
        assert!(matches!(err, DisplayError::FrameSizeMismatch { expected: (64, 64), actual: (32, 32) }));
        assert_eq!(driver.frame_count(), 0);
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::new(8, 8);
        driver.set_fail_updates(true);
        assert!(driver.update(&DisplayFrame::blank(8, 8)).is_err());
        driver.set_fail_updates(false);
        assert!(driver.update(&DisplayFrame::blank(8, 8)).is_ok());
    }

    #[test]
    fn test_mock_driver_brightness_range() {
        let mut driver = MockDriver::new(8, 8);
        assert!(driver.set_brightness(0).is_err());
        driver.set_brightness(80).unwrap();
        assert_eq!(driver.state().lock().unwrap().last_brightness, Some(80));
    }
}
