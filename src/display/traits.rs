/*
 *  display/traits.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for panel driver abstraction
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

use crate::display::error::DisplayError;
use crate::display::framebuffer::DisplayFrame;

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Canvas width in pixels (cols x chain length)
    pub width: u32,

    /// Canvas height in pixels (rows x parallel chains)
    pub height: u32,

    /// Whether the display supports brightness control
    pub supports_brightness: bool,

    /// Human readable driver name for logs
    pub name: &'static str,
}

/// Minimal hardware abstraction - every panel driver implements this trait
///
/// The driver owns the pixel transfer. It never sees the shared panel lock,
/// that is taken by the sink around `update`.
pub trait MatrixDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Initialize the panel hardware
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set display brightness in percent (1-100)
    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Push a finished frame to the panel
    ///
    /// Frames are always full-canvas RGB. Drivers reject frames whose size
    /// does not match `dimensions()`.
    fn update(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError>;

    /// Blank the panel
    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// Shared size check for `update` implementations.
pub fn check_frame_size(driver: &dyn MatrixDriver, frame: &DisplayFrame) -> Result<(), DisplayError> {
    let expected = driver.dimensions();
    let actual = frame.dimensions();
    if expected != actual {
        return Err(DisplayError::FrameSizeMismatch { expected, actual });
    }
    Ok(())
}
