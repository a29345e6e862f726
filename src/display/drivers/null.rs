/*
 *  display/drivers/null.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
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
use crate::display::traits::{check_frame_size, DisplayCapabilities, MatrixDriver};

/// Accepts and drops frames. Handy to exercise the poll loop on a laptop.
#[derive(Debug)]
pub struct NullDriver {
    capabilities: DisplayCapabilities,
}

impl NullDriver {
    pub fn new(width: u32, height: u32) -> Self {
        NullDriver {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_brightness: false,
                name: "null",
            },
        }
    }
}

impl MatrixDriver for NullDriver {
    fn capabilities(&self) -> &DisplayCapabilities { &self.capabilities }
    fn init(&mut self) -> Result<(), DisplayError> { Ok(()) }
    fn set_brightness(&mut self, _value: u8) -> Result<(), DisplayError> {
        Err(DisplayError::UnsupportedOperation)
    }
    fn update(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        check_frame_size(&*self, frame)
    }
    fn clear(&mut self) -> Result<(), DisplayError> { Ok(()) }
}
