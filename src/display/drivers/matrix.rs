/*
 *  display/drivers/matrix.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  HUB75 RGB panel through the rpi-rgb-led-matrix library
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

use log::info;
use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions};

use crate::config::PanelConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::DisplayFrame;
use crate::display::traits::{check_frame_size, DisplayCapabilities, MatrixDriver};

/// Real panel driver. Geometry, wiring and brightness are fixed when the
/// library is initialised in `init()`, so brightness changes after that are refused.
pub struct MatrixHardwareDriver {
    capabilities: DisplayCapabilities,
    panel: PanelConfig,
    brightness: u8,
    matrix: Option<LedMatrix>,
    canvas: Option<LedCanvas>,
}

// SAFETY: the C library runs its own refresh thread and the handle is only
// touched through &mut self, which the sink serialises behind its mutex.
unsafe impl Send for MatrixHardwareDriver {}

impl MatrixHardwareDriver {
    pub fn new(panel: &PanelConfig) -> Self {
        MatrixHardwareDriver {
            capabilities: DisplayCapabilities {
                width: panel.width(),
                height: panel.height(),
                supports_brightness: true,
                name: "rgb-matrix",
            },
            panel: panel.clone(),
            brightness: panel.brightness(),
            matrix: None,
            canvas: None,
        }
    }

    fn options(&self) -> Result<LedMatrixOptions, DisplayError> {
        let mut options = LedMatrixOptions::new();
        options.set_rows(self.panel.rows());
        options.set_cols(self.panel.cols());
        options.set_chain_length(self.panel.chain_length());
        options.set_parallel(self.panel.parallel());
        options.set_hardware_mapping(self.panel.hardware_mapping());
        options
            .set_brightness(self.brightness)
            .map_err(|e| DisplayError::InvalidConfiguration(e.to_string()))?;
        Ok(options)
    }
}

impl MatrixDriver for MatrixHardwareDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let matrix = LedMatrix::new(Some(self.options()?), None)
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        self.canvas = Some(matrix.offscreen_canvas());
        self.matrix = Some(matrix);
        info!(
            "RGB matrix {}x{} ({}, brightness {}%)",
            self.capabilities.width,
            self.capabilities.height,
            self.panel.hardware_mapping(),
            self.brightness
        );
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        if !(1..=100).contains(&value) {
            return Err(DisplayError::InvalidBrightness(value));
        }
        if self.matrix.is_some() {
            return Err(DisplayError::UnsupportedOperation);
        }
        self.brightness = value;
        Ok(())
    }

    fn update(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        check_frame_size(&*self, frame)?;
        let (Some(matrix), Some(mut canvas)) = (self.matrix.as_ref(), self.canvas.take()) else {
            return Err(DisplayError::UpdateFailed("matrix not initialized".into()));
        };
        for (x, y, [red, green, blue]) in frame.enumerate_pixels() {
            canvas.set(x as i32, y as i32, &LedColor { red, green, blue });
        }
        // vsync swap, we get the previous front buffer back for the next frame
        self.canvas = Some(matrix.swap(canvas));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        if let (Some(matrix), Some(mut canvas)) = (self.matrix.as_ref(), self.canvas.take()) {
            canvas.clear();
            self.canvas = Some(matrix.swap(canvas));
        }
        Ok(())
    }
}
