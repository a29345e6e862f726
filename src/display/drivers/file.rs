/*
 *  display/drivers/file.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  PNG snapshot driver for headless boxes
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

use image::ImageFormat;
use log::debug;
use std::path::{Path, PathBuf};

use crate::display::error::DisplayError;
use crate::display::framebuffer::DisplayFrame;
use crate::display::traits::{check_frame_size, DisplayCapabilities, MatrixDriver};

/// Writes every frame to a PNG, replacing the previous one.
///
/// Brightness is applied as a straight scale of the RGB values so the
/// snapshot looks roughly like the dimmed panel.
#[derive(Debug)]
pub struct FileDriver {
    capabilities: DisplayCapabilities,
    output: PathBuf,
    brightness: u8,
}

impl FileDriver {
    pub fn new(output: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        FileDriver {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_brightness: true,
                name: "file",
            },
            output: output.into(),
            brightness: 100,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn write(&self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        let mut img = frame.as_image().clone();
        if self.brightness < 100 {
            let scale = self.brightness as u16;
            for p in img.pixels_mut() {
                for c in p.0.iter_mut() {
                    *c = ((*c as u16 * scale) / 100) as u8;
                }
            }
        }
        img.save_with_format(&self.output, ImageFormat::Png)?;
        debug!("Frame written to {}", self.output.display());
        Ok(())
    }
}

impl MatrixDriver for FileDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        if let Some(dir) = self.output.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(DisplayError::InitializationFailed(format!(
                    "output directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        if !(1..=100).contains(&value) {
            return Err(DisplayError::InvalidBrightness(value));
        }
        self.brightness = value;
        Ok(())
    }

    fn update(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        check_frame_size(&*self, frame)?;
        self.write(frame)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let (w, h) = self.dimensions();
        self.write(&DisplayFrame::blank(w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_file_driver_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("panel.png");
        let mut driver = FileDriver::new(&out, 4, 4);
        driver.init().unwrap();

        let mut img = RgbImage::new(4, 4);
        img.put_pixel(0, 0, Rgb([200, 100, 50]));
        driver.update(&DisplayFrame::from(img)).unwrap();

        let back = image::open(&out).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (4, 4));
        assert_eq!(back.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn test_file_driver_applies_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("panel.png");
        let mut driver = FileDriver::new(&out, 1, 1);
        driver.set_brightness(50).unwrap();
        driver.update(&DisplayFrame::from(RgbImage::from_pixel(1, 1, Rgb([200, 100, 50])))).unwrap();
        let back = image::open(&out).unwrap().to_rgb8();
        assert_eq!(back.get_pixel(0, 0).0, [100, 50, 25]);
    }

    #[test]
    fn test_file_driver_missing_directory() {
        let mut driver = FileDriver::new("/no/such/dir/panel.png", 4, 4);
        assert!(matches!(driver.init(), Err(DisplayError::InitializationFailed(_))));
    }
}
