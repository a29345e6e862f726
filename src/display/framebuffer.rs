/*
 *  display/framebuffer.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Finished, panel sized RGB frames
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

use image::{Rgb, RgbImage};

/// A full-color frame at the panel's native resolution.
///
/// Immutable once built; the sink takes it by value on render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pixels: RgbImage,
}

impl DisplayFrame {
    /// Solid black frame
    pub fn blank(width: u32, height: u32) -> Self {
        DisplayFrame { pixels: RgbImage::new(width, height) }
    }

    pub fn width(&self) -> u32 { self.pixels.width() }
    pub fn height(&self) -> u32 { self.pixels.height() }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// RGB triple at (x, y); None outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Row-major RGB888 bytes, three per pixel
    pub fn pixel_data(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Iterate (x, y, rgb) for drivers that set pixels one at a time
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (u32, u32, [u8; 3])> + '_ {
        self.pixels.enumerate_pixels().map(|(x, y, p)| (x, y, p.0))
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbImage {
        self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| *p == Rgb([0, 0, 0]))
    }
}

impl From<RgbImage> for DisplayFrame {
    fn from(pixels: RgbImage) -> Self {
        DisplayFrame { pixels }
    }
}
