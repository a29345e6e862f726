/*
 *  display/drivers/mod.rs
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

// Real panel, needs the C library so it is behind a feature
#[cfg(feature = "hardware")]
pub mod matrix;

pub mod file;
pub mod null;

// Mock driver, public so the integration tests can drive the loop
pub mod mock;
