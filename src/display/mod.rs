/*
 *  display/mod.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - panel drivers, shared lock and the render sink
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod factory;

// Cross-process panel lock
pub mod lock;

// Panel drivers (hardware driver behind the `hardware` feature)
pub mod drivers;

// Render sink
pub mod manager;

// Re-exports for convenience
pub use traits::{DisplayCapabilities, MatrixDriver};
pub use error::DisplayError;
pub use framebuffer::DisplayFrame;
pub use factory::{create_driver, BoxedDriver};
pub use lock::{PanelGuard, PanelLock};
pub use manager::{DisplaySink, RenderMetrics, SharedSink};
