/*
 *  display/error.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the display subsystem
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

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Unified error type for all panel operations
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Unsupported operation for this driver
    UnsupportedOperation,

    /// Brightness outside 1..=100
    InvalidBrightness(u8),

    /// Frame does not match the panel geometry
    FrameSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// The driver refused the frame
    UpdateFailed(String),

    /// Shared panel lock could not be taken or released
    Lock { path: PathBuf, source: std::io::Error },

    /// Gave up waiting for another process to release the panel
    LockTimeout { path: PathBuf, waited: Duration },

    /// I/O on a file backed driver
    Io(std::io::Error),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::UnsupportedOperation =>
                write!(f, "Operation not supported by this display"),
            DisplayError::InvalidBrightness(b) =>
                write!(f, "Invalid brightness: {} (must be 1-100)", b),
            DisplayError::FrameSizeMismatch { expected, actual } =>
                write!(f, "Frame size mismatch: panel is {}x{}, frame is {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::UpdateFailed(msg) =>
                write!(f, "Panel update failed: {}", msg),
            DisplayError::Lock { path, source } =>
                write!(f, "Panel lock {} failed: {}", path.display(), source),
            DisplayError::LockTimeout { path, waited } =>
                write!(f, "Panel lock {} still held after {}ms", path.display(), waited.as_millis()),
            DisplayError::Io(err) =>
                write!(f, "Display I/O error: {}", err),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Lock { source, .. } => Some(source),
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

impl From<image::ImageError> for DisplayError {
    fn from(err: image::ImageError) -> Self {
        DisplayError::UpdateFailed(err.to_string())
    }
}
