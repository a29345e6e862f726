/*
 *  display/factory.rs
 *
 *  SpotiPi - album art on the matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Driver selection from configuration
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

use crate::config::{DriverKind, PanelConfig};
use crate::display::drivers::file::FileDriver;
use crate::display::drivers::null::NullDriver;
use crate::display::error::DisplayError;
use crate::display::traits::MatrixDriver;

#[cfg(feature = "hardware")]
use crate::display::drivers::matrix::MatrixHardwareDriver;

/// Type alias for boxed driver trait objects
pub type BoxedDriver = Box<dyn MatrixDriver>;

/// Create a panel driver from configuration
///
/// The driver is returned uninitialised; the sink calls `init()` and applies
/// brightness once it owns it.
///
/// ```ignore
/// let panel = PanelConfig { driver: Some(DriverKind::Null), ..Default::default() };
/// let driver = create_driver(&panel)?;
/// assert_eq!(driver.dimensions(), (64, 64));
/// ```
pub fn create_driver(panel: &PanelConfig) -> Result<BoxedDriver, DisplayError> {
    let (w, h) = (panel.width(), panel.height());
    let driver: BoxedDriver = match panel.driver() {
        DriverKind::Matrix => matrix_driver(panel)?,
        DriverKind::File => {
            let output = panel.output.as_ref().ok_or_else(|| {
                DisplayError::InvalidConfiguration("file driver requires an output path".to_string())
            })?;
            Box::new(FileDriver::new(output, w, h))
        }
        DriverKind::Null => Box::new(NullDriver::new(w, h)),
    };
    info!("Panel driver '{}' {}x{}", driver.capabilities().name, w, h);
    Ok(driver)
}

#[cfg(feature = "hardware")]
fn matrix_driver(panel: &PanelConfig) -> Result<BoxedDriver, DisplayError> {
    Ok(Box::new(MatrixHardwareDriver::new(panel)))
}

#[cfg(not(feature = "hardware"))]
fn matrix_driver(_panel: &PanelConfig) -> Result<BoxedDriver, DisplayError> {
    Err(DisplayError::InvalidConfiguration(
        "RGB matrix driver not enabled. Rebuild with --features hardware, or use the file/null driver".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_null_driver_from_config() {
        let panel = PanelConfig {
            driver: Some(DriverKind::Null),
            cols: Some(32),
            chain_length: Some(2),
            ..Default::default()
        };
        let driver = create_driver(&panel).unwrap();
        assert_eq!(driver.dimensions(), (64, 64));
        assert_eq!(driver.capabilities().name, "null");
    }

    #[test]
    fn test_file_driver_from_config() {
        let panel = PanelConfig {
            driver: Some(DriverKind::File),
            output: Some(PathBuf::from("/tmp/spotipi-test.png")),
            ..Default::default()
        };
        assert_eq!(create_driver(&panel).unwrap().capabilities().name, "file");
    }

    #[test]
    fn test_file_driver_without_output() {
        let panel = PanelConfig { driver: Some(DriverKind::File), ..Default::default() };
        assert!(matches!(create_driver(&panel), Err(DisplayError::InvalidConfiguration(_))));
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn test_matrix_driver_needs_feature() {
        assert!(create_driver(&PanelConfig::default()).is_err());
    }
}
