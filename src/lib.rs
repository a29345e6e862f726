/*
 *  lib.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Library root shared by the loop and the auth bootstrap
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

pub mod artwork;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod display;
pub mod error;
pub mod http;
pub mod nowplaying;
pub mod sync;

pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/build_info.rs"));
}

pub use error::{Result, SpotiPiError};
