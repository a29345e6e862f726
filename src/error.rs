/*
 *  error.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Top level error taxonomy
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

use reqwest::StatusCode;
use thiserror::Error;

pub use crate::artwork::FetchError;
pub use crate::auth::AuthError;
pub use crate::config::ConfigError;
pub use crate::display::DisplayError;
pub use crate::nowplaying::NowPlayingError;

/// Transport or status failure on any HTTP call.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        url: String,
        detail: Option<String>,
    },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum SpotiPiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Driver(#[from] DisplayError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<NowPlayingError> for SpotiPiError {
    fn from(err: NowPlayingError) -> Self {
        match err {
            NowPlayingError::Unauthorized => SpotiPiError::Auth(AuthError::Unauthorized),
            NowPlayingError::Network(e) => SpotiPiError::Network(e),
        }
    }
}

pub type Result<T, E = SpotiPiError> = std::result::Result<T, E>;
