/*
 *  nowplaying.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Currently-playing poll and artwork change detection
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

use log::debug;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::error::NetworkError;
use crate::http::{build_client, ensure_success};

#[derive(Debug, Error)]
pub enum NowPlayingError {
    /// 401, the access token expired or was revoked
    #[error("access token rejected by the now-playing endpoint")]
    Unauthorized,
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl From<reqwest::Error> for NowPlayingError {
    fn from(err: reqwest::Error) -> Self {
        NowPlayingError::Network(NetworkError::Transport(err))
    }
}

/// What we keep of a currently-playing response. The artwork URL is the
/// track identity: two tracks sharing a cover are the same as far as the panel cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub artwork_url: String,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    item: Option<PlayingItem>,
    #[serde(default)]
    currently_playing_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    #[serde(default)]
    name: Option<String>,
    // tracks
    album: Option<Album>,
    // podcast episodes carry images directly
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl CurrentlyPlaying {
    /// First image is the largest one, the provider orders them widest first.
    fn into_snapshot(self) -> Option<TrackSnapshot> {
        let item = self.item?;
        let images = match item.album {
            Some(album) if !album.images.is_empty() => album.images,
            _ => item.images,
        };
        match images.into_iter().next() {
            Some(img) if !img.url.is_empty() => Some(TrackSnapshot { artwork_url: img.url }),
            _ => {
                debug!(
                    "Playing {} '{}' has no artwork",
                    self.currently_playing_type.as_deref().unwrap_or("item"),
                    item.name.as_deref().unwrap_or("?")
                );
                None
            }
        }
    }
}

/// Client for the "currently playing" Web API endpoint.
#[derive(Debug, Clone)]
pub struct NowPlayingClient {
    client: Client,
    endpoint: String,
}

impl NowPlayingClient {
    pub fn new(api_url: &str) -> Result<Self, NetworkError> {
        Ok(Self::with_client(build_client()?, api_url))
    }

    pub fn with_client(client: Client, api_url: &str) -> Self {
        NowPlayingClient {
            client,
            endpoint: format!("{}/me/player/currently-playing", api_url.trim_end_matches('/')),
        }
    }

    /// `Ok(None)` when nothing is playing (204, empty body or no item).
    pub async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<TrackSnapshot>, NowPlayingError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("additional_types", "track,episode")])
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(NowPlayingError::Unauthorized),
            _ => {}
        }
        let response = ensure_success(response).await?;
        let url = response.url().to_string();
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let playing: CurrentlyPlaying = serde_json::from_str(&body)
            .map_err(|source| NetworkError::Decode { url, source })?;
        Ok(playing.into_snapshot())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ObserverState {
    /// nothing rendered yet
    #[default]
    Idle,
    /// artwork URL of the last frame that made it onto the panel
    Tracking(String),
}

/// Emitted when the playing artwork differs from what the panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackChange {
    pub artwork_url: String,
}

/// Change detection over successive polls.
///
/// `observe` is side-effect free; the state only moves on `confirm`, which the
/// loop calls once the frame is on the panel. A failed fetch or render therefore
/// leaves the previous URL in place and the same track is retried next tick.
#[derive(Debug, Default)]
pub struct TrackObserver {
    state: ObserverState,
}

impl TrackObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ObserverState {
        &self.state
    }

    pub fn last_artwork_url(&self) -> Option<&str> {
        match &self.state {
            ObserverState::Idle => None,
            ObserverState::Tracking(url) => Some(url),
        }
    }

    pub fn observe(&self, snapshot: Option<&TrackSnapshot>) -> Option<TrackChange> {
        let snapshot = snapshot?;
        if self.last_artwork_url() == Some(snapshot.artwork_url.as_str()) {
            return None;
        }
        Some(TrackChange { artwork_url: snapshot.artwork_url.clone() })
    }

    pub fn confirm(&mut self, change: TrackChange) {
        self.state = ObserverState::Tracking(change.artwork_url);
    }
}
