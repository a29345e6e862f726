/*
 *  sync.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Poll, compare, fetch, render - the now-playing loop
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

use log::{debug, error, info, warn};
use std::time::Duration;

use crate::artwork::ArtworkPipeline;
use crate::auth::TokenManager;
use crate::config::Settings;
use crate::credentials::{CredentialStore, Credentials};
use crate::display::SharedSink;
use crate::error::{NetworkError, SpotiPiError};
use crate::http::build_client;
use crate::nowplaying::{NowPlayingClient, NowPlayingError, TrackObserver, TrackSnapshot};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// nothing playing, or a track without artwork
    NoContent,
    /// same artwork as the panel already shows
    Unchanged,
    /// new artwork is on the panel
    Rendered(String),
}

/// The long-running half: keeps the panel in step with whatever is playing.
///
/// One tick is poll, compare, fetch, resize, render. Ticks run back to back
/// with a fixed sleep in between and never overlap.
pub struct NowPlayingSync {
    tokens: TokenManager,
    now_playing: NowPlayingClient,
    artwork: ArtworkPipeline,
    store: CredentialStore,
    credentials: Credentials,
    observer: TrackObserver,
    sink: SharedSink,
    interval: Duration,
}

impl NowPlayingSync {
    pub fn new(
        settings: &Settings,
        store: CredentialStore,
        credentials: Credentials,
        sink: SharedSink,
    ) -> Result<Self, NetworkError> {
        let client = build_client()?;
        Ok(NowPlayingSync {
            tokens: TokenManager::with_client(client.clone(), &settings.accounts_url),
            now_playing: NowPlayingClient::with_client(client.clone(), &settings.api_url),
            artwork: ArtworkPipeline::with_client(client),
            store,
            credentials,
            observer: TrackObserver::new(),
            sink,
            interval: settings.poll_interval,
        })
    }

    pub fn observer(&self) -> &TrackObserver {
        &self.observer
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Poll forever. Per-tick failures are logged and the next tick tries again.
    pub async fn run(&mut self) {
        info!("Polling now playing every {}s", self.interval.as_secs_f32());
        loop {
            match self.tick().await {
                Ok(TickOutcome::Rendered(url)) => info!("Panel now showing {}", url),
                Ok(TickOutcome::Unchanged) => debug!("Artwork unchanged"),
                Ok(TickOutcome::NoContent) => debug!("Nothing playing"),
                Err(SpotiPiError::Auth(e)) => error!("Authorization failed: {}", e),
                Err(e) => warn!("Tick failed: {}", e),
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass of the loop.
    ///
    /// The observer only advances after the frame reached the panel, so a failed
    /// fetch or render leaves the last shown URL in place.
    pub async fn tick(&mut self) -> Result<TickOutcome, SpotiPiError> {
        let Some(snapshot) = self.poll().await? else {
            return Ok(TickOutcome::NoContent);
        };
        let Some(change) = self.observer.observe(Some(&snapshot)) else {
            return Ok(TickOutcome::Unchanged);
        };
        info!("Artwork changed: {}", change.artwork_url);

        let (width, height) = self.sink.lock().await.dimensions();
        let frame = self.artwork.fetch_frame(&change.artwork_url, width, height).await?;
        self.sink.lock().await.render(frame).await?;

        let url = change.artwork_url.clone();
        self.observer.confirm(change);
        Ok(TickOutcome::Rendered(url))
    }

    /// Currently playing, refreshing the access token once if it is rejected.
    async fn poll(&mut self) -> Result<Option<TrackSnapshot>, SpotiPiError> {
        match self.poll_once().await {
            Err(NowPlayingError::Unauthorized) => {
                warn!("Access token rejected, refreshing");
                self.tokens.refresh_and_persist(&mut self.credentials, &self.store).await?;
                info!("Access token refreshed and saved to {}", self.store.path().display());
                Ok(self.poll_once().await?)
            }
            other => Ok(other?),
        }
    }

    async fn poll_once(&self) -> Result<Option<TrackSnapshot>, NowPlayingError> {
        match self.credentials.access_token() {
            Some(token) => self.now_playing.currently_playing(token).await,
            // first run after a bootstrap that never got a token
            None => Err(NowPlayingError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::display::drivers::mock::MockDriver;
    use crate::display::{DisplaySink, PanelLock};
    use crate::nowplaying::ObserverState;

    #[tokio::test]
    async fn test_missing_tokens_surface_as_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("spotify_config.json"));
        let creds = Credentials::new("id", "secret", "http://localhost/callback");
        let mock = MockDriver::new(8, 8);
        let sink = DisplaySink::new(Box::new(mock.clone()), PanelLock::new(dir.path().join("p.lock")));

        // unroutable on purpose, no request is made without a refresh token
        let settings = Settings {
            accounts_url: "http://127.0.0.1:9".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let mut sync = NowPlayingSync::new(&settings, store, creds, sink.into_shared()).unwrap();

        let err = sync.tick().await.unwrap_err();
        assert!(matches!(err, SpotiPiError::Auth(AuthError::NoRefreshToken)));
        assert_eq!(sync.observer().state(), &ObserverState::Idle);
        assert_eq!(mock.frame_count(), 0);
    }
}
