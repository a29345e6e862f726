/*
 *  main.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use tokio::signal::unix::{signal, SignalKind};

/// Upper bound on waiting for the panel when blanking it on the way out
const SHUTDOWN_CLEAR_TIMEOUT: Duration = Duration::from_secs(2);

use std::time::Duration;

use spotipi::build_info::{BUILD_DATE, BUILD_PROFILE};
use spotipi::config::{self, Cli};
use spotipi::credentials::CredentialStore;
use spotipi::display::{self, DisplaySink, PanelLock};
use spotipi::sync::NowPlayingSync;

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
/// Once a signal is caught it logs the event and returns, allowing for
/// graceful shutdown.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    let cli = Cli::parse();
    let (merged, settings) = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&merged)?);
        return Ok(());
    }

    // Initialize the logger, RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .format_timestamp_secs()
        .init();

    info!("This {} mirrors what's playing", env!("CARGO_PKG_NAME"));
    info!("v.{} built {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_PROFILE);

    // no credentials, no loop
    let store = CredentialStore::new(&settings.credentials);
    let credentials = store
        .load()
        .with_context(|| format!("run spotipi-auth first to create {}", settings.credentials.display()))?;
    info!("Credentials loaded from {}", store.path().display());

    let driver = display::create_driver(&settings.panel)?;
    let mut sink = DisplaySink::new(driver, PanelLock::new(&settings.lock_path));
    sink.init(settings.panel.brightness())?;
    let sink = sink.into_shared();

    let mut sync = NowPlayingSync::new(&settings, store, credentials, sink.clone())?;

    tokio::select! {
        _ = sync.run() => {}
        res = signal_handler() => {
            if let Err(e) = res {
                error!("Signal handler failed: {}", e);
            }
        }
    }

    info!("Clearing panel");
    if let Err(e) = sink.lock().await.clear_within(SHUTDOWN_CLEAR_TIMEOUT).await {
        warn!("Failed to clear panel on shutdown: {}", e);
    }
    info!("Shutdown complete.");
    Ok(())
}
