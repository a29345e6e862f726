/*
 *  bin/spotipi-auth.rs
 *
 *  SpotiPi credential bootstrap
 *
 *  (c) 2020-26 Stuart Hunter
 *
 *  One-time interactive setup: seeds the credential record, walks the operator
 *  through the authorization-code grant and stores the resulting tokens.
 *
 *  Usage:
 *    spotipi-auth
 *    spotipi-auth --credentials /etc/spotipi/spotify_config.json
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, ValueHint};
use env_logger::Env;
use log::info;

use spotipi::auth::{extract_code, TokenManager};
use spotipi::build_info::BUILD_DATE;
use spotipi::config::{self, Cli};
use spotipi::credentials::CredentialStore;

const REFRESH_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "spotipi-auth", version, about = "Authorize SpotiPi against your Spotify account")]
struct AuthCli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    /// Where to write the credential record
    #[arg(long, value_hint = ValueHint::FilePath)]
    credentials: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long = "debug", short = 'v', action = ArgAction::SetTrue)]
    debug: bool,
}

fn prompt(stdin: &mut impl BufRead, label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        bail!("input closed before '{}' was answered", label.trim_end_matches([':', ' ']));
    }
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AuthCli::parse();
    let cli = Cli {
        config: args.config,
        credentials: args.credentials,
        debug: args.debug,
        ..Cli::default()
    };
    let (_, settings) = config::load(&cli).context("loading configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .format_timestamp_secs()
        .init();
    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    println!("Welcome to the SpotiPi Spotify API setup.");
    let mut stdin = io::stdin().lock();
    let client_id = prompt(&mut stdin, "Enter your Spotify API client ID: ")?;
    let client_secret = prompt(&mut stdin, "Enter your Spotify API client secret: ")?;
    let redirect_uri = prompt(&mut stdin, "Enter your redirect URI: ")?;

    let store = CredentialStore::new(&settings.credentials);
    let mut creds = store
        .create(&client_id, &client_secret, &redirect_uri)
        .context("writing the credential record")?;
    println!("Configuration file '{}' has been created.", store.path().display());

    let tokens = TokenManager::new(&settings.accounts_url)?;
    let auth_url = tokens.authorization_url(&creds.client_id, &creds.redirect_uri, &settings.scope)?;
    println!("Please go to this URL and authorize the app:\n{auth_url}");

    let redirected = prompt(&mut stdin, "Enter the full redirected URL: ")?;
    let code = extract_code(&redirected)?;

    let pair = tokens
        .exchange_code(&creds.client_id, &creds.client_secret, &creds.redirect_uri, &code)
        .await
        .context("exchanging the authorization code")?;
    creds.apply(pair);
    store.persist(&creds)?;
    println!("Access and refresh tokens saved.");

    // prove the refresh token works before the loop depends on it
    println!("Waiting {} seconds before refreshing the token...", REFRESH_DELAY.as_secs());
    tokio::time::sleep(REFRESH_DELAY).await;
    tokens
        .refresh_and_persist(&mut creds, &store)
        .await
        .context("refreshing the access token")?;
    println!("Token refreshed. SpotiPi is ready, start the spotipi service.");
    Ok(())
}
