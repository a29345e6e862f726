/*
 *  config.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Application configuration: defaults, YAML file, CLI overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

pub const DEFAULT_CREDENTIALS: &str = "spotify_config.json";
pub const DEFAULT_LOCK_PATH: &str = "/tmp/spotipi-matrix.lock";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPE: &str = "user-read-currently-playing";
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Error type for config loading/validation, shared with the credential record.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration as read from YAML. Every field is optional so files
/// and CLI flags layer over each other; `Settings` is the resolved form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub credentials: Option<PathBuf>,  // JSON credential record
    pub poll_interval_secs: Option<u64>,
    pub lock_path: Option<PathBuf>,
    pub accounts_url: Option<String>,
    pub api_url: Option<String>,
    pub scope: Option<String>,
    pub panel: Option<PanelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelConfig {
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub chain_length: Option<u32>,
    pub parallel: Option<u32>,
    pub hardware_mapping: Option<String>, // e.g. "adafruit-hat", "regular"
    pub brightness: Option<u8>,           // percent, 1-100
    pub driver: Option<DriverKind>,
    pub output: Option<PathBuf>,          // only for the file driver
}

impl PanelConfig {
    pub fn rows(&self) -> u32 { self.rows.unwrap_or(64) }
    pub fn cols(&self) -> u32 { self.cols.unwrap_or(64) }
    pub fn chain_length(&self) -> u32 { self.chain_length.unwrap_or(1) }
    pub fn parallel(&self) -> u32 { self.parallel.unwrap_or(1) }
    pub fn brightness(&self) -> u8 { self.brightness.unwrap_or(80) }
    pub fn driver(&self) -> DriverKind { self.driver.clone().unwrap_or_default() }

    pub fn hardware_mapping(&self) -> &str {
        self.hardware_mapping.as_deref().unwrap_or("adafruit-hat")
    }

    /// Pixel width of the whole chained canvas.
    pub fn width(&self) -> u32 { self.cols() * self.chain_length() }

    /// Pixel height of the whole canvas, parallel chains stack vertically.
    pub fn height(&self) -> u32 { self.rows() * self.parallel() }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// HUB75 panel through rpi-rgb-led-matrix (needs the `hardware` feature)
    #[default]
    Matrix,
    /// PNG snapshot of every frame, for headless boxes
    File,
    /// Frames are dropped
    Null,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "spotipi", version, about = "Spotify album art on an RGB LED matrix")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long = "debug", short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Path to the JSON credential record written by spotipi-auth
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub credentials: Option<PathBuf>,
    /// Seconds between now-playing polls
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
    /// Lock file shared with other processes writing to the panel
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub lock_path: Option<PathBuf>,
    #[arg(long)]
    pub panel_rows: Option<u32>,
    #[arg(long)]
    pub panel_cols: Option<u32>,
    #[arg(long)]
    pub panel_brightness: Option<u8>,
    #[arg(long, value_parser = parse_driver)]
    pub panel_driver: Option<DriverKind>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub panel_output: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

fn parse_driver(s: &str) -> Result<DriverKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "matrix" => Ok(DriverKind::Matrix),
        "file" => Ok(DriverKind::File),
        "null" => Ok(DriverKind::Null),
        other => Err(format!("unknown panel driver '{other}' (matrix|file|null)")),
    }
}

/// Fully resolved configuration handed to each component at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: String,
    pub credentials: PathBuf,
    pub poll_interval: Duration,
    pub lock_path: PathBuf,
    pub accounts_url: String,
    pub api_url: String,
    pub scope: String,
    pub panel: PanelConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_config(Config::default())
    }
}

impl Settings {
    pub fn from_config(cfg: Config) -> Self {
        Settings {
            log_level: cfg.log_level.unwrap_or_else(|| "info".to_string()),
            credentials: cfg.credentials.unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS)),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs.unwrap_or(DEFAULT_POLL_SECS)),
            lock_path: cfg.lock_path.unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_PATH)),
            accounts_url: cfg.accounts_url.unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            api_url: cfg.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            scope: cfg.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            panel: cfg.panel.unwrap_or_default(),
        }
    }
}

/// Public entry point: read YAML, merge CLI, validate.
///
/// Returns the merged `Config` alongside the resolved `Settings` so the caller
/// can honour `--dump-config`.
pub fn load(cli: &Cli) -> Result<(Config, Settings), ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok((cfg.clone(), Settings::from_config(cfg)))
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/spotipi/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/spotipi.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["spotipi.yaml", "config/spotipi.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.credentials.is_some()        { dst.credentials = src.credentials; }
    if src.poll_interval_secs.is_some() { dst.poll_interval_secs = src.poll_interval_secs; }
    if src.lock_path.is_some()          { dst.lock_path = src.lock_path; }
    if src.accounts_url.is_some()       { dst.accounts_url = src.accounts_url; }
    if src.api_url.is_some()            { dst.api_url = src.api_url; }
    if src.scope.is_some()              { dst.scope = src.scope; }
    match (&mut dst.panel, src.panel) {
        (None, Some(p)) => dst.panel = Some(p),
        (Some(d), Some(s)) => merge_panel(d, s),
        _ => {}
    }
}

fn merge_panel(dst: &mut PanelConfig, src: PanelConfig) {
    if src.rows.is_some()             { dst.rows = src.rows; }
    if src.cols.is_some()             { dst.cols = src.cols; }
    if src.chain_length.is_some()     { dst.chain_length = src.chain_length; }
    if src.parallel.is_some()         { dst.parallel = src.parallel; }
    if src.hardware_mapping.is_some() { dst.hardware_mapping = src.hardware_mapping; }
    if src.brightness.is_some()       { dst.brightness = src.brightness; }
    if src.driver.is_some()           { dst.driver = src.driver; }
    if src.output.is_some()           { dst.output = src.output; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()          { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                        { cfg.log_level = Some("debug".to_string()); }
    if cli.credentials.is_some()        { cfg.credentials = cli.credentials.clone(); }
    if cli.poll_interval_secs.is_some() { cfg.poll_interval_secs = cli.poll_interval_secs; }
    if cli.lock_path.is_some()          { cfg.lock_path = cli.lock_path.clone(); }

    let any_panel = cli.panel_rows.is_some()
        || cli.panel_cols.is_some()
        || cli.panel_brightness.is_some()
        || cli.panel_driver.is_some()
        || cli.panel_output.is_some();

    if any_panel && cfg.panel.is_none() {
        cfg.panel = Some(PanelConfig::default());
    }
    if let Some(panel) = cfg.panel.as_mut() {
        if cli.panel_rows.is_some()       { panel.rows = cli.panel_rows; }
        if cli.panel_cols.is_some()       { panel.cols = cli.panel_cols; }
        if cli.panel_brightness.is_some() { panel.brightness = cli.panel_brightness; }
        if cli.panel_driver.is_some()     { panel.driver = cli.panel_driver.clone(); }
        if cli.panel_output.is_some()     { panel.output = cli.panel_output.clone(); }
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.poll_interval_secs == Some(0) {
        return Err(ConfigError::Validation("poll_interval_secs must be > 0".into()));
    }
    if let Some(panel) = cfg.panel.as_ref() {
        for (name, v) in [
            ("rows", panel.rows),
            ("cols", panel.cols),
            ("chain_length", panel.chain_length),
            ("parallel", panel.parallel),
        ] {
            if v == Some(0) {
                return Err(ConfigError::Validation(format!("panel {name} must be > 0")));
            }
        }
        if let Some(b) = panel.brightness {
            if !(1..=100).contains(&b) {
                return Err(ConfigError::Validation("panel brightness must be 1..=100".into()));
            }
        }
        if panel.driver == Some(DriverKind::File) && panel.output.is_none() {
            return Err(ConfigError::Validation("file driver requires panel output path".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_panel() {
        let s = Settings::default();
        assert_eq!(s.poll_interval, Duration::from_secs(5));
        assert_eq!(s.panel.width(), 64);
        assert_eq!(s.panel.height(), 64);
        assert_eq!(s.panel.brightness(), 80);
        assert_eq!(s.panel.hardware_mapping(), "adafruit-hat");
        assert_eq!(s.scope, "user-read-currently-playing");
        assert_eq!(s.credentials, PathBuf::from("spotify_config.json"));
    }

    #[test]
    fn test_yaml_then_cli_precedence() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "poll_interval_secs: 10\npanel:\n  rows: 32\n  cols: 32\n  chain_length: 2\n  brightness: 50\n"
        )
        .unwrap();

        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            panel_brightness: Some(30),
            ..Default::default()
        };
        let (_, s) = load(&cli).unwrap();
        assert_eq!(s.poll_interval, Duration::from_secs(10));
        assert_eq!(s.panel.width(), 64);
        assert_eq!(s.panel.height(), 32);
        assert_eq!(s.panel.brightness(), 30);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here.yaml")),
            ..Default::default()
        };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_zero_geometry() {
        let cfg = Config {
            panel: Some(PanelConfig { cols: Some(0), ..Default::default() }),
            ..Default::default()
        };
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_file_driver_needs_output() {
        let cfg = Config {
            panel: Some(PanelConfig { driver: Some(DriverKind::File), ..Default::default() }),
            ..Default::default()
        };
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_debug_flag_wins_over_yaml_level() {
        let mut cfg = Config { log_level: Some("warn".into()), ..Default::default() };
        let cli = Cli { debug: true, ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }
}
