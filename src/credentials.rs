/*
 *  credentials.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Durable client identity and token record
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

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::auth::TokenPair;
use crate::config::ConfigError;

/// The record `spotipi-auth` creates and the token manager keeps current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Credentials {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
            redirect_uri: redirect_uri.trim().to_string(),
            access_token: None,
            refresh_token: None,
        }
    }

    /// Store a freshly issued pair. A pair without a refresh token keeps the one we have.
    pub fn apply(&mut self, pair: TokenPair) {
        self.access_token = Some(pair.access_token);
        if let Some(rt) = pair.refresh_token.filter(|rt| !rt.is_empty()) {
            self.refresh_token = Some(rt);
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("credential record is missing {key}")));
            }
        }
        Ok(())
    }
}

/// JSON file backed credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed a new record with client identity only, replacing anything there.
    pub fn create(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<Credentials, ConfigError> {
        let creds = Credentials::new(client_id, client_secret, redirect_uri);
        creds.validate()?;
        self.persist(&creds)?;
        info!("Credential record '{}' created", self.path.display());
        Ok(creds)
    }

    pub fn load(&self) -> Result<Credentials, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let creds: Credentials = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;
        creds.validate()?;
        debug!("Loaded credentials for client {}", creds.client_id);
        Ok(creds)
    }

    /// Write-new-then-replace: the record on disk is either the old or the new one.
    pub fn persist(&self, creds: &Credentials) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io { path: self.path.clone(), source };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let body = serde_json::to_string_pretty(creds).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!("Credential record '{}' updated", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("spotify_config.json"))
    }

    #[test]
    fn test_persist_then_load_keeps_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut creds = store.create("id", "secret", "http://localhost/cb").unwrap();
        creds.apply(TokenPair {
            access_token: "acc-1".into(),
            refresh_token: Some("ref-1".into()),
        });
        store.persist(&creds).unwrap();

        let back = store.load().unwrap();
        assert_eq!(back.access_token(), Some("acc-1"));
        assert_eq!(back.refresh_token(), Some("ref-1"));
        assert_eq!(back, creds);
    }

    #[test]
    fn test_apply_without_rotation_keeps_refresh_token() {
        let mut creds = Credentials::new("id", "secret", "uri");
        creds.refresh_token = Some("keep-me".into());
        creds.apply(TokenPair { access_token: "new".into(), refresh_token: None });
        assert_eq!(creds.refresh_token(), Some("keep-me"));

        creds.apply(TokenPair { access_token: "newer".into(), refresh_token: Some(String::new()) });
        assert_eq!(creds.refresh_token(), Some("keep-me"));
        assert_eq!(creds.access_token(), Some("newer"));
    }

    #[test]
    fn test_load_reads_spotify_config_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{
    "client_id": "abc",
    "client_secret": "def",
    "redirect_uri": "http://localhost:8888/callback",
    "access_token": "tok",
    "refresh_token": "ref"
}"#,
        )
        .unwrap();
        let creds = store.load().unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(creds.access_token(), Some("tok"));
    }

    #[test]
    fn test_missing_record_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(store_in(&dir).load(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_record_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Json { .. })));

        fs::write(store.path(), r#"{"client_id":"","client_secret":"s","redirect_uri":"u"}"#).unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_persist_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create("id", "secret", "uri").unwrap();
        store.create("id2", "secret", "uri").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load().unwrap().client_id, "id2");
    }
}
