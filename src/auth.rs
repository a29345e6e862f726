/*
 *  auth.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  OAuth2 authorization-code exchange and refresh
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

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::credentials::{CredentialStore, Credentials};
use crate::error::{NetworkError, SpotiPiError};
use crate::http::{build_client, decode_json, ensure_success};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid authorization input: {0}")]
    InvalidInput(String),
    #[error("authorization code not found in the redirected URL")]
    MissingCode,
    #[error("authorization was denied: {0}")]
    Denied(String),
    #[error("token response did not contain an access_token")]
    MissingAccessToken,
    #[error("no refresh token on record, run spotipi-auth again")]
    NoRefreshToken,
    #[error("access token still rejected after refresh")]
    Unauthorized,
}

/// Tokens issued by the token endpoint. `refresh_token` is only absent when the
/// provider chose not to send one on an authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// Talks to the accounts service. Cheap to clone, the reqwest client is shared.
#[derive(Debug, Clone)]
pub struct TokenManager {
    client: Client,
    accounts_url: String,
}

impl TokenManager {
    pub fn new(accounts_url: &str) -> Result<Self, NetworkError> {
        Ok(Self::with_client(build_client()?, accounts_url))
    }

    pub fn with_client(client: Client, accounts_url: &str) -> Self {
        TokenManager {
            client,
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
        }
    }

    /// The consent URL the operator opens in a browser. No network involved.
    pub fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
    ) -> Result<Url, AuthError> {
        if client_id.trim().is_empty() {
            return Err(AuthError::InvalidInput("client_id is empty".into()));
        }
        if redirect_uri.trim().is_empty() {
            return Err(AuthError::InvalidInput("redirect_uri is empty".into()));
        }
        let base = format!("{}/authorize", self.accounts_url);
        Url::parse_with_params(
            &base,
            &[
                ("response_type", "code"),
                ("client_id", client_id.trim()),
                ("redirect_uri", redirect_uri.trim()),
                ("scope", scope),
            ],
        )
        .map_err(|e| AuthError::InvalidInput(format!("{base}: {e}")))
    }

    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> Result<TokenPair, SpotiPiError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let (access_token, refresh_token) = self.token_request(client_id, client_secret, &form).await?;
        info!("Authorization code exchanged for tokens");
        Ok(TokenPair { access_token, refresh_token })
    }

    /// Refresh the access token. Providers may or may not rotate the refresh
    /// token; when they don't, the one we sent comes back in the pair.
    pub async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, SpotiPiError> {
        if refresh_token.is_empty() {
            return Err(AuthError::NoRefreshToken.into());
        }
        let form = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        let (access_token, rotated) = self.token_request(client_id, client_secret, &form).await?;
        debug!("Access token refreshed (refresh token rotated: {})", rotated.is_some());
        Ok(TokenPair {
            access_token,
            refresh_token: Some(rotated.unwrap_or_else(|| refresh_token.to_string())),
        })
    }

    /// Refresh using the record's own tokens, apply the result and write it back.
    pub async fn refresh_and_persist(
        &self,
        creds: &mut Credentials,
        store: &CredentialStore,
    ) -> Result<(), SpotiPiError> {
        let refresh = creds.refresh_token().ok_or(AuthError::NoRefreshToken)?.to_string();
        let pair = self
            .refresh_token(&creds.client_id, &creds.client_secret, &refresh)
            .await?;
        creds.apply(pair);
        store.persist(creds)?;
        Ok(())
    }

    async fn token_request(
        &self,
        client_id: &str,
        client_secret: &str,
        form: &[(&str, &str)],
    ) -> Result<(String, Option<String>), SpotiPiError> {
        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, basic_auth(client_id, client_secret))
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(NetworkError::from)?;
        let response = ensure_success(response).await?;
        let body: TokenResponse = decode_json(response).await?;

        if let Some(secs) = body.expires_in {
            debug!("Access token valid for {}s", secs);
        }
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;
        Ok((access_token, body.refresh_token.filter(|t| !t.is_empty())))
    }
}

/// `Basic base64(client_id:client_secret)`
pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

/// Pull the one-time `code` out of the URL the browser was redirected to.
pub fn extract_code(redirected_url: &str) -> Result<String, AuthError> {
    let url = Url::parse(redirected_url.trim())
        .map_err(|e| AuthError::InvalidInput(format!("redirected URL: {e}")))?;
    let mut code = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code" if !v.is_empty() => code = Some(v.into_owned()),
            "error" => return Err(AuthError::Denied(v.into_owned())),
            _ => {}
        }
    }
    code.ok_or(AuthError::MissingCode)
}
