/*
 *  http.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Shared reqwest client and response helpers
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

use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::NetworkError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Creates the client every component shares: identifying user agent and
/// timeouts generous enough for a slow CDN on a Pi over wifi.
pub fn build_client() -> Result<Client, NetworkError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into `NetworkError::Status`, keeping a short detail
/// from the body when the server sent one.
pub async fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(NetworkError::Status { status, url, detail: error_detail(&body) })
}

/// Read the body and decode JSON, reporting which endpoint sent garbage.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, NetworkError> {
    let url = response.url().to_string();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|source| NetworkError::Decode { url, source })
}

/// Pull `error`/`error_description` (OAuth) or `error.message` (Web API) out of a body.
fn error_detail(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("error")? {
        serde_json::Value::String(code) => {
            match v.get("error_description").and_then(|d| d.as_str()) {
                Some(desc) => Some(format!("{code}: {desc}")),
                None => Some(code.clone()),
            }
        }
        obj => obj.get("message").and_then(|m| m.as_str()).map(str::to_string),
    }
}
