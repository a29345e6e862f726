/*
 *  artwork.rs
 *
 *  SpotiPi - album art on the matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *  Artwork fetch and letterbox scaling to the panel
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

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use log::debug;
use reqwest::Client;
use thiserror::Error;

use crate::display::DisplayFrame;
use crate::error::NetworkError;
use crate::http::{build_client, ensure_success};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("artwork download failed: {0}")]
    Network(#[from] NetworkError),
    #[error("artwork from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("artwork worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(NetworkError::Transport(err))
    }
}

pub struct ArtworkPipeline {
    client: Client,
}

impl ArtworkPipeline {
    pub fn new() -> Result<Self, NetworkError> {
        Ok(Self::with_client(build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        ArtworkPipeline { client }
    }

    /// Download the raw artwork bytes; any non-2xx is a failure.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes of artwork from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Download, decode and letterbox into a panel sized frame.
    ///
    /// Decode and resample run on the blocking pool; Lanczos on a 640px cover
    /// is slow enough on a Pi Zero to stall the runtime.
    pub async fn fetch_frame(&self, url: &str, width: u32, height: u32) -> Result<DisplayFrame, FetchError> {
        let bytes = self.fetch_bytes(url).await?;
        let url = url.to_string();
        let frame = tokio::task::spawn_blocking(move || {
            decode(&url, &bytes).map(|img| resize(&img, width, height))
        })
        .await??;
        Ok(frame)
    }
}

fn decode(url: &str, bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    image::load_from_memory(bytes).map_err(|source| FetchError::Decode { url: url.to_string(), source })
}

/// Scale `image` to fit inside `width` x `height` keeping its aspect ratio,
/// centred on black. The result is always exactly the target size and RGB.
///
/// Input already at the target size is passed through untouched.
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> DisplayFrame {
    let (iw, ih) = (image.width(), image.height());
    if (iw, ih) == (width, height) {
        return DisplayFrame::from(image.to_rgb8());
    }

    let mut canvas = RgbImage::new(width, height);
    if iw == 0 || ih == 0 || width == 0 || height == 0 {
        return DisplayFrame::from(canvas);
    }

    let (new_w, new_h) = fit_within(iw, ih, width, height);
    let scaled = imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Lanczos3);

    let x = (width - new_w) / 2;
    let y = (height - new_h) / 2;
    imageops::replace(&mut canvas, &scaled, i64::from(x), i64::from(y));
    DisplayFrame::from(canvas)
}

/// Largest (w, h) with the source aspect that fits the target box.
fn fit_within(iw: u32, ih: u32, tw: u32, th: u32) -> (u32, u32) {
    let (iw, ih, tw, th) = (u64::from(iw), u64::from(ih), u64::from(tw), u64::from(th));
    // compare iw/ih against tw/th without floats
    let (w, h) = if iw * th > tw * ih {
        (tw, tw * ih / iw)
    } else {
        (th * iw / ih, th)
    };
    (w.clamp(1, tw) as u32, h.clamp(1, th) as u32)
}
