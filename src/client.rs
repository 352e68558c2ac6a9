//! Blocking HTTP client for driving a remote agent with the local judge.

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;

use crate::judge::Player;
use crate::protocol::{GameRequest, GameResponse};

pub static BLOCKING_CLIENT: Lazy<reqwest::blocking::Client> = Lazy::new(|| {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build blocking reqwest client")
});

/// A Fog of Wall agent reachable at `base_url`, e.g. `http://localhost:8080`.
pub struct HttpPlayer {
    url: String,
}

impl HttpPlayer {
    pub fn new(base_url: &str) -> Self {
        Self {
            url: format!("{}/fog-of-wall", base_url.trim_end_matches('/')),
        }
    }
}

impl Player for HttpPlayer {
    fn respond(&mut self, req: &GameRequest) -> Result<GameResponse> {
        let res = BLOCKING_CLIENT
            .post(&self.url)
            .json(req)
            .send()
            .with_context(|| format!("Failed to POST {}", self.url))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            bail!("{} returned {}: {}", self.url, status, body);
        }

        res.json().context("Failed to parse game response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url() {
        assert_eq!(
            HttpPlayer::new("http://localhost:8080/").url,
            "http://localhost:8080/fog-of-wall"
        );
        assert_eq!(
            HttpPlayer::new("http://a:1").url,
            "http://a:1/fog-of-wall"
        );
    }
}
