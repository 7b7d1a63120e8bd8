use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::models::{BoundingBox, SearchTarget};

/// Login entry point; redirects to the challenge URL with a fresh login_challenge.
const DEFAULT_LOGIN_URL: &str = "https://messervices.etudiant.gouv.fr/oauth2/login";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 350;

pub const SEARCH_BASE_URL: &str = "https://trouverunlogement.lescrous.fr/tools/42/search";

/// Lyon area.
const LYON_BOUNDS: BoundingBox = BoundingBox {
    west: 4.679270004578094,
    north: 45.940645781504905,
    east: 5.063104843445282,
    south: 45.5231871493864,
};

/// Process configuration, loaded once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub login_url: String,
    pub crous_email: String,
    pub crous_password: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub poll_interval_secs: u64,
    pub headless: bool,
    pub max_price: Option<f64>,
    pub colocative_only: bool,
    pub notify_when_no_results: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            login_url: env::var("CROUS_LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string()),
            crous_email: env::var("CROUS_EMAIL").context("CROUS_EMAIL must be set")?,
            crous_password: env::var("CROUS_PASSWORD").context("CROUS_PASSWORD must be set")?,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .context("TELEGRAM_CHAT_ID must be set")?,
            poll_interval_secs: match env::var("POLL_INTERVAL_SECONDS") {
                Ok(v) => v
                    .parse()
                    .context("POLL_INTERVAL_SECONDS must be a valid number")?,
                Err(_) => DEFAULT_POLL_INTERVAL_SECS,
            },
            headless: env_flag("HEADLESS", true),
            max_price: match env::var("MAX_PRICE") {
                Ok(v) => Some(v.parse().context("MAX_PRICE must be a valid number")?),
                Err(_) => None,
            },
            colocative_only: env_flag("COLOCATIVE_ONLY", false),
            notify_when_no_results: env_flag("NOTIFY_WHEN_NO_RESULTS", false),
        })
    }

    /// Static monitoring targets; one per recipient.
    pub fn search_targets(&self) -> Vec<SearchTarget> {
        vec![SearchTarget {
            title: "Me".to_string(),
            telegram_id: self.telegram_chat_id.clone(),
            search_url: search_url(&LYON_BOUNDS),
            ignored_ids: vec![2755],
            max_price: self.max_price,
            colocative_only: self.colocative_only,
        }]
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => !matches!(v.as_str(), "false" | "0" | "no" | ""),
        Err(_) => default,
    }
}

pub fn search_url(bounds: &BoundingBox) -> String {
    format!("{}?bounds={}", SEARCH_BASE_URL, bounds.bounds_param())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_embeds_bounds_parameter() {
        let bbox = BoundingBox {
            west: 1.0,
            north: 2.0,
            east: 3.0,
            south: 4.0,
        };
        assert_eq!(
            search_url(&bbox),
            "https://trouverunlogement.lescrous.fr/tools/42/search?bounds=1_2_3_4"
        );
    }
}
