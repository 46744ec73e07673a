use anyhow::{Context, Result};
use regex::Regex;

pub const STORE_DETAILS_URL: &str = "https://play.google.com/store/apps/details";

pub fn extract_app_id(input: &str) -> Result<String> {
    let store_url_regex =
        Regex::new(r"play\.google\.com/store/apps/details\?id=([a-zA-Z0-9._]+)")
            .context("failed to compile store url regex")?;
    let trimmed = input.trim();

    Ok(store_url_regex
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| trimmed.to_string()))
}

pub fn listing_url(app_id: &str) -> String {
    format!("{STORE_DETAILS_URL}?id={app_id}")
}
