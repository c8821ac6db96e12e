//! Scrapers for the configuration the portal embeds in its pages.
//!
//! Both extractors work on the raw body with narrow patterns instead of parsing HTML, and fail
//! with `Error::Extraction` when the marker they look for is missing.

use super::Error;
use crate::model::{BearerToken, SessionDescriptor};
use regex::Regex;
use serde::Deserialize;

/* Script bundle carrying the url-encoded descriptor */
const RESOURCES_MARKER: &str = "resources.js";
/* `/areaprivada/s/sfsites/l/<descriptor>/resources.js` */
const DESCRIPTOR_SEGMENT: usize = 5;

lazy_static! {
    static ref SCRIPT_SRC: Regex =
        Regex::new(r#"(?is)<script\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
    static ref AURA_CONFIG: Regex = Regex::new(r"var\s+auraConfig\s*=\s*").unwrap();
}

#[derive(Deserialize)]
struct AuraConfig {
    token: Option<String>,
}

fn script_sources(html: &str) -> impl Iterator<Item = &str> {
    SCRIPT_SRC.captures_iter(html).filter_map(|captures| {
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str())
    })
}

/// Query-style unescape: `+` is a space, `%XX` a byte.
fn query_unescape(segment: &str) -> Result<String, Error> {
    urlencoding::decode(&segment.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::Extraction(format!("descriptor is not valid UTF-8: {}", e)))
}

/// Read the session descriptor out of the last `resources.js` script path of the login page.
pub fn session_descriptor(html: &str) -> Result<SessionDescriptor, Error> {
    /* A later bundle overrides an earlier one */
    let src = script_sources(html)
        .filter(|src| src.contains(RESOURCES_MARKER))
        .last()
        .ok_or_else(|| Error::Extraction("no resources script tag found".to_string()))?;

    let segment = src.split('/').nth(DESCRIPTOR_SEGMENT).ok_or_else(|| {
        Error::Extraction(format!("resources script path is too short: {}", src))
    })?;

    let decoded = query_unescape(segment)?;
    let descriptor: SessionDescriptor = serde_json::from_str(&decoded)
        .map_err(|e| Error::Extraction(format!("descriptor is not a JSON object: {}", e)))?;

    if descriptor.is_empty() {
        return Err(Error::Extraction(
            "descriptor carries no mode, app or fwuid".to_string(),
        ));
    }
    Ok(descriptor)
}

/// Read the bearer token from the `var auraConfig = {...};` assignment of the landing page.
pub fn bearer_token(html: &str) -> Result<BearerToken, Error> {
    let start = AURA_CONFIG
        .find(html)
        .ok_or_else(|| Error::Extraction("no auraConfig assignment found".to_string()))?
        .end();

    /* Parse exactly one JSON value and ignore whatever script follows it */
    let config = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<AuraConfig>()
        .next()
        .ok_or_else(|| Error::Extraction("auraConfig has no value".to_string()))?
        .map_err(|e| Error::Extraction(format!("auraConfig is not valid JSON: {}", e)))?;

    match config.token {
        Some(token) if !token.is_empty() => Ok(BearerToken(token)),
        _ => Err(Error::Extraction("auraConfig carries no token".to_string())),
    }
}
