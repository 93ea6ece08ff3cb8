//! OMDb-style JSON rating service over HTTP (libcurl).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{LookupClient, LookupError, Rating};
use crate::config::LookupConfig;

/// Looks up a title and reads its `imdbRating` field.
///
/// Built once per run and shared by every worker behind an `Arc`; each call
/// uses its own curl handle, so there is no cross-worker session state.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
}

impl OmdbClient {
    pub fn new(cfg: &LookupConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid lookup base_url: {}", cfg.base_url))?;
        Ok(Self {
            base_url,
            api_key: cfg.resolved_api_key(),
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
        })
    }

    /// Full request URL for `key` (query-encoded).
    pub fn request_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("t", key);
            if let Some(k) = &self.api_key {
                q.append_pair("apikey", k);
            }
        }
        url
    }

    fn get(&self, url: &Url) -> Result<Vec<u8>, LookupError> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(15).min(self.timeout))?;
        easy.timeout(self.timeout)?;
        easy.useragent(concat!("enrich/", env!("CARGO_PKG_VERSION")))?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(LookupError::Http(code));
        }
        Ok(body)
    }
}

impl LookupClient for OmdbClient {
    fn lookup(&self, key: &str) -> Result<Option<Rating>, LookupError> {
        let url = self.request_url(key);
        let body = self.get(&url)?;
        parse_response(&body)
    }
}

/// Interpret a response body. "Not found" and `N/A` ratings are empty results.
pub(crate) fn parse_response(body: &[u8]) -> Result<Option<Rating>, LookupError> {
    let resp: OmdbResponse =
        serde_json::from_slice(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    if !resp.response.eq_ignore_ascii_case("true") {
        let msg = resp.error.unwrap_or_else(|| "unknown error".to_string());
        let lower = msg.to_ascii_lowercase();
        if lower.contains("not found") {
            return Ok(None);
        }
        if lower.contains("limit") {
            return Err(LookupError::Throttled(msg));
        }
        return Err(LookupError::Service(msg));
    }

    match resp.imdb_rating.as_deref().map(str::trim) {
        None | Some("") | Some("N/A") => Ok(None),
        Some(raw) => raw
            .parse::<Rating>()
            .map(Some)
            .map_err(|_| LookupError::Malformed(format!("rating {:?}", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OmdbClient {
        OmdbClient {
            base_url: Url::parse("https://ratings.example/").unwrap(),
            api_key: Some("k3y".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn parses_rating() {
        let body = br#"{"Title":"Heat","imdbRating":"8.3","Response":"True"}"#;
        assert_eq!(parse_response(body).unwrap(), Some(8.3));
    }

    #[test]
    fn not_found_is_empty_result() {
        let body = br#"{"Response":"False","Error":"Movie not found!"}"#;
        assert_eq!(parse_response(body).unwrap(), None);
    }

    #[test]
    fn na_rating_is_empty_result() {
        let body = br#"{"Title":"Obscure","imdbRating":"N/A","Response":"True"}"#;
        assert_eq!(parse_response(body).unwrap(), None);
    }

    #[test]
    fn request_limit_is_throttled() {
        let body = br#"{"Response":"False","Error":"Request limit reached!"}"#;
        assert!(matches!(
            parse_response(body),
            Err(LookupError::Throttled(_))
        ));
    }

    #[test]
    fn other_service_errors() {
        let body = br#"{"Response":"False","Error":"Invalid API key!"}"#;
        assert!(matches!(parse_response(body), Err(LookupError::Service(_))));
        assert!(matches!(
            parse_response(b"<html>"),
            Err(LookupError::Malformed(_))
        ));
        let body = br#"{"imdbRating":"great","Response":"True"}"#;
        assert!(matches!(parse_response(body), Err(LookupError::Malformed(_))));
    }

    #[test]
    fn request_url_encodes_key() {
        let url = client().request_url("Amélie & Co");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("t".to_string(), "Amélie & Co".to_string()),
                ("apikey".to_string(), "k3y".to_string()),
            ]
        );
    }
}
