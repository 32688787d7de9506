use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;

use crate::error::{Error, ErrorKind, Result};

use super::{looks_like_yaml, ResolvedSource, SourceKind};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 10;
const ACCEPT_HEADER: &str = "application/yaml,text/yaml,text/plain";

/// Single GET against `url`, buffered fully before pre-validation.
pub fn resolve(url: &str) -> Result<ResolvedSource> {
    let client = Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(Error::from)?;

    let response = client
        .get(url)
        .header(ACCEPT, ACCEPT_HEADER)
        .header(USER_AGENT, concat!("rbac-atlas/", env!("CARGO_PKG_VERSION")))
        .send()
        .map_err(Error::from)?;

    if !response.status().is_success() {
        return Err(ErrorKind::BadHttpStatus(response.status().as_u16(), url.to_string()).into());
    }

    let mut extras = BTreeMap::new();
    if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
        if let Ok(content_type) = content_type.to_str() {
            extras.insert("contentType".to_string(), content_type.to_string());
        }
    }
    let final_url = response.url().to_string();
    extras.insert("finalUrl".to_string(), final_url.clone());

    let bytes = response.bytes().map_err(Error::from)?.to_vec();
    if !looks_like_yaml(&bytes) {
        return Err(ErrorKind::InvalidYaml(
            url.to_string(),
            "response body does not look like YAML".to_string(),
        )
        .into());
    }

    Ok(ResolvedSource {
        kind: SourceKind::Remote,
        path: final_url,
        size: bytes.len(),
        mod_time: Utc::now(),
        extras,
        bytes,
    })
}
