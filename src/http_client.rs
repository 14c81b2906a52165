use anyhow::{bail, Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::session::Session;

pub trait HazardApi {
    async fn get_json(&self, path: &str) -> Result<Value>;
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(http: Client, base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
        }
    }
}

impl HazardApi for ApiClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        fetch_json(&self.http, &url, &self.session).await
    }
}

pub async fn fetch_json(http: &Client, url: &str, session: &Session) -> Result<Value> {
    let response = http
        .get(url)
        .header(AUTHORIZATION, &session.authorization)
        .send()
        .await
        .with_context(|| format!("Request failed for {url}"))?;

    if !is_accepted(response.status()) {
        bail!("Request failed ({}) for {url}", response.status());
    }

    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read body for {url}"))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).with_context(|| format!("Failed to decode JSON body for {url}"))
}

fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ok_and_created_are_accepted() {
        assert!(is_accepted(StatusCode::OK));
        assert!(is_accepted(StatusCode::CREATED));
        assert!(!is_accepted(StatusCode::NO_CONTENT));
        assert!(!is_accepted(StatusCode::UNAUTHORIZED));
    }
}
