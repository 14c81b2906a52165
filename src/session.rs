use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::LOGIN_PATH;

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub device_id: String,
    pub device_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("device_name", &self.device_name)
            .finish()
    }
}

#[derive(Clone)]
pub struct Session {
    pub authorization: String,
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
struct LoginDevice<'a> {
    device_id: &'a str,
    device_name: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    device: LoginDevice<'a>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "Authorization")]
    authorization: Option<String>,
    #[serde(rename = "RefreshToken")]
    refresh_token: Option<String>,
}

impl<'a> LoginRequest<'a> {
    fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            email: &credentials.email,
            password: &credentials.password,
            device: LoginDevice {
                device_id: &credentials.device_id,
                device_name: &credentials.device_name,
            },
        }
    }
}

pub async fn authenticate(
    http: &Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<Session> {
    let url = format!("{base_url}{LOGIN_PATH}");
    let response = http
        .post(&url)
        .json(&LoginRequest::from_credentials(credentials))
        .send()
        .await
        .with_context(|| format!("Login request failed for {url}"))?;

    if response.status() != StatusCode::OK {
        bail!("Authentication failed ({}) for {url}", response.status());
    }

    let body: LoginResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to decode login response from {url}"))?;
    let session = session_from_response(body)?;
    if session.refresh_token.is_none() {
        debug!("Login response carried no refresh token");
    }
    info!("Authenticated as {}", credentials.email);
    Ok(session)
}

fn session_from_response(body: LoginResponse) -> Result<Session> {
    let authorization = body
        .authorization
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| anyhow!("Login response carried no Authorization token"))?;
    Ok(Session {
        authorization,
        refresh_token: body.refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            email: "ops@example.test".to_string(),
            password: "hunter2".to_string(),
            device_id: "000-000-000".to_string(),
            device_name: "aviation-hazards".to_string(),
        }
    }

    #[test]
    fn login_body_nests_device() {
        let creds = credentials();
        let body = serde_json::to_value(LoginRequest::from_credentials(&creds)).unwrap();
        assert_eq!(
            body,
            json!({
                "email": "ops@example.test",
                "password": "hunter2",
                "device": { "device_id": "000-000-000", "device_name": "aviation-hazards" }
            })
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("ops@example.test"));
    }

    #[test]
    fn session_requires_authorization_token() {
        let body: LoginResponse =
            serde_json::from_value(json!({ "Authorization": "abc", "RefreshToken": "def" }))
                .unwrap();
        let session = session_from_response(body).unwrap();
        assert_eq!(session.authorization, "abc");
        assert_eq!(session.refresh_token.as_deref(), Some("def"));

        let missing: LoginResponse =
            serde_json::from_value(json!({ "RefreshToken": "def" })).unwrap();
        assert!(session_from_response(missing).is_err());
    }
}
