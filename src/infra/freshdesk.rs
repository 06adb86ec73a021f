use std::sync::Arc;

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::services::{ApiCall, CallMethod, HelpdeskApi};

/// Freshdesk accepts the API key as the basic-auth user with a dummy password.
const API_KEY_PASSWORD: &str = "X";

pub struct FreshdeskClient {
    http: Client,
    settings: Arc<Settings>,
}

impl FreshdeskClient {
    pub fn new(settings: Arc<Settings>) -> AppResult<Self> {
        let http = Client::builder()
            .https_only(!settings.uses_custom_base_url())
            .build()
            .map_err(|err| {
                AppError::Configuration(format!("failed to build helpdesk HTTP client: {err}"))
            })?;
        Ok(Self { http, settings })
    }

    fn api_details(&self) -> AppResult<(String, &str)> {
        let base_url = self.settings.helpdesk_base_url()?;
        let key = self
            .settings
            .freshdesk_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Freshdesk API key not configured".to_string()))?;
        Ok((base_url, key))
    }

    fn auth_header(key: &str) -> String {
        let credentials = format!("{key}:{API_KEY_PASSWORD}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn request_url(base_url: &str, call: &ApiCall) -> String {
        format!(
            "{}/helpdesk/{}?{}",
            base_url.trim_end_matches('/'),
            call.action,
            call.query_string()
        )
    }
}

#[async_trait]
impl HelpdeskApi for FreshdeskClient {
    async fn call(&self, call: ApiCall) -> AppResult<Value> {
        let (base_url, key) = self.api_details()?;
        let url = Self::request_url(&base_url, &call);
        let method = call.method();
        debug!(?method, action = %call.action, "calling helpdesk");

        let request = match method {
            CallMethod::Get => self.http.get(&url),
            CallMethod::Post => self.http.post(&url),
            CallMethod::Put => self.http.put(&url),
        }
        .header(AUTHORIZATION, Self::auth_header(key))
        .header(CONTENT_TYPE, "application/json");
        let request = match call.body {
            Some(body) => request.body(body),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|err| AppError::HelpdeskTransport(format!("failed to call {url}: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());

        // Only a literal 200 counts; 201 and 204 are failures for this API.
        if status.as_str() != "200" {
            return Err(AppError::HelpdeskStatus {
                status: status.as_str().to_string(),
                url,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| {
            AppError::HelpdeskResponse(format!("failed to parse response from {url}: {err}"))
        })
    }
}
