use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

/// One request against the helpdesk REST surface, relative to `/helpdesk/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub action: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub put: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMethod {
    Get,
    Post,
    Put,
}

impl ApiCall {
    pub fn get(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            query: Vec::new(),
            body: None,
            put: false,
        }
    }

    pub fn post(action: impl Into<String>, body: String) -> Self {
        Self {
            body: Some(body),
            ..Self::get(action)
        }
    }

    pub fn put(action: impl Into<String>, body: String) -> Self {
        Self {
            body: Some(body),
            put: true,
            ..Self::get(action)
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.query.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    pub fn method(&self) -> CallMethod {
        match (&self.body, self.put) {
            (None, _) => CallMethod::Get,
            (Some(_), true) => CallMethod::Put,
            (Some(_), false) => CallMethod::Post,
        }
    }

    /// `key=value` pairs in insertion order with `format=json` forced in.
    /// Values are inserted verbatim; the helpdesk expects them unencoded.
    pub fn query_string(&self) -> String {
        self.clone()
            .with_query("format", "json")
            .query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    async fn call(&self, call: ApiCall) -> AppResult<Value>;
}
