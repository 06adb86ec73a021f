use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::Settings;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::services::{ApiCall, CallMethod, HelpdeskApi};
use crate::workflow::locator::LIST_TICKETS_ACTION;

/// Serves scripted ticket pages and records every call it receives.
pub struct StubHelpdesk {
    pages: Vec<Value>,
    mutation_status: Option<String>,
    calls: Mutex<Vec<ApiCall>>,
}

impl StubHelpdesk {
    pub fn with_pages(pages: Vec<Value>) -> Self {
        Self {
            pages,
            mutation_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_mutations(mut self, status: &str) -> Self {
        self.mutation_status = Some(status.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method() != CallMethod::Get)
            .collect()
    }

    pub fn requested_pages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.action == LIST_TICKETS_ACTION)
            .filter_map(|call| {
                call.query
                    .into_iter()
                    .find(|(key, _)| key == "page")
                    .map(|(_, page)| page)
            })
            .collect()
    }
}

#[async_trait]
impl HelpdeskApi for StubHelpdesk {
    async fn call(&self, call: ApiCall) -> AppResult<Value> {
        self.calls.lock().expect("calls lock").push(call.clone());

        if call.action == LIST_TICKETS_ACTION {
            let page = call
                .query
                .iter()
                .find(|(key, _)| key == "page")
                .and_then(|(_, page)| page.parse::<usize>().ok())
                .expect("page param");
            return Ok(self.pages.get(page - 1).cloned().unwrap_or_else(|| json!([])));
        }

        if let Some(status) = &self.mutation_status {
            return Err(AppError::HelpdeskStatus {
                status: status.clone(),
                url: format!("stub://helpdesk/{}", call.action),
                body: "stubbed failure".to_string(),
            });
        }
        Ok(json!({}))
    }
}

pub fn settings_with_field(field: &str) -> Settings {
    Settings {
        freshdesk_key: Some("test-key".to_string()),
        freshdesk_domain: Some("acme".to_string()),
        freshdesk_custom_field: Some(field.to_string()),
        ..Settings::default()
    }
}

pub fn context_with(settings: Settings, helpdesk: Arc<StubHelpdesk>) -> AppContext {
    AppContext::new(Arc::new(settings), helpdesk)
}

pub fn ticket(display_id: u64, field: &str, value: Value) -> Value {
    json!({
        "display_id": display_id,
        "subject": format!("Ticket {display_id}"),
        "custom_field": { field: value },
    })
}
