use std::sync::Arc;

use crate::config::Settings;
use crate::services::HelpdeskApi;

#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub helpdesk: Arc<dyn HelpdeskApi>,
}

impl AppContext {
    pub fn new(settings: Arc<Settings>, helpdesk: Arc<dyn HelpdeskApi>) -> Self {
        Self { settings, helpdesk }
    }
}
