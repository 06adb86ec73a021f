pub mod helpdesk;

pub use helpdesk::{ApiCall, CallMethod, HelpdeskApi};
