pub mod issue_event;
pub mod locator;
