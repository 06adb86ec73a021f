use std::future::Future;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::context::AppContext;
use crate::domain::event::Repository;
use crate::domain::ticket::HelpdeskTicket;
use crate::error::{AppError, AppResult};
use crate::services::{ApiCall, HelpdeskApi};

pub const LIST_TICKETS_ACTION: &str = "tickets/filter/all_tickets";

/// Cursor over the helpdesk ticket listing, one page per call, starting at 1.
/// The first empty page ends the listing and nothing after it is requested.
pub struct TicketPages<'a> {
    helpdesk: &'a dyn HelpdeskApi,
    next_page: u32,
    exhausted: bool,
}

impl<'a> TicketPages<'a> {
    pub fn new(helpdesk: &'a dyn HelpdeskApi) -> Self {
        Self {
            helpdesk,
            next_page: 1,
            exhausted: false,
        }
    }

    pub async fn next_page(&mut self) -> AppResult<Option<Vec<Value>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.next_page;
        let response = self
            .helpdesk
            .call(ApiCall::get(LIST_TICKETS_ACTION).with_query("page", page))
            .await?;
        let tickets = match response {
            Value::Array(tickets) => tickets,
            other => {
                return Err(AppError::HelpdeskResponse(format!(
                    "ticket page {page} is not a list: {other}"
                )));
            }
        };

        if tickets.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        debug!(page, count = tickets.len(), "fetched ticket page");
        self.next_page += 1;
        Ok(Some(tickets))
    }
}

/// A ticket that references an issue and can be addressed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTicket {
    pub display_id: String,
    pub ticket: HelpdeskTicket,
}

pub struct TicketLocator<'a> {
    settings: &'a Settings,
    helpdesk: &'a dyn HelpdeskApi,
}

impl<'a> TicketLocator<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            settings: &ctx.settings,
            helpdesk: ctx.helpdesk.as_ref(),
        }
    }

    /// Visits every ticket on every page in listing order.
    pub async fn for_each_ticket<F, Fut>(&self, mut visit: F) -> AppResult<()>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let mut pages = TicketPages::new(self.helpdesk);
        while let Some(tickets) = pages.next_page().await? {
            for ticket in tickets {
                visit(ticket).await?;
            }
        }
        Ok(())
    }

    /// Per-repository custom field, looked up by full name then short name.
    pub fn field_name_for_repo(&self, repo: &Repository) -> Option<&'a str> {
        let settings = self.settings;
        let repositories = settings.repositories.as_ref()?;
        repositories
            .get(&repo.full_name)
            .or_else(|| repositories.get(&repo.name))
            .map(String::as_str)
    }

    pub fn custom_field_for(&self, repo: &Repository) -> Option<&'a str> {
        let settings = self.settings;
        self.field_name_for_repo(repo)
            .or(settings.freshdesk_custom_field.as_deref())
    }

    /// Visits tickets whose issue field equals `issue_number` as text.
    /// Every page is scanned even after a match.
    pub async fn for_each_ticket_for_issue<F, Fut>(
        &self,
        issue_number: u64,
        repo: &Repository,
        mut visit: F,
    ) -> AppResult<()>
    where
        F: FnMut(LocatedTicket) -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let Some(field_name) = self.custom_field_for(repo) else {
            warn!(
                repository = %repo.full_name,
                "no custom field configured for repository; no tickets can match"
            );
            return Ok(());
        };

        self.for_each_ticket(|raw| {
            let pending = locate(raw, field_name, issue_number).map(&mut visit);
            async move {
                match pending {
                    Some(visited) => visited.await,
                    None => Ok(()),
                }
            }
        })
        .await
    }

    pub async fn tickets_for_issue(
        &self,
        issue_number: u64,
        repo: &Repository,
    ) -> AppResult<Vec<LocatedTicket>> {
        let mut found = Vec::new();
        self.for_each_ticket_for_issue(issue_number, repo, |ticket| {
            found.push(ticket);
            async { Ok(()) }
        })
        .await?;
        Ok(found)
    }
}

fn locate(raw: Value, field_name: &str, issue_number: u64) -> Option<LocatedTicket> {
    let ticket = match serde_json::from_value::<HelpdeskTicket>(raw) {
        Ok(ticket) => ticket,
        Err(err) => {
            warn!(error = %err, "unreadable ticket in listing; skipping");
            return None;
        }
    };
    if !ticket.references_issue(field_name, issue_number) {
        return None;
    }
    let Some(display_id) = ticket.display_id.clone() else {
        warn!(
            issue = issue_number,
            field = field_name,
            "matching ticket has no display_id; skipping"
        );
        return None;
    };
    Some(LocatedTicket { display_id, ticket })
}
