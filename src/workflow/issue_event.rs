use serde::Serialize;
use tracing::info;

use crate::context::AppContext;
use crate::domain::event::{IssueEvent, Repository};
use crate::error::AppResult;
use crate::services::ApiCall;
use crate::workflow::locator::TicketLocator;

/// Status code the helpdesk uses for "Closed".
pub const CLOSED_STATUS: u8 = 4;

const FIXED_LABEL_PREFIX: &str = "fixed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    NotePosted { tickets: usize },
    TicketsClosed { tickets: usize },
    Skipped,
}

pub fn is_fixed_label(label: &str) -> bool {
    label
        .get(..FIXED_LABEL_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FIXED_LABEL_PREFIX))
}

pub fn note_body(repo: &Repository, issue_number: u64, label: &str) -> String {
    format!(
        "Github issue {}#{issue_number} has been marked as {label}.",
        repo.full_name
    )
}

pub async fn dispatch(ctx: &AppContext, event: &IssueEvent) -> AppResult<EventOutcome> {
    match event {
        IssueEvent::Labeled {
            number,
            repository,
            label,
        } => handle_labeled(ctx, *number, repository, label).await,
        IssueEvent::Closed { number, repository } => {
            handle_closed(ctx, *number, repository).await
        }
        IssueEvent::Ignored { .. } => Ok(EventOutcome::Skipped),
    }
}

pub async fn handle_labeled(
    ctx: &AppContext,
    issue_number: u64,
    repo: &Repository,
    label: &str,
) -> AppResult<EventOutcome> {
    if !is_fixed_label(label) {
        return Ok(EventOutcome::Skipped);
    }

    let helpdesk = ctx.helpdesk.as_ref();
    let request = serde_json::to_string(&NoteRequest {
        helpdesk_note: Note {
            body: &note_body(repo, issue_number, label),
            private: false,
        },
    })?;
    let request = request.as_str();

    let mut tickets = 0;
    TicketLocator::new(ctx)
        .for_each_ticket_for_issue(issue_number, repo, |located| {
            tickets += 1;
            async move {
                info!(ticket = %located.display_id, issue = issue_number, "posting note");
                helpdesk
                    .call(ApiCall::post(
                        format!("tickets/{}/conversations/note", located.display_id),
                        request.to_string(),
                    ))
                    .await
                    .map(|_| ())
            }
        })
        .await?;

    Ok(EventOutcome::NotePosted { tickets })
}

pub async fn handle_closed(
    ctx: &AppContext,
    issue_number: u64,
    repo: &Repository,
) -> AppResult<EventOutcome> {
    let helpdesk = ctx.helpdesk.as_ref();
    let request = serde_json::to_string(&StatusUpdateRequest {
        helpdesk_ticket: StatusUpdate {
            status: CLOSED_STATUS,
        },
    })?;
    let request = request.as_str();

    let mut tickets = 0;
    TicketLocator::new(ctx)
        .for_each_ticket_for_issue(issue_number, repo, |located| {
            tickets += 1;
            async move {
                info!(ticket = %located.display_id, issue = issue_number, "closing ticket");
                helpdesk
                    .call(ApiCall::put(
                        format!("tickets/{}", located.display_id),
                        request.to_string(),
                    ))
                    .await
                    .map(|_| ())
            }
        })
        .await?;

    Ok(EventOutcome::TicketsClosed { tickets })
}

#[derive(Serialize)]
struct NoteRequest<'a> {
    helpdesk_note: Note<'a>,
}

#[derive(Serialize)]
struct Note<'a> {
    body: &'a str,
    private: bool,
}

#[derive(Serialize)]
struct StatusUpdateRequest {
    helpdesk_ticket: StatusUpdate,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: u8,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::AppError;
    use crate::services::CallMethod;
    use crate::test_support::{StubHelpdesk, context_with, settings_with_field, ticket};

    fn repo() -> Repository {
        Repository {
            full_name: "org/app".to_string(),
            name: "app".to_string(),
        }
    }

    #[test]
    fn recognises_fixed_labels_case_insensitively() {
        for label in ["fixed", "Fixed", "FIXED in 2.1", "fixed-won't-fix"] {
            assert!(is_fixed_label(label), "{label} should match");
        }
        for label in ["wontfix", "in-progress", "fix", "not fixed", ""] {
            assert!(!is_fixed_label(label), "{label} should not match");
        }
    }

    #[tokio::test]
    async fn fixed_label_posts_public_note_to_each_matching_ticket() {
        let stub = Arc::new(StubHelpdesk::with_pages(vec![
            json!([ticket(10, "issue", json!("7")), ticket(11, "issue", json!("8"))]),
            json!([ticket(12, "issue", json!(7))]),
        ]));
        let ctx = context_with(settings_with_field("issue"), stub.clone());

        let outcome = handle_labeled(&ctx, 7, &repo(), "Fixed")
            .await
            .expect("labeled");
        assert_eq!(outcome, EventOutcome::NotePosted { tickets: 2 });

        let mutations = stub.mutations();
        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[0].action, "tickets/10/conversations/note");
        assert_eq!(mutations[1].action, "tickets/12/conversations/note");
        assert!(mutations.iter().all(|call| call.method() == CallMethod::Post));

        let body: serde_json::Value =
            serde_json::from_str(mutations[0].body.as_deref().expect("body")).expect("json body");
        assert_eq!(
            body,
            json!({"helpdesk_note": {
                "body": "Github issue org/app#7 has been marked as Fixed.",
                "private": false
            }})
        );
    }

    #[tokio::test]
    async fn other_labels_make_no_calls() {
        for label in ["wontfix", "in-progress"] {
            let stub = Arc::new(StubHelpdesk::with_pages(vec![json!([ticket(
                1,
                "issue",
                json!("7")
            )])]));
            let ctx = context_with(settings_with_field("issue"), stub.clone());

            let outcome = handle_labeled(&ctx, 7, &repo(), label)
                .await
                .expect("labeled");
            assert_eq!(outcome, EventOutcome::Skipped);
            assert!(stub.calls().is_empty(), "{label} triggered calls");
        }
    }

    #[tokio::test]
    async fn closed_puts_closed_status_on_matching_tickets() {
        let stub = Arc::new(StubHelpdesk::with_pages(vec![json!([
            ticket(3, "issue", json!("42")),
            ticket(4, "issue", json!("41")),
        ])]));
        let ctx = context_with(settings_with_field("issue"), stub.clone());

        let outcome = handle_closed(&ctx, 42, &repo()).await.expect("closed");
        assert_eq!(outcome, EventOutcome::TicketsClosed { tickets: 1 });

        let mutations = stub.mutations();
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].action, "tickets/3");
        assert_eq!(mutations[0].method(), CallMethod::Put);
        assert_eq!(
            mutations[0].body.as_deref(),
            Some(r#"{"helpdesk_ticket":{"status":4}}"#)
        );
    }

    #[tokio::test]
    async fn mutation_failure_aborts_remaining_tickets() {
        let stub = Arc::new(
            StubHelpdesk::with_pages(vec![
                json!([ticket(3, "issue", json!("42")), ticket(4, "issue", json!("42"))]),
                json!([ticket(5, "issue", json!("42"))]),
            ])
            .failing_mutations("500"),
        );
        let ctx = context_with(settings_with_field("issue"), stub.clone());

        let err = handle_closed(&ctx, 42, &repo())
            .await
            .expect_err("failure propagates");
        assert!(matches!(err, AppError::HelpdeskStatus { ref status, .. } if status == "500"));
        assert_eq!(stub.mutations().len(), 1);
        assert_eq!(stub.requested_pages(), vec!["1"]);
    }

    #[tokio::test]
    async fn ignored_actions_are_skipped() {
        let stub = Arc::new(StubHelpdesk::with_pages(vec![]));
        let ctx = context_with(settings_with_field("issue"), stub.clone());

        let outcome = dispatch(
            &ctx,
            &IssueEvent::Ignored {
                action: "reopened".to_string(),
            },
        )
        .await
        .expect("dispatch");
        assert_eq!(outcome, EventOutcome::Skipped);
        assert!(stub.calls().is_empty());
    }
}
