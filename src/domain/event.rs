use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub name: String,
}

/// The parts of an issue webhook delivery the relay acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueEvent {
    Labeled {
        number: u64,
        repository: Repository,
        label: String,
    },
    Closed {
        number: u64,
        repository: Repository,
    },
    Ignored {
        action: String,
    },
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    issue: Option<IssuePayload>,
    #[serde(default)]
    repository: Option<Repository>,
    #[serde(default)]
    label: Option<LabelPayload>,
}

#[derive(Deserialize)]
struct IssuePayload {
    #[serde(default)]
    number: Option<u64>,
}

#[derive(Deserialize)]
struct LabelPayload {
    #[serde(default)]
    name: Option<String>,
}

impl EventEnvelope {
    fn issue_number(&self) -> AppResult<u64> {
        self.issue
            .as_ref()
            .and_then(|issue| issue.number)
            .ok_or_else(|| AppError::InvalidPayload("missing issue.number".to_string()))
    }
}

impl IssueEvent {
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        let envelope: EventEnvelope = serde_json::from_slice(body)
            .map_err(|err| AppError::InvalidPayload(err.to_string()))?;
        let action = envelope.action.as_deref().unwrap_or_default();

        match action {
            "labeled" => Ok(Self::Labeled {
                number: envelope.issue_number()?,
                label: envelope
                    .label
                    .and_then(|label| label.name)
                    .unwrap_or_default(),
                repository: envelope.repository.unwrap_or_default(),
            }),
            "closed" => Ok(Self::Closed {
                number: envelope.issue_number()?,
                repository: envelope.repository.unwrap_or_default(),
            }),
            _ => Ok(Self::Ignored {
                action: action.to_string(),
            }),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Labeled { .. } => "labeled",
            Self::Closed { .. } => "closed",
            Self::Ignored { action } => action,
        }
    }
}
