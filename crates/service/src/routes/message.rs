//! Message endpoint.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use steward_link_core::MessageId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Message payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub greetings: Option<String>,
}

/// Prefix the greetings with the message ID: `"<id> <greetings>"`, or just
/// `"<id>"` without greetings.
#[must_use]
pub fn greet(id: MessageId, greetings: Option<&str>) -> String {
    match greetings {
        Some(greetings) => format!("{id} {greetings}"),
        None => id.to_string(),
    }
}

/// Update a message.
///
/// When the service requires linked accounts, the caller's local account is
/// resolved (and created on first use) before the message is handled.
/// An unreadable body is a 400 with the usual JSON error body.
#[instrument(skip(state, user, payload), fields(message_id = %id))]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalUser(user): OptionalUser,
    payload: std::result::Result<Json<Message>, JsonRejection>,
) -> Result<Json<Message>> {
    let id: MessageId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid message ID: {id}")))?;
    let Json(message) = payload?;

    if state.config().require_account {
        let account = state.gate().check_local_account(user.as_ref()).await?;
        tracing::debug!(account_id = ?account.account_id(), "Caller account resolved");
    }

    Ok(Json(Message {
        greetings: Some(greet(id, message.greetings.as_deref())),
    }))
}
