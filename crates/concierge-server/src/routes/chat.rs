use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const DEFAULT_CONVERSATION_ID: &str = "default";

#[derive(Debug, Deserialize)]
struct ChatForm {
    question: String,
    #[serde(rename = "conversationId", default = "default_conversation_id")]
    conversation_id: String,
}

fn default_conversation_id() -> String {
    DEFAULT_CONVERSATION_ID.to_string()
}

async fn chat_handler(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<String, (StatusCode, String)> {
    let conversation_id = if form.conversation_id.trim().is_empty() {
        DEFAULT_CONVERSATION_ID
    } else {
        form.conversation_id.as_str()
    };

    state
        .session
        .respond(&form.question, conversation_id)
        .await
        .map_err(|err| {
            tracing::error!(conversation_id, error = %err, "chat turn failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })
}

async fn new_conversation() -> Json<Value> {
    Json(json!({ "conversationId": Uuid::new_v4().to_string() }))
}

async fn clear_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> StatusCode {
    state.memory.clear(&conversation_id);
    tracing::info!(%conversation_id, "conversation cleared");
    StatusCode::NO_CONTENT
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/conversations", post(new_conversation))
        .route("/api/chat/:conversation_id", delete(clear_conversation))
        .with_state(state)
}
