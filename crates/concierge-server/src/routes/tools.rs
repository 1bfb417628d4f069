use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use concierge::models::tool::{Tool, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CallRequest {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct CallResponse {
    content: String,
}

async fn list_tools(State(state): State<AppState>) -> Json<Vec<Tool>> {
    Json(state.invoker.registry().catalog())
}

// Every outcome, failures included, comes back as text with a 200
async fn call_tool(
    State(state): State<AppState>,
    Json(request): Json<CallRequest>,
) -> Json<CallResponse> {
    let call = ToolCall::new(request.name, request.arguments);
    let content = state.invoker.invoke(&call).await;
    Json(CallResponse { content })
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .with_state(state)
}
