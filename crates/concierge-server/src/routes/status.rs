use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tools": state.invoker.registry().len(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/status", get(status)).with_state(state)
}
