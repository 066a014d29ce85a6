// src/api/http/chat.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::catalog::CourseRecord;
use crate::chat::filters::FilterSpec;
use crate::llm::ChatMessage;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: Option<Vec<ChatMessage>>,
    pub season_codes: Option<Vec<String>>,
    pub subject: Option<Vec<String>>,
    pub areas: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub courses: Vec<CourseRecord>,
}

pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let result: ApiResult<_> = async {
        // Client input errors are rejected before any external call.
        let messages = request
            .message
            .ok_or_else(|| ApiError::bad_request("Missing 'message' in request body"))?;
        if messages.is_empty() {
            return Err(ApiError::bad_request("Message list is empty"));
        }

        let request_id = Uuid::new_v4();
        info!(%request_id, turns = messages.len(), "chat request");

        let client_filters =
            FilterSpec::from_request(request.season_codes, request.subject, request.areas);

        let result = app_state
            .recommender
            .recommend(messages, client_filters)
            .await;

        info!(%request_id, courses = result.courses.len(), "chat response ready");
        Ok(Json(ChatResponse {
            response: result.response,
            courses: result.courses,
        }))
    }
    .await;

    match result {
        Ok(response) => response.into_response(),
        Err(error) => error.into_response(),
    }
}
