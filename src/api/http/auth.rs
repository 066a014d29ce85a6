// src/api/http/auth.rs

//! CAS single-sign-on ticket validation. The pipeline itself assumes
//! authentication already happened; this endpoint is the boundary where the
//! frontend performs it.

use axum::{Json, extract::State, response::IntoResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult, IntoApiError};
use crate::state::AppState;

static CAS_USER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<cas:user>([^<]+)</cas:user>").expect("valid CAS user regex"));

#[derive(Deserialize)]
pub struct ValidateTicketRequest {
    pub ticket: Option<String>,
    pub service_url: Option<String>,
}

#[derive(Serialize)]
pub struct ValidateTicketResponse {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Extracts the authenticated user from a CAS serviceValidate XML body, if
/// the response carries an authenticationSuccess block.
pub fn extract_cas_user(body: &str) -> Option<String> {
    CAS_USER_RE
        .captures(body)
        .map(|captures| captures[1].to_string())
}

pub async fn validate_ticket_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ValidateTicketRequest>,
) -> impl IntoResponse {
    let result: ApiResult<_> = async {
        let ticket = request
            .ticket
            .ok_or_else(|| ApiError::bad_request("Missing 'ticket' in request body"))?;
        let service_url = request
            .service_url
            .ok_or_else(|| ApiError::bad_request("Missing 'service_url' in request body"))?;

        let url = format!("{}/serviceValidate", app_state.config.cas_base_url);
        let response = app_state
            .http
            .get(&url)
            .query(&[("ticket", ticket.as_str()), ("service", service_url.as_str())])
            .send()
            .await
            .into_api_error("CAS validation request failed")?;

        let body = response
            .text()
            .await
            .into_api_error("CAS validation response unreadable")?;

        let user = extract_cas_user(&body);
        info!(authenticated = user.is_some(), "CAS ticket validated");
        Ok(Json(ValidateTicketResponse {
            is_authenticated: user.is_some(),
            user,
        }))
    }
    .await;

    match result {
        Ok(response) => response.into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_user_from_a_success_response() {
        let body = "<cas:serviceResponse xmlns:cas='http://www.yale.edu/tp/cas'><cas:authenticationSuccess><cas:user>testuser</cas:user></cas:authenticationSuccess></cas:serviceResponse>";
        assert_eq!(extract_cas_user(body).as_deref(), Some("testuser"));
    }

    #[test]
    fn failure_responses_carry_no_user() {
        let body = "<cas:serviceResponse xmlns:cas='http://www.yale.edu/tp/cas'><cas:authenticationFailure code='INVALID_TICKET'>Ticket not recognized</cas:authenticationFailure></cas:serviceResponse>";
        assert!(extract_cas_user(body).is_none());
    }
}
