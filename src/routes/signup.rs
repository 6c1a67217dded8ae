use std::fmt::Formatter;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use tracing;

use crate::domain::signup_email::SignupEmail;
use crate::mail::send_email::SendEmailError;
use crate::startup::SignupServices;
use crate::store::contact_store::ContactStoreError;

fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// The two fatal request errors. Both short-circuit before any outbound
/// call is made; upstream failures are never raised from the handler, they
/// are folded into the aggregate response instead.
#[derive(thiserror::Error)]
pub enum SignupError {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl std::fmt::Debug for SignupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SignupError {
    fn status_code(&self) -> StatusCode {
        match self {
            SignupError::InvalidEmail => StatusCode::BAD_REQUEST,
            SignupError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[derive(serde::Deserialize)]
pub struct SignupForm {
    // An absent field folds into the empty string and fails validation the
    // same way an empty value does.
    #[serde(default)]
    email: String,
}

/// Any non-POST method on the waitlist resource lands here.
pub async fn method_not_allowed() -> Result<HttpResponse, SignupError> {
    Err(SignupError::MethodNotAllowed)
}

#[tracing::instrument(
name = "Adding a signup to the waitlist",
skip(form, services),
fields(
signup_email = % form.email,
)
)]
pub async fn signup(
    form: web::Json<SignupForm>,
    services: web::Data<SignupServices>,
) -> Result<HttpResponse, SignupError> {
    let email = match SignupEmail::parse(form.0.email) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!("Rejecting signup: {}", e);
            return Err(SignupError::InvalidEmail);
        }
    };

    // Both sub-operations are attempted unconditionally and in order; a
    // failure in the save never prevents the send. Failures accumulate
    // here and are reported together at the end.
    let mut failures: Vec<String> = Vec::new();

    if let Some(contact_store) = &services.contact_store {
        match contact_store.save_contact(&email, Utc::now()).await {
            Ok(()) => {}
            Err(ContactStoreError::Rejected { status, body }) => {
                tracing::error!("Contact store rejected the save ({}): {}", status, body);
                failures.push("Notion save failed".to_string());
            }
            Err(e @ ContactStoreError::Transport(_)) => {
                tracing::error!("Contact store call failed: {:?}", e);
                failures.push("Notion exception".to_string());
            }
        }
    }

    if let Some(email_client) = &services.email_client {
        match email_client.send_setup_guide(&email).await {
            Ok(()) => {}
            Err(SendEmailError::Rejected { status, body }) => {
                tracing::error!("Email dispatcher rejected the send ({}): {}", status, body);
                // The provider's error text travels to the caller verbatim.
                failures.push(format!("Email send failed: {}", body));
            }
            Err(e @ SendEmailError::Transport(_)) => {
                tracing::error!("Email dispatch failed: {:?}", e);
                failures.push("Email exception".to_string());
            }
        }
    }

    if failures.is_empty() {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
    } else {
        Ok(HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": failures.join(", ") })))
    }
}
