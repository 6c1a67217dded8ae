//! src/mail/send_email.rs

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::config::EmailClientSettings;
use crate::domain::signup_email::SignupEmail;

/// Subject line for the confirmation email. Fixed; not derived from the
/// request.
pub const SETUP_GUIDE_SUBJECT: &str = "Welcome to the waitlist";

/// The confirmation email body. A static pre-rendered document; only the
/// recipient address varies between sends.
pub const SETUP_GUIDE_HTML: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>You're on the waitlist!</h1>
    <p>Thanks for signing up. While you wait, here is how to get set up:</p>
    <ol>
      <li>Install the CLI from the downloads page.</li>
      <li>Run <code>init</code> in your project directory.</li>
      <li>We'll email you an invite code as soon as a slot opens.</li>
    </ol>
    <p>Reply to this email if you get stuck.</p>
  </body>
</html>
"#;

#[derive(thiserror::Error, Debug)]
pub enum SendEmailError {
    #[error("the email dispatcher rejected the send with status {status}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to reach the email dispatcher")]
    Transport(#[from] reqwest::Error),
}

#[derive(serde::Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SignupEmail,
    api_key: Secret<String>,
}

impl EmailClient {
    pub fn new(settings: &EmailClientSettings, sender: SignupEmail, api_key: Secret<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(std::time::Duration::from_millis(settings.send_timeout_ms))
                .build()
                .unwrap(),
            base_url: settings.base_url.clone(),
            sender,
            api_key,
        }
    }

    /// Sends the fixed setup-guide email to `recipient`. On rejection the
    /// provider's error text is captured verbatim so the caller can report
    /// it.
    pub async fn send_setup_guide(&self, recipient: &SignupEmail) -> Result<(), SendEmailError> {
        let url = format!("{}/emails", self.base_url);
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject: SETUP_GUIDE_SUBJECT,
            html: SETUP_GUIDE_HTML,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SendEmailError::Rejected { status, body });
        }

        // The provider echoes back a message id; useful when chasing a lost
        // email, not part of the response contract.
        let body = response.text().await.unwrap_or_default();
        tracing::info!("Email dispatcher accepted the send: {}", body);

        Ok(())
    }
}
