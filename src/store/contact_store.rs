//! src/store/contact_store.rs

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::config::ContactStoreSettings;
use crate::domain::signup_email::SignupEmail;

/// API-version pin required by the pages endpoint.
const NOTION_VERSION: &str = "2022-06-28";

/// The waitlist database every signup row lands in.
const WAITLIST_DATABASE_ID: &str = "2fe272b56797808da469f8a8b3fc059a";

#[derive(thiserror::Error, Debug)]
pub enum ContactStoreError {
    #[error("the contact store rejected the save with status {status}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to reach the contact store")]
    Transport(#[from] reqwest::Error),
}

#[derive(serde::Serialize)]
struct CreatePageRequest<'a> {
    parent: PageParent<'a>,
    properties: ContactProperties<'a>,
}

#[derive(serde::Serialize)]
struct PageParent<'a> {
    database_id: &'a str,
}

#[derive(serde::Serialize)]
struct ContactProperties<'a> {
    #[serde(rename = "Email")]
    email: TitleProperty<'a>,
    #[serde(rename = "Signed Up")]
    signed_up: DateProperty,
}

#[derive(serde::Serialize)]
struct TitleProperty<'a> {
    title: Vec<TitleEntry<'a>>,
}

#[derive(serde::Serialize)]
struct TitleEntry<'a> {
    text: TextContent<'a>,
}

#[derive(serde::Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

#[derive(serde::Serialize)]
struct DateProperty {
    date: DateValue,
}

#[derive(serde::Serialize)]
struct DateValue {
    start: String,
}

pub struct ContactStore {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl ContactStore {
    pub fn new(settings: &ContactStoreSettings, api_key: Secret<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(std::time::Duration::from_millis(settings.request_timeout_ms))
                .build()
                .unwrap(),
            base_url: settings.base_url.clone(),
            api_key,
        }
    }

    /// Creates one page in the waitlist database: the email as the row
    /// title plus a server-generated "Signed Up" timestamp. Submitting the
    /// same email twice creates two rows; deduplication is left to the
    /// database owner.
    pub async fn save_contact(
        &self,
        email: &SignupEmail,
        signed_up_at: DateTime<Utc>,
    ) -> Result<(), ContactStoreError> {
        let url = format!("{}/v1/pages", self.base_url);
        let request_body = CreatePageRequest {
            parent: PageParent {
                database_id: WAITLIST_DATABASE_ID,
            },
            properties: ContactProperties {
                email: TitleProperty {
                    title: vec![TitleEntry {
                        text: TextContent {
                            content: email.as_ref(),
                        },
                    }],
                },
                signed_up: DateProperty {
                    date: DateValue {
                        start: signed_up_at.to_rfc3339(),
                    },
                },
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ContactStoreError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use claim::{assert_err, assert_ok};
    use fake::faker::internet::en::SafeEmail;
    use fake::{Fake, Faker};
    use secrecy::Secret;
    use wiremock::matchers::{any, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use crate::config::ContactStoreSettings;
    use crate::domain::signup_email::SignupEmail;

    use super::{ContactStore, ContactStoreError};

    struct CreatePageBodyMatcher;

    impl wiremock::Match for CreatePageBodyMatcher {
        fn matches(&self, request: &Request) -> bool {
            let result: Result<serde_json::Value, _> = serde_json::from_slice(&request.body);
            if let Ok(body) = result {
                let timestamp_is_valid = body["properties"]["Signed Up"]["date"]["start"]
                    .as_str()
                    .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                    .unwrap_or(false);
                return body["parent"]["database_id"].is_string()
                    && body["properties"]["Email"]["title"][0]["text"]["content"].is_string()
                    && timestamp_is_valid;
            }
            false
        }
    }

    fn email() -> SignupEmail {
        SignupEmail::parse(SafeEmail().fake()).unwrap()
    }

    fn contact_store(server_uri: String) -> ContactStore {
        let settings = ContactStoreSettings {
            base_url: server_uri,
            api_key: None,
            request_timeout_ms: 150,
        };

        ContactStore::new(&settings, Secret::new(Faker.fake()))
    }

    #[tokio::test]
    async fn save_contact_sends_the_expected_request() {
        let mock_server = MockServer::start().await;

        let store = contact_store(mock_server.uri());

        Mock::given(header_exists("Authorization"))
            .and(header("Notion-Version", "2022-06-28"))
            .and(header("Content-Type", "application/json"))
            .and(path("/v1/pages"))
            .and(method("POST"))
            .and(CreatePageBodyMatcher)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        // Act
        let outcome = store.save_contact(&email(), Utc::now()).await;

        // Assert
        assert_ok!(outcome);
    }

    #[tokio::test]
    async fn save_contact_captures_the_body_when_the_store_rejects_it() {
        let mock_server = MockServer::start().await;

        let store = contact_store(mock_server.uri());

        Mock::given(any())
            .respond_with(ResponseTemplate::new(400).set_body_string("database not shared"))
            .expect(1)
            .mount(&mock_server)
            .await;

        // Act
        let outcome = store.save_contact(&email(), Utc::now()).await;

        // Assert
        match outcome {
            Err(ContactStoreError::Rejected { status, body }) => {
                assert_eq!(400, status.as_u16());
                assert_eq!("database not shared", body);
            }
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn save_contact_times_out_if_the_server_takes_too_long() {
        let mock_server = MockServer::start().await;

        let store = contact_store(mock_server.uri());
        let response = ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(180));

        Mock::given(any())
            .respond_with(response)
            .expect(1)
            .mount(&mock_server)
            .await;

        // Act
        let outcome = store.save_contact(&email(), Utc::now()).await;

        // Assert
        assert_err!(outcome);
    }
}
