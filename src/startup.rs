use std::net::TcpListener;

use actix_web::dev::Server;

use crate::config::Configuration;
use crate::mail::send_email::EmailClient;
use crate::run::run;
use crate::store::contact_store::ContactStore;

/// The outbound collaborators of the signup handler, built once at startup
/// and shared across requests. A `None` client means its credential was
/// not configured: the matching sub-operation is skipped for every
/// request, which is a deliberate degraded mode rather than an error.
pub struct SignupServices {
    pub contact_store: Option<ContactStore>,
    pub email_client: Option<EmailClient>,
}

impl SignupServices {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let contact_store = match configuration.contact_store.api_key.clone() {
            Some(api_key) => Some(ContactStore::new(&configuration.contact_store, api_key)),
            None => {
                tracing::info!("Contact store api key not configured; signups will not be saved");
                None
            }
        };

        let email_client = match configuration.email_client.api_key.clone() {
            Some(api_key) => {
                let sender = configuration
                    .email_client
                    .sender()
                    .expect("invalid sender email address.");
                Some(EmailClient::new(&configuration.email_client, sender, api_key))
            }
            None => {
                tracing::info!(
                    "Email api key not configured; confirmation emails will not be sent"
                );
                None
            }
        };

        Self {
            contact_store,
            email_client,
        }
    }
}

pub struct AppServer {
    port: u16,
    address: String,
    server: Server,
}

impl AppServer {
    pub async fn build(configuration: Configuration) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.app.host, configuration.app.port
        ))
        .expect("failed to bind to random port");

        tracing::info!(
            "Starting service on address: {}",
            listener.local_addr().unwrap()
        );

        let services = SignupServices::from_configuration(&configuration);

        let address = configuration.app.host.clone();
        let port = listener.local_addr().unwrap().port();
        let server = run(listener, services)?;

        Ok(Self {
            port,
            address,
            server,
        })
    }

    pub fn to_server_address(&self) -> String {
        format!("{}:{}", self.address.clone(), self.port.clone())
    }

    pub fn address(&self) -> String {
        self.address.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
