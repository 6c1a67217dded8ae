use std::net::TcpListener;

use once_cell::sync::Lazy;
use secrecy::Secret;
use wiremock::MockServer;

use waitlist::config::get_configuration;
use waitlist::startup::SignupServices;
use waitlist::telemetry::{get_subscriber, init_subscriber};

static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        init_subscriber(get_subscriber(
            "test".into(),
            "debug".into(),
            std::io::stdout,
        ));
    } else {
        init_subscriber(get_subscriber("test".into(), "debug".into(), std::io::sink));
    }
});

pub struct TestApp {
    pub addr: String,
    pub contact_store_server: MockServer,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn post_signup(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/waitlist", self.addr))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_keys(true, true).await
}

/// Starts the service against two mock upstreams. Passing `false` leaves
/// the matching credential unset, which disables that sub-operation the
/// same way a missing environment variable does in deployment.
pub async fn spawn_app_with_keys(contact_store_key: bool, email_key: bool) -> TestApp {
    Lazy::force(&TRACING);

    let contact_store_server = MockServer::start().await;
    let email_server = MockServer::start().await;

    let mut configuration = get_configuration().expect("should load configuration");
    configuration.contact_store.base_url = contact_store_server.uri();
    configuration.contact_store.request_timeout_ms = 200;
    configuration.contact_store.api_key =
        contact_store_key.then(|| Secret::new("store-test-key".to_string()));
    configuration.email_client.base_url = email_server.uri();
    configuration.email_client.send_timeout_ms = 200;
    configuration.email_client.api_key =
        email_key.then(|| Secret::new("email-test-key".to_string()));

    let listener = TcpListener::bind(format!("{}:0", configuration.app.host.clone()))
        .expect("failed to bind to random port");
    let port = listener.local_addr().unwrap().port();

    let services = SignupServices::from_configuration(&configuration);
    let server = waitlist::run::run(listener, services).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    let hostname = configuration.app.host.clone();
    TestApp {
        addr: format!("http://{}:{}", hostname, port),
        contact_store_server,
        email_server,
    }
}
