use secrecy::Secret;
use serde_aux::prelude::deserialize_number_from_string;

use crate::domain::signup_email::SignupEmail;

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other,
            )),
        }
    }
}

/// Settings for the Notion-backed contact store.
///
/// `api_key` is optional on purpose: when it is absent the waitlist handler
/// skips the save entirely instead of failing the request.
#[derive(serde::Deserialize, Clone)]
pub struct ContactStoreSettings {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_ms: u64,
}

/// Settings for the transactional email API.
///
/// Same deal as the contact store: a missing `api_key` disables sending
/// rather than breaking signups.
#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub sender_email: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub send_timeout_ms: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SignupEmail, String> {
        SignupEmail::parse(self.sender_email.clone())
    }
}

#[derive(serde::Deserialize)]
pub struct AppConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(serde::Deserialize)]
pub struct Configuration {
    pub app: AppConfig,
    pub contact_store: ContactStoreSettings,
    pub email_client: EmailClientSettings,
}

pub fn get_configuration() -> Result<Configuration, config::ConfigError> {
    // initialize our configuration reader
    let mut settings = config::Config::default();

    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Read in default configuration
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    // Read in layer environment specific file.
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;

    // Environment variables win over files; this is how the two API keys
    // reach the process in deployment, e.g. APP_CONTACT_STORE__API_KEY.
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    // try converting settings into `Configuration` object.
    return settings.try_into();
}
