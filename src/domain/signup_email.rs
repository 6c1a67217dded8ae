//! src/domain/signup_email.rs

#[derive(Debug, Clone)]
pub struct SignupEmail(String);

impl SignupEmail {
    /// The only requirement is a non-empty value containing an `@`; no
    /// further format or deliverability checking happens before the
    /// address is handed to the upstream services.
    pub fn parse(s: String) -> Result<SignupEmail, String> {
        if s.is_empty() || !s.contains('@') {
            return Err(format!("{} is not a valid signup email.", s));
        }

        Ok(Self(s))
    }
}

impl AsRef<str> for SignupEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignupEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
