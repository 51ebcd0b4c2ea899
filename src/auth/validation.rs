use crate::core::error::CredentialError;
use crate::models::auth::RegisterRequest;

/// Registration input that passed validation
#[derive(Debug)]
pub struct ValidatedRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidatedRegistration, CredentialError> {
        if self.username.is_empty() || self.email.is_empty() || self.password.is_empty() {
            return Err(CredentialError::Validation(
                "Username, Email and Password are required".to_string(),
            ));
        }

        if !is_valid_email(&self.email) {
            return Err(CredentialError::Validation("Invalid email format".to_string()));
        }

        Ok(ValidatedRegistration {
            username: self.username,
            email: self.email,
            password: self.password,
        })
    }
}

/// Check `local@domain.tld` shape
///
/// Exactly one '@', no whitespace anywhere, a non-empty local part, and a
/// domain holding a '.' with at least one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(is_js_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// The `\s` class of ECMAScript regexes
///
/// Unicode White_Space minus U+0085, plus the U+FEFF byte order mark.
fn is_js_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}
