//! Login and registration forms.
//!
//! Both forms validate locally before anything is sent; a successful
//! response stores the issued token in the client's `Session`. Persisting the
//! token is left to the host's `TokenStore`.

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::client::ApiClient;
use crate::error::{ApiError, FieldErrors, FormError, GENERIC_ERROR_MESSAGE};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::AuthToken;

/// Shown when a failed login carries no server message.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Incorrect email or password";

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn build_submit(&self, client: &ApiClient) -> Result<HttpRequest, FormError> {
        self.validate().map_err(|e| FormError::Invalid(field_errors(&e)))?;
        Ok(client.build_login(self)?)
    }
}

impl RegisterForm {
    pub fn build_submit(&self, client: &ApiClient) -> Result<HttpRequest, FormError> {
        self.validate().map_err(|e| FormError::Invalid(field_errors(&e)))?;
        Ok(client.build_register(self)?)
    }
}

/// Parse a login/register response and, on success, store the token in the
/// client's session.
pub fn complete_auth(
    client: &mut ApiClient,
    result: Result<HttpResponse, ApiError>,
) -> Result<AuthToken, ApiError> {
    let token = result.and_then(|response| client.parse_auth(response))?;
    client.set_token(token.token.clone());
    tracing::info!("session token stored");
    Ok(token)
}

pub fn login_error_message(err: &ApiError) -> String {
    err.display_message(LOGIN_FALLBACK_MESSAGE)
}

/// Server message if present, otherwise the raw error body, otherwise a
/// generic message.
pub fn register_error_message(err: &ApiError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    match err {
        ApiError::Http { body, .. } if !body.trim().is_empty() => body.clone(),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// Flatten `validator` output into one message per field.
pub(crate) fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000/api", Session::new())
    }

    fn response(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    #[test]
    fn login_validation_blocks_submission() {
        let err = LoginForm::new("not-an-email", "123").build_submit(&client()).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["email"], "Enter a valid email address");
        assert_eq!(fields["password"], "Password must be at least 6 characters");
    }

    #[test]
    fn register_requires_name() {
        let form = RegisterForm {
            name: String::new(),
            email: "a@b.co".into(),
            password: "secret1".into(),
        };
        let err = form.build_submit(&client()).unwrap_err();
        assert_eq!(err.field_errors().unwrap().keys().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn successful_login_stores_token() {
        let mut c = client();
        let req = LoginForm::new("admin@example.com", "secret1").build_submit(&c).unwrap();
        assert_eq!(req.path, "http://localhost:8000/api/login");

        let token = complete_auth(&mut c, response(200, r#"{"token":"abc123"}"#)).unwrap();
        assert_eq!(token.token, "abc123");
        assert_eq!(c.session().token(), Some("abc123"));
    }

    #[test]
    fn wrong_credentials_show_server_message() {
        let mut c = client();
        let err = complete_auth(&mut c, response(401, r#"{"message":"Invalid credentials"}"#)).unwrap_err();
        assert_eq!(login_error_message(&err), "Invalid credentials");
        assert!(!c.session().is_authenticated());

        let err = complete_auth(&mut c, response(422, r#"{"message":"Account is locked"}"#)).unwrap_err();
        assert_eq!(login_error_message(&err), "Account is locked");
    }

    #[test]
    fn login_without_message_uses_fallback() {
        let mut c = client();
        let err = complete_auth(&mut c, response(401, "{}")).unwrap_err();
        assert_eq!(login_error_message(&err), LOGIN_FALLBACK_MESSAGE);
        let err = complete_auth(&mut c, Err(ApiError::Transport("down".into()))).unwrap_err();
        assert_eq!(login_error_message(&err), LOGIN_FALLBACK_MESSAGE);
    }

    #[test]
    fn register_error_falls_back_to_raw_body() {
        let mut c = client();
        let err = complete_auth(&mut c, response(409, "email already taken")).unwrap_err();
        assert_eq!(register_error_message(&err), "email already taken");

        let err = complete_auth(&mut c, response(422, r#"{"message":"The email has already been taken."}"#)).unwrap_err();
        assert_eq!(register_error_message(&err), "The email has already been taken.");
    }
}
