//! The non-UI core of the login flow: credential validation, the token
//! request, and outcome classification. Presentation stays with the caller.

use serde::Deserialize;

use crate::config::Config;
use crate::method::Method;
use crate::request::{ApiRequest, Params};
use crate::{Error, JsonObject};

/// Endpoint exchanging credentials for an access token.
pub const TOKEN_END_POINT: &str = "/auth/token";

/// Status the server answers with when the email/password combination is
/// wrong.
const INCORRECT_CREDENTIALS_STATUS: u16 = 403;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("email address must not be empty")]
    MissingEmailAddress,

    #[error("password must not be empty")]
    MissingPassword,
}

/// Validated login form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email_address: String,
    password: String,
}

impl Credentials {
    pub fn new<E, P>(email_address: E, password: P) -> Result<Self, CredentialsError>
    where
        E: Into<String>,
        P: Into<String>,
    {
        let email_address = email_address.into();
        let password = password.into();

        if email_address.is_empty() {
            return Err(CredentialsError::MissingEmailAddress);
        }
        if password.is_empty() {
            return Err(CredentialsError::MissingPassword);
        }

        Ok(Self {
            email_address,
            password,
        })
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert("email_address".to_owned(), self.email_address.clone());
        params.insert("password".to_owned(), self.password.clone());

        params
    }

    /// Builds the token request against the process-wide configuration.
    pub fn token_request(&self) -> ApiRequest {
        ApiRequest::post(TOKEN_END_POINT, Some(self.params()))
    }

    /// Builds the token request against an injected configuration.
    pub fn token_request_with(&self, config: &Config) -> ApiRequest {
        ApiRequest::with_config(config, Method::Post, TOKEN_END_POINT, Some(self.params()))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// What the login flow does with a completed token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; the token authenticates later requests.
    Authenticated { access_token: String },

    /// The server rejected the email/password combination.
    IncorrectCredentials,

    /// Anything else: transport trouble, a malformed response, a server
    /// error, or a success body without a token.
    Failed,
}

impl LoginOutcome {
    pub fn from_result(result: Result<JsonObject, Error>) -> Self {
        match result {
            Ok(body) => {
                match serde_json::from_value::<TokenResponse>(serde_json::Value::Object(body)) {
                    Ok(token) => LoginOutcome::Authenticated {
                        access_token: token.access_token,
                    },
                    Err(_) => {
                        log::warn!("token response carries no usable 'access_token'");
                        LoginOutcome::Failed
                    }
                }
            }
            Err(error) if error.is_response_with_status(INCORRECT_CREDENTIALS_STATUS) => {
                LoginOutcome::IncorrectCredentials
            }
            Err(error) => {
                log::warn!("token request failed: {error}");
                LoginOutcome::Failed
            }
        }
    }
}
