#![warn(clippy::all, clippy::perf, clippy::style, clippy::suspicious)]

//! Client bindings for the Photos HTTP API.
//!
//! A request is built once from a verb, an endpoint, and optional form
//! parameters, then sent over a pluggable transport. The outcome, either the
//! parsed JSON body or a classified error, is delivered through a completion
//! that runs exactly once on the application's callback loop.
//!
//! ```no_run
//! use photos_api::login::{Credentials, LoginOutcome};
//! use photos_api::{config, context};
//!
//! # async fn demo() -> Result<(), photos_api::config::ConfigError> {
//! config::init_from_env()?;
//!
//! let (ctx, main_loop) = context::channel();
//!
//! let credentials = Credentials::new("sam@example.com", "hunter2").expect("filled in");
//! credentials
//!     .token_request()
//!     .send(reqwest::Client::new(), &ctx, |result| {
//!         match LoginOutcome::from_result(result) {
//!             LoginOutcome::Authenticated { .. } => println!("logged in"),
//!             LoginOutcome::IncorrectCredentials => eprintln!("incorrect email/password"),
//!             LoginOutcome::Failed => eprintln!("something went wrong"),
//!         }
//!     });
//!
//! main_loop.run().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod login;
pub mod method;
pub mod request;

use thiserror::Error;

pub use client::{ApiClient, RawResponse, TransportError};
pub use config::Config;
pub use context::{CallbackContext, CallbackLoop};
pub use method::Method;
pub use request::{ApiRequest, ParamEncoding, Params, PreparedRequest};

/// A decoded response body. The API always answers with a top-level JSON
/// object; anything else is an invalid response.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Everything that can go wrong between `send` and the completion. Exactly
/// one of these or the parsed body reaches the completion, never both.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response.
    #[error("api request failed with network error")]
    Transport(#[from] TransportError),

    /// The response body could not be decoded as a JSON object.
    #[error("api response couldn't be decoded as a json object")]
    InvalidResponseFormat,

    /// The server answered with a JSON body but a status other than 200. The
    /// body is kept so callers can inspect server-provided detail.
    #[error("api returned http status '{status}'")]
    Response { status: u16, body: JsonObject },
}

impl Error {
    /// The HTTP status for [`Error::Response`], `None` otherwise.
    pub fn response_status(&self) -> Option<u16> {
        match self {
            Error::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-provided body for [`Error::Response`], `None` otherwise.
    pub fn response_body(&self) -> Option<&JsonObject> {
        match self {
            Error::Response { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_response_with_status(&self, status: u16) -> bool {
        self.response_status() == Some(status)
    }
}

pub mod prelude {
    pub use super::{ApiClient, ApiRequest, CallbackContext, Config, Error, Method};
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn response_accessors_only_apply_to_response_errors() {
        let mut body = JsonObject::new();
        body.insert("error".into(), json!("bad credentials"));

        let response = Error::Response { status: 403, body };
        assert_eq!(response.response_status(), Some(403));
        assert!(response.is_response_with_status(403));
        assert!(!response.is_response_with_status(500));
        assert_eq!(
            response.response_body().and_then(|b| b.get("error")),
            Some(&json!("bad credentials"))
        );

        let invalid = Error::InvalidResponseFormat;
        assert_eq!(invalid.response_status(), None);
        assert!(invalid.response_body().is_none());
    }
}
