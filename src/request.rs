//! Request construction, parameter encoding, and dispatch.

use std::collections::BTreeMap;

use crate::client::{ApiClient, RawResponse, TransportError};
use crate::config::{self, Config};
use crate::context::CallbackContext;
use crate::method::Method;
use crate::{Error, JsonObject};

/// Flat key/value request parameters. A `BTreeMap` keeps iteration order
/// stable, so identical inputs always build byte-identical requests.
pub type Params = BTreeMap<String, String>;

/// How parameter keys and values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamEncoding {
    /// Escape only `! * ' ( ) ; : @ & = + $ , / ? % # [ ]`, leaving every
    /// other character (spaces included) untouched. This is what the deployed
    /// server expects; it under-encodes, so prefer [`ParamEncoding::Form`]
    /// anywhere wire compatibility is not a concern.
    #[default]
    Compat,

    /// Standard `application/x-www-form-urlencoded`: unreserved characters
    /// pass, space becomes `+`, every other byte is percent-escaped.
    Form,
}

const COMPAT_ESCAPED: &[u8] = b"!*'();:@&=+$,/?%#[]";

fn push_escaped(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    out.push('%');
    out.push(HEX[usize::from(byte >> 4)] as char);
    out.push(HEX[usize::from(byte & 0x0f)] as char);
}

fn escape(input: &str, encoding: ParamEncoding) -> String {
    let mut out = String::with_capacity(input.len());

    match encoding {
        ParamEncoding::Compat => {
            for ch in input.chars() {
                if ch.is_ascii() && COMPAT_ESCAPED.contains(&(ch as u8)) {
                    push_escaped(&mut out, ch as u8);
                } else {
                    out.push(ch);
                }
            }
        }
        ParamEncoding::Form => {
            for &byte in input.as_bytes() {
                match byte {
                    b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                        out.push(byte as char)
                    }
                    b' ' => out.push('+'),
                    _ => push_escaped(&mut out, byte),
                }
            }
        }
    }

    out
}

fn encode_pairs(params: &Params, encoding: ParamEncoding) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, encoding), escape(value, encoding)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The fully assembled request: final URL plus, for non-GET verbs, the
/// encoded body. Derived once at construction and never rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    method: Method,
    url: String,
    body: Option<String>,
}

impl PreparedRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The body as the UTF-8 bytes that go on the wire.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref().map(str::as_bytes)
    }
}

fn prepare(
    base_url: &str,
    method: Method,
    end_point: &str,
    parameters: Option<&Params>,
    encoding: ParamEncoding,
) -> PreparedRequest {
    // Concatenated, never parsed or normalised.
    let target = format!("{base_url}{end_point}");

    let Some(params) = parameters else {
        return PreparedRequest {
            method,
            url: target,
            body: None,
        };
    };

    let pairs = encode_pairs(params, encoding);

    match method {
        Method::Get => {
            // The encoded pairs replace any query already on the endpoint.
            let path = match target.split_once('?') {
                Some((path, _)) => path,
                None => target.as_str(),
            };

            PreparedRequest {
                method,
                url: format!("{path}?{pairs}"),
                body: None,
            }
        }
        _ => PreparedRequest {
            method,
            url: target,
            body: Some(pairs),
        },
    }
}

/// One prepared, not-yet-sent call against the Photos API.
///
/// The target URL and body are derived from the constructor inputs alone and
/// never change afterwards. Sending is side-effect free on the request
/// itself: a request can be sent again, and no state about earlier sends is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    end_point: String,
    parameters: Option<Params>,
    prepared: PreparedRequest,
}

impl ApiRequest {
    /// Builds a request against the process-wide configuration.
    ///
    /// # Panics
    ///
    /// Panics when [`config::init`] was never called, like
    /// [`config::global`].
    pub fn new<S>(method: Method, end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::with_config(config::global(), method, end_point, parameters)
    }

    /// Builds a request against an injected configuration.
    pub fn with_config<S>(
        config: &Config,
        method: Method,
        end_point: S,
        parameters: Option<Params>,
    ) -> Self
    where
        S: Into<String>,
    {
        Self::with_encoding(
            config,
            method,
            end_point,
            parameters,
            ParamEncoding::default(),
        )
    }

    /// Builds a request with an explicit parameter encoding.
    pub fn with_encoding<S>(
        config: &Config,
        method: Method,
        end_point: S,
        parameters: Option<Params>,
        encoding: ParamEncoding,
    ) -> Self
    where
        S: Into<String>,
    {
        let end_point = end_point.into();
        let prepared = prepare(
            config.base_url(),
            method,
            &end_point,
            parameters.as_ref(),
            encoding,
        );

        Self {
            method,
            end_point,
            parameters,
            prepared,
        }
    }

    /// `GET` convenience constructor, the default verb.
    pub fn get<S>(end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Get, end_point, parameters)
    }

    /// `POST` convenience constructor.
    pub fn post<S>(end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Post, end_point, parameters)
    }

    /// `PUT` convenience constructor.
    pub fn put<S>(end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Put, end_point, parameters)
    }

    /// `PATCH` convenience constructor.
    pub fn patch<S>(end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Patch, end_point, parameters)
    }

    /// `DELETE` convenience constructor.
    pub fn delete<S>(end_point: S, parameters: Option<Params>) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Delete, end_point, parameters)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn end_point(&self) -> &str {
        &self.end_point
    }

    pub fn parameters(&self) -> Option<&Params> {
        self.parameters.as_ref()
    }

    /// The assembled target this request will put on the wire.
    pub fn prepared(&self) -> &PreparedRequest {
        &self.prepared
    }

    /// Executes the request on `client` and classifies the outcome.
    ///
    /// Classification order: transport failures first, then bodies that are
    /// not JSON objects, then any status other than 200, and finally the
    /// parsed body itself.
    pub async fn perform<C>(&self, client: &C) -> Result<JsonObject, Error>
    where
        C: ApiClient,
    {
        perform_prepared(client, &self.prepared).await
    }

    /// Sends the request in the background and posts `completion` to
    /// `context`, where it runs exactly once, and never synchronously before
    /// `send` itself has returned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send<C, F>(&self, client: C, context: &CallbackContext, completion: F)
    where
        C: ApiClient + 'static,
        F: FnOnce(Result<JsonObject, Error>) + Send + 'static,
    {
        let prepared = self.prepared.clone();
        let context = context.clone();

        tokio::spawn(async move {
            let result = perform_prepared(&client, &prepared).await;
            context.post(move || completion(result));
        });
    }
}

async fn perform_prepared<C>(client: &C, prepared: &PreparedRequest) -> Result<JsonObject, Error>
where
    C: ApiClient,
{
    log::debug!("{} {}", prepared.method(), prepared.url());

    let response = client
        .execute(prepared)
        .await
        .map_err(|e| Error::Transport(TransportError::new(e)))?;

    classify(response)
}

fn classify(response: RawResponse) -> Result<JsonObject, Error> {
    let value: serde_json::Value =
        serde_json::from_slice(&response.body).map_err(|_| Error::InvalidResponseFormat)?;

    let serde_json::Value::Object(body) = value else {
        return Err(Error::InvalidResponseFormat);
    };

    if response.status != 200 {
        log::debug!("api answered with status {}", response.status);
        return Err(Error::Response {
            status: response.status,
            body,
        });
    }

    Ok(body)
}
