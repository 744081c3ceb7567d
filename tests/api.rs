//! End-to-end tests of the reqwest transport and outcome classification
//! against a local mock server.

use photos_api::login::{Credentials, LoginOutcome};
use photos_api::{context, ApiRequest, Config, Error, Method, Params};
use serde_json::json;

fn config_for(server: &mockito::Server) -> Config {
    Config::new(server.url())
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn get_sends_parameters_in_the_query() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/photos")
        .match_query(mockito::Matcher::UrlEncoded(
            "album".into(),
            "summer".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"photos":[]}"#)
        .create_async()
        .await;

    let request = ApiRequest::with_config(
        &config_for(&server),
        Method::Get,
        "/photos",
        Some(params(&[("album", "summer")])),
    );

    let body = request
        .perform(&reqwest::Client::new())
        .await
        .expect("request should succeed");
    assert_eq!(body.get("photos"), Some(&json!([])));

    mock.assert_async().await;
}

#[tokio::test]
async fn post_sends_the_encoded_form_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/auth/token")
        .match_header(
            "content-type",
            mockito::Matcher::Regex("application/x-www-form-urlencoded.*".to_string()),
        )
        .match_body("email_address=sam%40example.com&password=hunter2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"abc"}"#)
        .create_async()
        .await;

    let request = ApiRequest::with_config(
        &config_for(&server),
        Method::Post,
        "/auth/token",
        Some(params(&[
            ("email_address", "sam@example.com"),
            ("password", "hunter2"),
        ])),
    );

    let body = request
        .perform(&reqwest::Client::new())
        .await
        .expect("request should succeed");
    assert_eq!(body.get("access_token"), Some(&json!("abc")));

    mock.assert_async().await;
}

#[tokio::test]
async fn a_403_with_json_body_is_a_response_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/auth/token")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"bad credentials"}"#)
        .create_async()
        .await;

    let request =
        ApiRequest::with_config(&config_for(&server), Method::Post, "/auth/token", None);

    match request
        .perform(&reqwest::Client::new())
        .await
        .expect_err("request should fail")
    {
        Error::Response { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body.get("error"), Some(&json!("bad credentials")));
        }
        other => panic!("expected a response error, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn a_non_json_body_is_an_invalid_format() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/photos")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let request = ApiRequest::with_config(&config_for(&server), Method::Get, "/photos", None);

    let error = request
        .perform(&reqwest::Client::new())
        .await
        .expect_err("request should fail");
    assert!(matches!(error, Error::InvalidResponseFormat));

    mock.assert_async().await;
}

#[tokio::test]
async fn an_unreachable_server_is_a_transport_error() {
    // Port 9 (discard) refuses connections on any sane machine.
    let config = Config::new("http://127.0.0.1:9");
    let request = ApiRequest::with_config(&config, Method::Get, "/photos", None);

    let error = request
        .perform(&reqwest::Client::new())
        .await
        .expect_err("request should fail");
    assert!(matches!(error, Error::Transport(_)));
}

#[tokio::test]
async fn login_round_trip_authenticates() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/auth/token")
        .match_body("email_address=sam%40example.com&password=hunter2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"abc"}"#)
        .create_async()
        .await;

    let credentials = Credentials::new("sam@example.com", "hunter2").expect("valid credentials");
    let request = credentials.token_request_with(&config_for(&server));

    let (ctx, mut main_loop) = context::channel();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    request.send(reqwest::Client::new(), &ctx, move |result| {
        let _ = done_tx.send(LoginOutcome::from_result(result));
    });

    assert!(main_loop.turn().await);
    let outcome = done_rx.await.expect("completion ran");
    assert_eq!(
        outcome,
        LoginOutcome::Authenticated {
            access_token: "abc".into()
        }
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn login_round_trip_rejects_bad_credentials() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/auth/token")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"bad credentials"}"#)
        .create_async()
        .await;

    let credentials = Credentials::new("sam@example.com", "wrong").expect("valid credentials");
    let request = credentials.token_request_with(&config_for(&server));

    let outcome = LoginOutcome::from_result(request.perform(&reqwest::Client::new()).await);
    assert_eq!(outcome, LoginOutcome::IncorrectCredentials);

    mock.assert_async().await;
}
