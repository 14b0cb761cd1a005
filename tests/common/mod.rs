//! Shared helpers for protocol tests against a mocked HFS server.
#![allow(dead_code)]

use hfsapi::{ClientConfig, Session};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const USERNAME: &str = "abct";
pub const PASSWORD: &str = "abc123";
pub const SESSION_COOKIE: &str = "hfs_http=s3ss10n";

/// Session with the test credentials.
pub fn session(server: &MockServer) -> Session {
    let config = ClientConfig::new(server.uri()).with_credentials(USERNAME, PASSWORD);
    Session::new(config).unwrap()
}

pub fn session_as(server: &MockServer, username: &str, password: &str) -> Session {
    let config = ClientConfig::new(server.uri()).with_credentials(username, password);
    Session::new(config).unwrap()
}

pub fn anonymous(server: &MockServer) -> Session {
    Session::anonymous(&server.uri()).unwrap()
}

/// Accept `?login=user:pass` and hand out the session cookie.
pub async fn mount_login(server: &MockServer, username: &str, password: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("login", format!("{}:{}", username, password)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{}; Path=/; HttpOnly", SESSION_COOKIE)),
        )
        .mount(server)
        .await;
}

/// Requests received so far with the given method, in arrival order.
pub async fn requests_with(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .collect()
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
