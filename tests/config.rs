//! Config, VFS and account accessors.

mod common;

use common::{header, requests_with, session};
use hfsapi::{ConfigFilter, HfsError, Who};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header as has_header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_config_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/~/api/get_config"))
        .and(query_param("omit", "accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "port": 8280 })))
        .mount(&server)
        .await;

    let filter = ConfigFilter {
        only: vec!["port".into(), "vfs".into()],
        omit: vec!["accounts".into()],
    };
    let config = session(&server).get_config(&filter).await.unwrap();
    assert_eq!(config.get("port"), Some(&json!(8280)));

    let request = &requests_with(&server, "GET").await[0];
    let only: Vec<String> = request
        .url
        .query_pairs()
        .filter(|(k, _)| k == "only")
        .map(|(_, v)| v.into_owned())
        .collect();
    assert_eq!(only, vec!["port", "vfs"]);
}

#[tokio::test]
async fn test_set_config_posts_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/~/api/set_config"))
        .and(has_header("x-hfs-anti-csrf", "1"))
        .and(body_json(json!({ "values": { "port": 8081, "title": "home" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut values = Map::new();
    values.insert("port".into(), json!(8081));
    values.insert("title".into(), Value::String("home".into()));
    session(&server).set_config(values).await.unwrap();
}

#[tokio::test]
async fn test_set_config_requires_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = session(&server).set_config(Map::new()).await.unwrap_err();
    assert!(matches!(err, HfsError::Auth { .. }));
}

#[tokio::test]
async fn test_get_vfs_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/~/api/get_config"))
        .and(query_param("only", "vfs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vfs": {
                "children": [
                    { "source": "/srv/data", "can_upload": ["abct"], "can_delete": ["abct"] },
                    { "name": "pub", "can_see": true }
                ]
            }
        })))
        .mount(&server)
        .await;

    let vfs = session(&server).get_vfs().await.unwrap();
    let data = vfs.find("data").unwrap();
    assert_eq!(data.source.as_deref(), Some("/srv/data"));
    assert_eq!(data.can_upload, Some(Who::Accounts(vec!["abct".into()])));
    assert_eq!(vfs.find("pub").unwrap().can_see, Some(Who::Flag(true)));
}

#[tokio::test]
async fn test_get_vfs_missing_key_is_empty_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let vfs = session(&server).get_vfs().await.unwrap();
    assert!(vfs.children.is_empty());
}

#[tokio::test]
async fn test_accounts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/~/api/get_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{ "username": "abct", "admin": true }, { "username": "guest" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~/api/get_usernames"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": ["abct", "guest"] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~/api/get_account"))
        .and(query_param("username", "guest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "guest" })))
        .mount(&server)
        .await;

    let session = session(&server);
    let accounts = session.get_accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].admin, Some(true));
    assert_eq!(session.get_usernames().await.unwrap(), vec!["abct", "guest"]);
    assert_eq!(session.get_account("guest").await.unwrap().username, "guest");

    for request in requests_with(&server, "GET").await {
        assert_eq!(header(&request, "authorization"), Some("Basic YWJjdDphYmMxMjM="));
    }
}
