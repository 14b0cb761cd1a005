//! Request helpers shared by the API accessors.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::endpoint;
use crate::error::Result;
use crate::session::{AuthMode, RawResponse, RequestBody, RequestOptions, Session};

impl Session {
    /// GET an API endpoint and decode its JSON body.
    pub(crate) async fn api_get<T: DeserializeOwned>(
        &self,
        name: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let options = RequestOptions::new(AuthMode::Either).queries(query);
        self.request(Method::GET, &endpoint(name), options)
            .await?
            .json()
    }

    /// POST a JSON body to an API endpoint.
    pub(crate) async fn api_post(&self, name: &str, body: Value) -> Result<RawResponse> {
        let options = RequestOptions::new(AuthMode::Either)
            .anti_csrf()
            .body(RequestBody::Json(body));
        self.request(Method::POST, &endpoint(name), options).await
    }
}
