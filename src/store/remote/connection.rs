use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;

use crate::store::error::{internal_error, unavailable, StoreResult};
use crate::store::model::DatabaseId;

use super::rpc_error::map_http_error;

const FIRESTORE_API_HOST: &str = "https://firestore.googleapis.com";
const FIRESTORE_API_VERSION: &str = "v1";

#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    base_url: String,
}

#[derive(Clone, Debug)]
pub struct ConnectionBuilder {
    database_id: DatabaseId,
    client: Option<Client>,
    emulator_host: Option<String>,
}

#[derive(Default, Clone, Debug)]
pub struct RequestContext {
    pub auth_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl ConnectionBuilder {
    pub fn new(database_id: DatabaseId) -> Self {
        Self {
            database_id,
            client: None,
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST").ok(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn build(self) -> StoreResult<Connection> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .build()
                .map_err(|err| internal_error(err.to_string()))?,
        };
        let base_url = build_base_url(&self.database_id, self.emulator_host.as_deref());
        Ok(Connection { client, base_url })
    }
}

impl Connection {
    pub fn builder(database_id: DatabaseId) -> ConnectionBuilder {
        ConnectionBuilder::new(database_id)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn invoke_json(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        context: &RequestContext,
    ) -> StoreResult<JsonValue> {
        match self.send(method, path, body, context).await? {
            (status, text) if status.is_success() => parse_body(&text),
            (status, text) => Err(map_http_error(status, &text)),
        }
    }

    /// Like [`invoke_json`](Self::invoke_json) but maps `404 Not Found` to `Ok(None)`.
    pub async fn invoke_json_optional(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        context: &RequestContext,
    ) -> StoreResult<Option<JsonValue>> {
        match self.send(method, path, body, context).await? {
            (status, text) if status.is_success() => parse_body(&text).map(Some),
            (StatusCode::NOT_FOUND, _) => Ok(None),
            (status, text) => Err(map_http_error(status, &text)),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        context: &RequestContext,
    ) -> StoreResult<(StatusCode, String)> {
        let mut request = self.build_request(method, path, context);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() || err.is_connect() {
                unavailable(err.to_string())
            } else {
                internal_error(err.to_string())
            }
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| internal_error(err.to_string()))?;
        Ok((status, text))
    }

    fn build_request(&self, method: Method, path: &str, context: &RequestContext) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self.client.request(method, url);
        if let Some(timeout) = context.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(token) = context.auth_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder.header("Content-Type", "application/json")
    }
}

fn parse_body(text: &str) -> StoreResult<JsonValue> {
    if text.is_empty() {
        Ok(JsonValue::Null)
    } else {
        serde_json::from_str(text).map_err(|err| internal_error(err.to_string()))
    }
}

fn build_base_url(database_id: &DatabaseId, emulator_host: Option<&str>) -> String {
    match emulator_host {
        Some(host) => format!(
            "http://{host}/{FIRESTORE_API_VERSION}/{}",
            database_id.database_name()
        ),
        None => format!(
            "{FIRESTORE_API_HOST}/{FIRESTORE_API_VERSION}/{}",
            database_id.database_name()
        ),
    }
}
