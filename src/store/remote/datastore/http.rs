use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Method;
use serde_json::{json, Value as JsonValue};

use crate::store::constants::{DOCUMENT_ID_FIELD, MAX_IN_FILTER_SIZE};
use crate::store::error::{internal_error, invalid_argument, not_found, StoreError, StoreErrorCode, StoreResult};
use crate::store::model::{DatabaseId, DocumentKey};
use crate::store::remote::connection::{Connection, ConnectionBuilder, RequestContext};
use crate::store::remote::serializer::{quote_field_path, ArrayTransform, JsonProtoSerializer};
use crate::store::snapshot::DocumentSnapshot;
use crate::store::value::StoreValue;

use super::{DocumentStore, NoopTokenProvider, TokenProviderArc};

/// Document store speaking the Firestore REST API (or its emulator).
#[derive(Clone)]
pub struct HttpDocumentStore {
    connection: Connection,
    serializer: JsonProtoSerializer,
    auth_provider: TokenProviderArc,
    retry: RetrySettings,
    max_batch_size: usize,
}

#[derive(Clone)]
pub struct HttpDocumentStoreBuilder {
    database_id: DatabaseId,
    connection_builder: ConnectionBuilder,
    auth_provider: TokenProviderArc,
    retry: RetrySettings,
    max_batch_size: usize,
}

#[derive(Clone, Debug)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            multiplier: 1.5,
            max_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl HttpDocumentStore {
    pub fn builder(database_id: DatabaseId) -> HttpDocumentStoreBuilder {
        HttpDocumentStoreBuilder::new(database_id)
    }

    pub fn from_database_id(database_id: DatabaseId) -> StoreResult<Self> {
        Self::builder(database_id).build()
    }

    async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> StoreResult<T>
    where
        F: FnMut(RequestContext) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 0usize;
        loop {
            let context = self.build_request_context().await?;
            match operation(context).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !self.retry.should_retry(attempt, &err) {
                        return Err(err);
                    }

                    if err.code == StoreErrorCode::Unauthenticated {
                        self.auth_provider.invalidate_token();
                    }

                    let delay = self.retry.backoff_delay(attempt);
                    log::debug!("retrying store request after {delay:?}: {err}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn build_request_context(&self) -> StoreResult<RequestContext> {
        let auth_token = self.auth_provider.get_token().await?;
        Ok(RequestContext {
            auth_token,
            request_timeout: Some(self.retry.request_timeout),
        })
    }

    fn document_path(key: &DocumentKey) -> String {
        format!("documents/{}", key.canonical_string())
    }

    async fn commit(&self, writes: Vec<JsonValue>, transaction: Option<&str>) -> StoreResult<()> {
        let mut body = json!({ "writes": writes });
        if let Some(transaction) = transaction {
            body["transaction"] = json!(transaction);
        }
        self.execute_with_retry(|context| {
            let body = body.clone();
            async move {
                self.connection
                    .invoke_json(Method::POST, "documents:commit", Some(body), &context)
                    .await
                    .map(|_| ())
            }
        })
        .await
    }

    async fn run_query(&self, structured_query: JsonValue) -> StoreResult<Vec<DocumentSnapshot>> {
        let body = json!({ "structuredQuery": structured_query });
        let response = self
            .execute_with_retry(|context| {
                let body = body.clone();
                async move {
                    self.connection
                        .invoke_json(Method::POST, "documents:runQuery", Some(body), &context)
                        .await
                }
            })
            .await?;

        let results = response
            .as_array()
            .ok_or_else(|| internal_error("runQuery response must be an array"))?;

        results
            .iter()
            .filter_map(|entry| entry.get("document"))
            .map(|document| self.serializer.decode_document(document))
            .collect()
    }

    fn field_filter(collection: &str, field: &str, op: &str, value: JsonValue) -> JsonValue {
        json!({
            "from": [ { "collectionId": collection, "allDescendants": false } ],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": op,
                    "value": value
                }
            }
        })
    }

    async fn begin_transaction(&self) -> StoreResult<String> {
        let body = json!({ "options": { "readWrite": {} } });
        let response = self
            .execute_with_retry(|context| {
                let body = body.clone();
                async move {
                    self.connection
                        .invoke_json(Method::POST, "documents:beginTransaction", Some(body), &context)
                        .await
                }
            })
            .await?;
        response
            .get("transaction")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| internal_error("beginTransaction response missing 'transaction'"))
    }

    async fn rollback(&self, transaction: &str) {
        let body = json!({ "transaction": transaction });
        let result = self
            .execute_with_retry(|context| {
                let body = body.clone();
                async move {
                    self.connection
                        .invoke_json(Method::POST, "documents:rollback", Some(body), &context)
                        .await
                }
            })
            .await;
        if let Err(err) = result {
            log::debug!("transaction rollback failed: {err}");
        }
    }

    async fn get_in_transaction(
        &self,
        key: &DocumentKey,
        transaction: &str,
    ) -> StoreResult<DocumentSnapshot> {
        let path = format!(
            "{}?transaction={}",
            Self::document_path(key),
            utf8_percent_encode(transaction, NON_ALPHANUMERIC)
        );
        self.fetch_document(key, path).await
    }

    async fn fetch_document(&self, key: &DocumentKey, path: String) -> StoreResult<DocumentSnapshot> {
        let document = self
            .execute_with_retry(|context| {
                let path = path.clone();
                async move {
                    self.connection
                        .invoke_json_optional(Method::GET, &path, None, &context)
                        .await
                }
            })
            .await?;

        match document {
            Some(json) => self.serializer.decode_document(&json),
            None => Ok(DocumentSnapshot::missing(key.clone())),
        }
    }

    async fn toggle_once(
        &self,
        key: &DocumentKey,
        field: &str,
        value: &StoreValue,
    ) -> StoreResult<bool> {
        let transaction = self.begin_transaction().await?;
        let snapshot = match self.get_in_transaction(key, &transaction).await {
            Ok(snapshot) if snapshot.exists() => snapshot,
            Ok(_) => {
                self.rollback(&transaction).await;
                return Err(not_found(format!("Document {key} does not exist")));
            }
            Err(err) => {
                self.rollback(&transaction).await;
                return Err(err);
            }
        };

        let (write, member) = match snapshot.get(field).and_then(StoreValue::as_array) {
            Some(array) if array.contains(value) => (
                self.serializer.encode_array_transform_write(
                    key,
                    field,
                    ArrayTransform::RemoveAll,
                    value,
                ),
                false,
            ),
            Some(_) => (
                self.serializer.encode_array_transform_write(
                    key,
                    field,
                    ArrayTransform::AppendMissing,
                    value,
                ),
                true,
            ),
            None => (
                self.serializer.encode_field_update_write(
                    key,
                    field,
                    &StoreValue::from_array(vec![value.clone()]),
                ),
                true,
            ),
        };

        self.commit(vec![write], Some(&transaction)).await?;
        Ok(member)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
        self.fetch_document(key, Self::document_path(key)).await
    }

    async fn set_field(&self, key: &DocumentKey, field: &str, value: StoreValue) -> StoreResult<()> {
        let write = self.serializer.encode_field_update_write(key, field, &value);
        self.commit(vec![write], None).await
    }

    async fn add_to_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()> {
        let write = self.serializer.encode_array_transform_write(
            key,
            field,
            ArrayTransform::AppendMissing,
            &value,
        );
        self.commit(vec![write], None).await
    }

    async fn remove_from_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()> {
        let write =
            self.serializer
                .encode_array_transform_write(key, field, ArrayTransform::RemoveAll, &value);
        self.commit(vec![write], None).await
    }

    async fn query_by_ids_in(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        if ids.is_empty() {
            return Err(invalid_argument("'in' filters require a non-empty list of ids"));
        }
        if ids.len() > self.max_batch_size {
            return Err(invalid_argument(format!(
                "'in' filters support at most {} elements, got {}",
                self.max_batch_size,
                ids.len()
            )));
        }

        let references = ids
            .iter()
            .map(|id| {
                DocumentKey::new(collection, id.as_str()).map(|key| self.serializer.reference_value(&key))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        let query = Self::field_filter(
            collection,
            DOCUMENT_ID_FIELD,
            "IN",
            json!({ "arrayValue": { "values": references } }),
        );
        self.run_query(query).await
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        let query = Self::field_filter(
            collection,
            &quote_field_path(field),
            "ARRAY_CONTAINS",
            self.serializer.encode_value(&value),
        );
        self.run_query(query).await
    }

    async fn toggle_set_membership(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<bool> {
        let mut attempt = 0usize;
        loop {
            match self.toggle_once(key, field, &value).await {
                Err(err) if err.code == StoreErrorCode::Aborted && attempt + 1 < self.retry.max_attempts => {
                    log::debug!("membership toggle on {key} contended, restarting: {err}");
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

impl HttpDocumentStoreBuilder {
    fn new(database_id: DatabaseId) -> Self {
        let connection_builder = Connection::builder(database_id.clone());
        Self {
            database_id,
            connection_builder,
            auth_provider: Arc::new(NoopTokenProvider),
            retry: RetrySettings::default(),
            max_batch_size: MAX_IN_FILTER_SIZE,
        }
    }

    pub fn with_auth_provider(mut self, provider: TokenProviderArc) -> Self {
        self.auth_provider = provider;
        self
    }

    pub fn with_retry_settings(mut self, settings: RetrySettings) -> Self {
        self.retry = settings;
        self
    }

    pub fn with_connection_builder(mut self, builder: ConnectionBuilder) -> Self {
        self.connection_builder = builder;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn build(self) -> StoreResult<HttpDocumentStore> {
        let connection = self.connection_builder.build()?;
        Ok(HttpDocumentStore {
            connection,
            serializer: JsonProtoSerializer::new(self.database_id),
            auth_provider: self.auth_provider,
            retry: self.retry,
            max_batch_size: self.max_batch_size,
        })
    }
}

impl RetrySettings {
    fn should_retry(&self, attempt: usize, error: &StoreError) -> bool {
        if attempt + 1 >= self.max_attempts {
            return false;
        }

        matches!(
            error.code,
            StoreErrorCode::Internal
                | StoreErrorCode::Unavailable
                | StoreErrorCode::DeadlineExceeded
                | StoreErrorCode::ResourceExhausted
                | StoreErrorCode::Unauthenticated
        )
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        let delay = self.initial_delay.mul_f64(factor);
        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}
