//! Azure Table Storage backend.
//!
//! Talks to the Table service REST API directly with `reqwest`, using the
//! JSON "no metadata" format. Entities keep the property names the tables
//! already use:
//!
//! | Property | Field |
//! |----------|-------|
//! | `PartitionKey` | always `"auth"` |
//! | `RowKey` | email |
//! | `HashedPassword` | digest |
//! | `CreatedAt` / `UpdatedAt` | ISO-8601 timestamps |

mod connection;
mod signing;

pub use connection::{ConnectionString, ConnectionStringError};
pub use signing::SharedKeyLite;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use agentbridge_core::PARTITION_KEY;

use super::{AccountRecord, AccountTable, StoreError, format_timestamp, parse_timestamp};

/// REST API version sent with every request.
const API_VERSION: &str = "2019-02-02";
/// JSON format without OData metadata.
const JSON_NO_METADATA: &str = "application/json;odata=nometadata";
/// Continuation headers returned by paged queries.
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-nextpartitionkey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-nextrowkey";
/// Error codes that describe the entity rather than the call.
const RESOURCE_NOT_FOUND: &str = "ResourceNotFound";
const ENTITY_ALREADY_EXISTS: &str = "EntityAlreadyExists";

/// Stored entity, as serialized on the wire.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountEntity {
    partition_key: String,
    row_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hashed_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

impl AccountEntity {
    fn from_record(record: &AccountRecord) -> Self {
        Self {
            partition_key: PARTITION_KEY.to_owned(),
            row_key: record.email.clone(),
            hashed_password: record.password_digest.clone(),
            created_at: record.created_at.map(format_timestamp),
            updated_at: record.updated_at.map(format_timestamp),
        }
    }

    fn password_patch(email: &str, digest: &str, updated_at: DateTime<Utc>) -> Self {
        Self {
            partition_key: PARTITION_KEY.to_owned(),
            row_key: email.to_owned(),
            hashed_password: Some(digest.to_owned()),
            created_at: None,
            updated_at: Some(format_timestamp(updated_at)),
        }
    }

    fn into_record(self) -> AccountRecord {
        AccountRecord {
            email: self.row_key,
            password_digest: self.hashed_password,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Body of a query response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    value: Vec<AccountEntity>,
}

/// Body of an error response.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "odata.error")]
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
}

/// One Azure table holding account records.
#[derive(Debug, Clone)]
pub struct AzureTable {
    client: Client,
    endpoint: String,
    table: String,
    signer: std::sync::Arc<SharedKeyLite>,
}

impl AzureTable {
    /// Create a client for `table` in the account named by `connection`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the account key cannot be decoded
    /// or the HTTP client cannot be built.
    pub fn new(
        connection: &ConnectionString,
        table: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let key = connection
            .decoded_key()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client: {e}")))?;

        Ok(Self::with_client(client, connection, table, key))
    }

    /// Create a client sharing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(
        client: Client,
        connection: &ConnectionString,
        table: impl Into<String>,
        key: Vec<u8>,
    ) -> Self {
        Self {
            client,
            endpoint: connection.table_endpoint().to_owned(),
            table: table.into(),
            signer: std::sync::Arc::new(SharedKeyLite::new(connection.account_name(), key)),
        }
    }

    /// The underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Resource path of a single entity.
    fn entity_resource(&self, email: &str) -> String {
        format!(
            "{}(PartitionKey='{}',RowKey='{}')",
            self.table,
            encode_key(PARTITION_KEY),
            encode_key(email)
        )
    }

    /// Build a signed request for `resource` (path plus optional query).
    fn request(&self, method: Method, resource: &str) -> Result<RequestBuilder, StoreError> {
        let url = Url::parse(&format!("{}/{resource}", self.endpoint))
            .map_err(|e| StoreError::Unavailable(format!("invalid request url: {e}")))?;
        let date = SharedKeyLite::format_date(Utc::now());
        let authorization = self.signer.authorization(&date, url.path());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_NO_METADATA));
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));
        headers.insert("dataserviceversion", HeaderValue::from_static("3.0;NetFx"));
        headers.insert(
            "maxdataserviceversion",
            HeaderValue::from_static("3.0;NetFx"),
        );
        headers.insert("x-ms-date", header_value(&date)?);
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        Ok(self.client.request(method, url).headers(headers))
    }

    fn with_entity(builder: RequestBuilder, entity: &AccountEntity) -> Result<RequestBuilder, StoreError> {
        let body = serde_json::to_string(entity)
            .map_err(|e| StoreError::Malformed(format!("encode entity: {e}")))?;
        Ok(builder
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_NO_METADATA))
            .body(body))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("request to {} failed: {e}", self.table)))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.error_from(response).await)
    }

    async fn error_from(&self, response: Response) -> StoreError {
        let status = response.status();
        let code = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error.code)
            .ok();

        classify_error(status, code.as_deref()).unwrap_or_else(|| {
            let code = code.as_deref().unwrap_or("-");
            warn!(table = %self.table, %status, %code, "table service error");
            StoreError::Unavailable(format!("{} returned {status} {code}", self.table))
        })
    }

    async fn query_page(
        &self,
        continuation: Option<&(String, String)>,
    ) -> Result<(Vec<AccountEntity>, Option<(String, String)>), StoreError> {
        let mut resource = format!(
            "{}()?$filter={}",
            self.table,
            urlencoding::encode(&format!("PartitionKey eq '{PARTITION_KEY}'"))
        );
        if let Some((next_pk, next_rk)) = continuation {
            resource.push_str(&format!(
                "&NextPartitionKey={}&NextRowKey={}",
                urlencoding::encode(next_pk),
                urlencoding::encode(next_rk)
            ));
        }

        let response = self.send(self.request(Method::GET, &resource)?).await?;
        let next = continuation_from(response.headers());
        let page: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("query response: {e}")))?;
        Ok((page.value, next))
    }

    async fn merge(
        &self,
        entity: &AccountEntity,
        require_existing: bool,
    ) -> Result<(), StoreError> {
        let method = Method::from_bytes(b"MERGE")
            .map_err(|e| StoreError::Unavailable(format!("merge method: {e}")))?;
        let mut builder = self.request(method, &self.entity_resource(&entity.row_key))?;
        if require_existing {
            builder = builder.header(IF_MATCH, "*");
        }
        self.send(Self::with_entity(builder, entity)?).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountTable for AzureTable {
    fn name(&self) -> &str {
        &self.table
    }

    #[instrument(skip(self, email), fields(table = %self.table))]
    async fn get(&self, email: &str) -> Result<AccountRecord, StoreError> {
        let response = self
            .send(self.request(Method::GET, &self.entity_resource(email))?)
            .await?;
        let entity: AccountEntity = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("entity: {e}")))?;
        Ok(entity.into_record())
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn list(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let mut records = Vec::new();
        let mut continuation = None;
        loop {
            let (page, next) = self.query_page(continuation.as_ref()).await?;
            records.extend(page.into_iter().map(AccountEntity::into_record));
            match next {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }
        debug!(count = records.len(), "queried table");
        Ok(records)
    }

    #[instrument(skip(self, record), fields(table = %self.table))]
    async fn insert(&self, record: &AccountRecord) -> Result<(), StoreError> {
        let builder = self
            .request(Method::POST, &self.table)?
            .header("prefer", "return-no-content");
        let entity = AccountEntity::from_record(record);
        self.send(Self::with_entity(builder, &entity)?).await?;
        Ok(())
    }

    #[instrument(skip(self, email, digest), fields(table = %self.table))]
    async fn update_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.merge(&AccountEntity::password_patch(email, digest, updated_at), true)
            .await
    }

    #[instrument(skip(self, email, digest), fields(table = %self.table))]
    async fn upsert_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // MERGE without If-Match is insert-or-merge.
        self.merge(&AccountEntity::password_patch(email, digest, updated_at), false)
            .await
    }

    #[instrument(skip(self, email), fields(table = %self.table))]
    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        let builder = self
            .request(Method::DELETE, &self.entity_resource(email))?
            .header(IF_MATCH, "*");
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn ping(&self) -> Result<(), StoreError> {
        let resource = format!("{}()?$top=1", self.table);
        self.send(self.request(Method::GET, &resource)?).await?;
        Ok(())
    }
}

/// Quote and percent-encode a key for use inside `RowKey='...'`.
fn encode_key(key: &str) -> String {
    urlencoding::encode(&key.replace('\'', "''")).into_owned()
}

/// Map a Table service error to a record-level outcome.
///
/// Only an error body naming the entity counts as a record-level outcome.
/// Anything else, including a proxy error page or a missing table, is a
/// failed call.
fn classify_error(status: StatusCode, code: Option<&str>) -> Option<StoreError> {
    match (status, code) {
        (StatusCode::NOT_FOUND, Some(RESOURCE_NOT_FOUND)) => Some(StoreError::NotFound),
        (StatusCode::CONFLICT, Some(ENTITY_ALREADY_EXISTS)) => Some(StoreError::AlreadyExists),
        _ => None,
    }
}

fn header_value(value: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(value).map_err(|e| StoreError::Unavailable(format!("header: {e}")))
}

fn continuation_from(headers: &HeaderMap) -> Option<(String, String)> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    match (get(NEXT_PARTITION_KEY), get(NEXT_ROW_KEY)) {
        (Some(pk), Some(rk)) => Some((pk, rk)),
        (Some(pk), None) => Some((pk, String::new())),
        _ => None,
    }
}
