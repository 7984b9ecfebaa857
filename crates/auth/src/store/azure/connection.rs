//! Storage account connection strings.
//!
//! Accepts the standard `Key=Value;...` form issued by the Azure portal:
//!
//! ```text
//! DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=base64==;EndpointSuffix=core.windows.net
//! ```
//!
//! An explicit `TableEndpoint=` overrides the derived endpoint, and
//! `UseDevelopmentStorage=true` selects the local Azurite emulator.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Well-known Azurite account name.
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
/// Well-known Azurite account key (public, documented by Microsoft).
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
/// Azurite table service endpoint.
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Errors from parsing a connection string.
#[derive(Debug, Error)]
pub enum ConnectionStringError {
    /// A segment is not of the form `Key=Value`.
    #[error("malformed segment {0:?} (expected Key=Value)")]
    MalformedSegment(String),
    /// A required key is absent.
    #[error("missing {0}")]
    Missing(&'static str),
    /// `AccountKey` is not valid base64.
    #[error("AccountKey is not valid base64")]
    InvalidKey,
    /// The table endpoint is not a valid URL.
    #[error("invalid table endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// A parsed storage account connection string.
///
/// Implements `Debug` manually to redact the account key.
#[derive(Clone)]
pub struct ConnectionString {
    account_name: String,
    account_key: SecretString,
    table_endpoint: Url,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &"[REDACTED]")
            .field("table_endpoint", &self.table_endpoint.as_str())
            .finish()
    }
}

impl ConnectionString {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionStringError` if a segment is malformed, the account
    /// name or key is missing, the key is not base64, or the endpoint is not
    /// a URL.
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let mut pairs: HashMap<String, String> = HashMap::new();
        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_owned()))?;
            pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
        }

        if pairs
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self {
                account_name: DEV_ACCOUNT_NAME.to_owned(),
                account_key: SecretString::from(DEV_ACCOUNT_KEY),
                table_endpoint: Url::parse(DEV_TABLE_ENDPOINT)?,
            });
        }

        let account_name = pairs
            .remove("accountname")
            .ok_or(ConnectionStringError::Missing("AccountName"))?;
        let account_key = pairs
            .remove("accountkey")
            .ok_or(ConnectionStringError::Missing("AccountKey"))?;
        STANDARD
            .decode(&account_key)
            .map_err(|_| ConnectionStringError::InvalidKey)?;

        let table_endpoint = match pairs.remove("tableendpoint") {
            Some(endpoint) => Url::parse(&endpoint)?,
            None => {
                let protocol = pairs
                    .remove("defaultendpointsprotocol")
                    .unwrap_or_else(|| "https".to_owned());
                let suffix = pairs
                    .remove("endpointsuffix")
                    .unwrap_or_else(|| "core.windows.net".to_owned());
                Url::parse(&format!("{protocol}://{account_name}.table.{suffix}"))?
            }
        };

        Ok(Self {
            account_name,
            account_key: SecretString::from(account_key),
            table_endpoint,
        })
    }

    /// Storage account name.
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Table service endpoint, without a trailing slash.
    #[must_use]
    pub fn table_endpoint(&self) -> &str {
        self.table_endpoint.as_str().trim_end_matches('/')
    }

    /// Decode the account key.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionStringError::InvalidKey` if the key is not base64.
    pub fn decoded_key(&self) -> Result<Vec<u8>, ConnectionStringError> {
        STANDARD
            .decode(self.account_key.expose_secret())
            .map_err(|_| ConnectionStringError::InvalidKey)
    }
}
