use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::{CatalogLookup, StockLookup};
use crate::domain::{CatalogEntry, ProductId, StockEntry};
use crate::error::LookupError;

/// Stock and catalog lookups against the storefront REST API.
///
/// Routes: `GET /stock`, `GET /stock/{id}`, `GET /products`, `GET /products/{id}`.
/// Every request is bounded by the timeout given at construction.
#[derive(Clone, Debug)]
pub struct HttpStorefrontApi {
    client: Client,
    base_url: String,
}

impl HttpStorefrontApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the whole stock table.
    #[instrument(skip(self))]
    pub async fn all_stock(&self) -> Result<Vec<StockEntry>, LookupError> {
        self.fetch("stock", None).await
    }

    /// Fetches the whole catalog.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<Vec<CatalogEntry>, LookupError> {
        self.fetch("products", None).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: Option<ProductId>,
    ) -> Result<T, LookupError> {
        let url = match id {
            Some(id) => format!("{}/{resource}/{id}", self.base_url),
            None => format!("{}/{resource}", self.base_url),
        };
        debug!(%url, "Sending request");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                debug!(%url, "Entry not found");
                return Err(LookupError::NotFound(id));
            }
        }
        if !status.is_success() {
            warn!(%url, %status, "Unexpected response status");
            return Err(LookupError::Network(format!("unexpected status {status} from {url}")));
        }

        let body = response.text().await.map_err(transport_error)?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            error!(%url, error = %e, "Response body is not JSON");
            LookupError::Malformed(e.to_string())
        })?;

        // json-server answers unknown ids with an empty object
        if let (Some(id), Some(object)) = (id, value.as_object()) {
            if object.is_empty() {
                return Err(LookupError::NotFound(id));
            }
        }

        serde_json::from_value(value).map_err(|e| {
            error!(%url, error = %e, "Response body has an unexpected shape");
            LookupError::Malformed(e.to_string())
        })
    }
}

fn transport_error(error: reqwest::Error) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Network(error.to_string())
    }
}

fn ensure_id(requested: ProductId, returned: ProductId) -> Result<(), LookupError> {
    if requested == returned {
        Ok(())
    } else {
        Err(LookupError::Malformed(format!(
            "requested id {requested}, response carried id {returned}"
        )))
    }
}

#[async_trait]
impl StockLookup for HttpStorefrontApi {
    #[instrument(skip(self))]
    async fn stock(&self, id: ProductId) -> Result<StockEntry, LookupError> {
        let entry: StockEntry = self.fetch("stock", Some(id)).await?;
        ensure_id(id, entry.id)?;
        Ok(entry)
    }
}

#[async_trait]
impl CatalogLookup for HttpStorefrontApi {
    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, LookupError> {
        let entry: CatalogEntry = self.fetch("products", Some(id)).await?;
        ensure_id(id, entry.id)?;
        Ok(entry)
    }
}
