//! HTTP boundary for the foods backend.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Plate, PlateId},
    error::ApiException,
    protocol::{CreatePlateRequest, UpdatePlateRequest, UpdatedPlateFields},
};
use tracing::debug;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The four REST calls the dashboard relies on. Each call is issued exactly
/// once; implementations must not retry.
#[async_trait]
pub trait FoodsApi: Send + Sync {
    async fn list_plates(&self) -> Result<Vec<Plate>>;
    async fn create_plate(&self, request: &CreatePlateRequest) -> Result<Plate>;
    async fn update_plate(
        &self,
        id: PlateId,
        request: &UpdatePlateRequest,
    ) -> Result<UpdatedPlateFields>;
    async fn delete_plate(&self, id: PlateId) -> Result<()>;
}

pub struct HttpFoodsApi {
    http: Client,
    base_url: Url,
}

impl HttpFoodsApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn foods_url(&self) -> Result<Url> {
        self.base_url
            .join("foods")
            .with_context(|| format!("failed to build foods url from {}", self.base_url))
    }

    fn food_url(&self, id: PlateId) -> Result<Url> {
        self.base_url
            .join(&format!("foods/{id}"))
            .with_context(|| format!("failed to build url for plate {id}"))
    }
}

#[async_trait]
impl FoodsApi for HttpFoodsApi {
    async fn list_plates(&self) -> Result<Vec<Plate>> {
        let url = self.foods_url()?;
        debug!(%url, "foods: GET");
        let response = self.http.get(url).send().await?;
        let plates = ensure_success(response)
            .await?
            .json()
            .await
            .context("malformed plate list in response")?;
        Ok(plates)
    }

    async fn create_plate(&self, request: &CreatePlateRequest) -> Result<Plate> {
        let url = self.foods_url()?;
        debug!(%url, "foods: POST");
        let response = self.http.post(url).json(request).send().await?;
        let plate = ensure_success(response)
            .await?
            .json()
            .await
            .context("malformed created plate in response")?;
        Ok(plate)
    }

    async fn update_plate(
        &self,
        id: PlateId,
        request: &UpdatePlateRequest,
    ) -> Result<UpdatedPlateFields> {
        let url = self.food_url(id)?;
        debug!(%url, "foods: POST");
        let response = self.http.post(url).json(request).send().await?;
        let fields = ensure_success(response)
            .await?
            .json()
            .await
            .with_context(|| format!("malformed update response for plate {id}"))?;
        Ok(fields)
    }

    async fn delete_plate(&self, id: PlateId) -> Result<()> {
        let url = self.food_url(id)?;
        debug!(%url, "foods: DELETE");
        let response = self.http.delete(url).send().await?;
        // Body is ignored.
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiException::from_response(status.as_u16(), &body).into())
}

/// Parses the configured API root. A trailing slash is enforced so that
/// `http://host/api` resolves `foods` to `http://host/api/foods`.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("foods api url must not be empty"));
    }

    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url =
        Url::parse(&with_slash).with_context(|| format!("invalid foods api url: {trimmed}"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("foods api url cannot be used as a base: {trimmed}"));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
