use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::api::{ApiError, VerificationApi};
use super::credentials::{token_source, TokenSource};
use super::domain::{
    LandlordId, LandlordSummary, Region, RegionId, TenantId, VerificationId, VerificationRecord,
};
use super::validation::{ReviewDecision, TenantSelection};
use super::wire::{
    assigned_count, AssignBody, Envelope, LinkRegionBody, RawLandlord, RawRegion,
    RawVerificationRecord, ReviewBody, SendAllData, WireError,
};
use crate::config::ApiConfig;

/// [`VerificationApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpVerificationApi {
    base_url: Url,
    http: Client,
    tokens: Arc<dyn TokenSource>,
}

impl HttpVerificationApi {
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|err| ApiError::Endpoint(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Endpoint(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }

        let http = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            http,
            tokens,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Arc::from(token_source(&config.token)),
            config.request_timeout,
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn public(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "verification api request");
        Ok(self.http.request(method, url))
    }

    /// Fails before building the request when no token is available.
    fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or(ApiError::Unauthenticated)?;
        Ok(self.public(method, segments)?.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Rejected {
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    async fn send_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send::<T>(request)
            .await?
            .data
            .ok_or_else(|| WireError::MissingData.into())
    }
}

fn normalize_all(records: Vec<RawVerificationRecord>) -> Result<Vec<VerificationRecord>, ApiError> {
    records
        .into_iter()
        .map(|raw| raw.into_record().map_err(ApiError::from))
        .collect()
}

#[async_trait]
impl VerificationApi for HttpVerificationApi {
    async fn list_regions(&self) -> Result<Vec<Region>, ApiError> {
        let request = self.public(Method::GET, &["regions"])?;
        let regions: Vec<RawRegion> = self.send_data(request).await?;
        Ok(regions.into_iter().map(Region::from).collect())
    }

    async fn link_region(&self, region_id: &RegionId) -> Result<(), ApiError> {
        let request = self
            .authorized(Method::POST, &["linkedLandlords"])?
            .json(&LinkRegionBody {
                region_id: region_id.0.clone(),
            });
        self.send::<Value>(request).await?;
        Ok(())
    }

    async fn fetch_landlord(
        &self,
        landlord_id: &LandlordId,
    ) -> Result<LandlordSummary, ApiError> {
        let request = self.authorized(Method::GET, &[landlord_id.as_str()])?;
        let landlord: RawLandlord = self.send_data(request).await?;
        Ok(landlord.into())
    }

    async fn fetch_verification(
        &self,
        verification_id: &VerificationId,
    ) -> Result<VerificationRecord, ApiError> {
        let request = self.authorized(Method::GET, &[verification_id.as_str()])?;
        let record: RawVerificationRecord = self.send_data(request).await?;
        Ok(record.into_record()?)
    }

    async fn list_assignments(
        &self,
        landlord_id: &LandlordId,
        region_id: &RegionId,
    ) -> Result<Vec<VerificationRecord>, ApiError> {
        let request = self.authorized(
            Method::GET,
            &["assignments", landlord_id.as_str(), region_id.as_str()],
        )?;
        let records: Option<Vec<RawVerificationRecord>> =
            self.send::<Vec<RawVerificationRecord>>(request).await?.data;
        normalize_all(records.unwrap_or_default())
    }

    async fn assign(
        &self,
        landlord_id: &LandlordId,
        region_id: &RegionId,
        tenants: &TenantSelection,
    ) -> Result<(), ApiError> {
        let body = AssignBody {
            tenant_ids: tenants.ids().iter().map(|id| id.0.clone()).collect(),
        };
        let request = self
            .authorized(
                Method::POST,
                &["assign", landlord_id.as_str(), region_id.as_str()],
            )?
            .json(&body);
        self.send::<Value>(request).await?;
        Ok(())
    }

    async fn assign_all(
        &self,
        landlord_id: &LandlordId,
        region_id: &RegionId,
    ) -> Result<u32, ApiError> {
        let request = self.authorized(
            Method::POST,
            &["send-all", landlord_id.as_str(), region_id.as_str()],
        )?;
        let envelope = self.send::<SendAllData>(request).await?;
        Ok(assigned_count(&envelope))
    }

    async fn tenant_verifications(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<VerificationRecord>, ApiError> {
        let request = self.authorized(
            Method::GET,
            &["tenant", tenant_id.as_str(), "police-verification"],
        )?;
        let records: Option<Vec<RawVerificationRecord>> =
            self.send::<Vec<RawVerificationRecord>>(request).await?.data;
        normalize_all(records.unwrap_or_default())
    }

    async fn review(
        &self,
        verification_id: &VerificationId,
        decision: &ReviewDecision,
    ) -> Result<(), ApiError> {
        let body = ReviewBody {
            action: decision.action(),
            remark: decision.remark().map(str::to_string),
        };
        let request = self
            .authorized(
                Method::PATCH,
                &["landlord", "review", verification_id.as_str()],
            )?
            .json(&body);
        self.send::<Value>(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::verification::credentials::StaticToken;

    fn client(base: &str) -> HttpVerificationApi {
        HttpVerificationApi::new(
            base,
            Arc::new(StaticToken::new("token")),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let api = client("https://rentals.example.com/api/");
        let url = api
            .endpoint(&["tenant", "t 1/2", "police-verification"])
            .expect("endpoint builds");
        assert_eq!(
            url.as_str(),
            "https://rentals.example.com/api/tenant/t%201%2F2/police-verification"
        );

        let api = client("https://rentals.example.com/api");
        let url = api.endpoint(&["regions"]).expect("endpoint builds");
        assert_eq!(url.as_str(), "https://rentals.example.com/api/regions");
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = HttpVerificationApi::new(
            "mailto:desk@example.com",
            Arc::new(StaticToken::none()),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(ApiError::Endpoint(_))));
    }

    #[tokio::test]
    async fn missing_token_fails_before_sending() {
        // Port 9 is discard; nothing is listening, so a sent request would be an Http error.
        let api = HttpVerificationApi::new(
            "http://127.0.0.1:9/api",
            Arc::new(StaticToken::none()),
            Duration::from_secs(1),
        )
        .expect("client builds");

        let result = api.fetch_landlord(&LandlordId::new("l-1")).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }
}
