use async_trait::async_trait;
use mockall::automock;

use super::domain::{
    LandlordId, LandlordSummary, Region, RegionId, TenantId, VerificationId, VerificationRecord,
};
use super::validation::{ReviewDecision, TenantSelection};
use super::wire::WireError;

/// Request/response contract of the remote verification record store.
///
/// Implementations normalize raw payloads before returning, so callers only ever see
/// canonical identifiers. Everything except [`VerificationApi::list_regions`] requires
/// a landlord token.
#[automock]
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// `GET /regions`
    async fn list_regions(&self) -> Result<Vec<Region>, ApiError>;

    /// `POST /linkedLandlords`
    async fn link_region(&self, region_id: &RegionId) -> Result<(), ApiError>;

    /// `GET /{accountId}` keyed by a landlord id.
    async fn fetch_landlord(&self, landlord_id: &LandlordId)
        -> Result<LandlordSummary, ApiError>;

    /// `GET /{accountId}` keyed by a verification id.
    async fn fetch_verification(
        &self,
        verification_id: &VerificationId,
    ) -> Result<VerificationRecord, ApiError>;

    /// `GET /assignments/{landlordId}/{regionId}`
    async fn list_assignments(
        &self,
        landlord_id: &LandlordId,
        region_id: &RegionId,
    ) -> Result<Vec<VerificationRecord>, ApiError>;

    /// `POST /assign/{landlordId}/{regionId}`
    async fn assign(
        &self,
        landlord_id: &LandlordId,
        region_id: &RegionId,
        tenants: &TenantSelection,
    ) -> Result<(), ApiError>;

    /// `POST /send-all/{landlordId}/{regionId}`, returning the affected tenant count.
    async fn assign_all(&self, landlord_id: &LandlordId, region_id: &RegionId)
        -> Result<u32, ApiError>;

    /// `GET /tenant/{tenantId}/police-verification`
    async fn tenant_verifications(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<VerificationRecord>, ApiError>;

    /// `PATCH /landlord/review/{verificationId}`
    async fn review(
        &self,
        verification_id: &VerificationId,
        decision: &ReviewDecision,
    ) -> Result<(), ApiError>;
}

/// Errors surfaced by a [`VerificationApi`] call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no landlord session; log in again")]
    Unauthenticated,

    #[error("request failed with status {status}")]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose envelope reported `success: false`.
    #[error("request was not accepted")]
    Rejected { message: Option<String> },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

impl ApiError {
    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Rejected { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            _ => None,
        }
    }
}

impl From<WireError> for ApiError {
    fn from(value: WireError) -> Self {
        ApiError::Decode(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_ignores_blank_text() {
        let err = ApiError::Status {
            status: 500,
            message: Some("  ".to_string()),
        };
        assert_eq!(err.server_message(), None);

        let err = ApiError::Rejected {
            message: Some("Region not linked".to_string()),
        };
        assert_eq!(err.server_message(), Some("Region not linked"));
        assert_eq!(ApiError::Unauthenticated.server_message(), None);
    }
}
