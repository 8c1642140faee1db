//! Raw API shapes and their normalization into domain types.
//!
//! The same record comes back keyed by `_id` on some read paths and by `verificationId`
//! on others, and references may arrive populated or as bare ids. Everything is folded
//! into one canonical shape here so the rest of the crate never sees the variation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Document, LandlordId, LandlordSummary, Region, RegionId, RegionRef, ReviewAction, TenantId,
    VerificationId, VerificationRecord, VerificationStatus,
};

/// `{ success, data | message, ... }` wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_count: Option<u32>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            assigned_count: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            assigned_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("verification record carries neither _id nor verificationId")]
    MissingIdentifier,
    #[error("response envelope is missing its data payload")]
    MissingData,
}

/// Tenant or landlord reference, populated or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReference {
    Id(String),
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl RawReference {
    fn into_parts(self) -> (String, Option<String>) {
        match self {
            RawReference::Id(id) => (id, None),
            RawReference::Populated { id, name } => (id, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRegionRef {
    Id(String),
    Populated {
        #[serde(
            rename = "_id",
            alias = "id",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        id: Option<String>,
        name: String,
        #[serde(default)]
        code: String,
    },
}

impl From<RawRegionRef> for RegionRef {
    fn from(value: RawRegionRef) -> Self {
        match value {
            RawRegionRef::Id(id) => RegionRef::Id(RegionId(id)),
            RawRegionRef::Populated { id, name, code } => RegionRef::Populated {
                id: id.map(RegionId),
                name,
                code,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    pub name: String,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
}

impl From<RawDocument> for Document {
    fn from(value: RawDocument) -> Self {
        Document {
            name: value.name,
            file_url: value.file_url,
            uploaded_at: value.uploaded_at,
            uploaded_by: value.uploaded_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVerificationRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_id: Option<String>,
    pub tenant_id: RawReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_id: Option<RawReference>,
    pub region_id: RawRegionRef,
    pub status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(default)]
    pub tenant_documents: Vec<RawDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl RawVerificationRecord {
    /// Copies `verificationId` into `_id` when `_id` is absent. An existing `_id` wins.
    pub fn normalize_id(&mut self) {
        if self.record_id.is_none() {
            self.record_id = self.verification_id.clone();
        }
    }

    pub fn canonical_id(&self) -> Option<VerificationId> {
        self.record_id
            .as_deref()
            .or(self.verification_id.as_deref())
            .map(VerificationId::new)
    }

    pub fn into_record(mut self) -> Result<VerificationRecord, WireError> {
        self.normalize_id();
        let id = self.canonical_id().ok_or(WireError::MissingIdentifier)?;
        let (tenant_id, tenant_name) = self.tenant_id.into_parts();

        Ok(VerificationRecord {
            id,
            tenant_id: TenantId(tenant_id),
            tenant_name,
            landlord_id: self
                .landlord_id
                .map(|landlord| LandlordId(landlord.into_parts().0)),
            region: self.region_id.into(),
            status: self.status,
            remark: self.remark,
            documents: self.documents.into_iter().map(Document::from).collect(),
            tenant_documents: self
                .tenant_documents
                .into_iter()
                .map(Document::from)
                .collect(),
            verified_at: self.verified_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRegion {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

impl From<RawRegion> for Region {
    fn from(value: RawRegion) -> Self {
        Region {
            id: RegionId(value.id),
            name: value.name,
            code: value.code,
            document_url: value.document_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLandlord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "fullName")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RawRegionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_count: Option<u32>,
}

impl From<RawLandlord> for LandlordSummary {
    fn from(value: RawLandlord) -> Self {
        LandlordSummary {
            id: LandlordId(value.id),
            name: value.name,
            email: value.email,
            phone: value.phone,
            region: value.region_id.map(RegionRef::from),
            verification_id: value.verification_id.map(VerificationId),
            tenant_count: value.tenant_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRegionBody {
    pub region_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    pub tenant_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBody {
    pub action: ReviewAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// `send-all` responses put the count either on the envelope or inside `data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAllData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_count: Option<u32>,
}

pub fn assigned_count(envelope: &Envelope<SendAllData>) -> u32 {
    envelope
        .assigned_count
        .or_else(|| envelope.data.as_ref().and_then(|data| data.assigned_count))
        .unwrap_or(0)
}
