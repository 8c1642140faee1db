use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::workflows::verification::api::MockVerificationApi;
use crate::workflows::verification::desk::{DeskOptions, VerificationDesk};
use crate::workflows::verification::domain::{
    Document, LandlordId, LandlordSummary, Region, RegionId, RegionRef, TenantId,
    VerificationId, VerificationRecord, VerificationStatus,
};
use crate::workflows::verification::notice::{DeskEvent, NoticeLevel};

pub(super) fn timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid timestamp")
}

pub(super) fn record(id: &str, tenant: &str, status: VerificationStatus) -> VerificationRecord {
    VerificationRecord {
        id: VerificationId::new(id),
        tenant_id: TenantId::new(tenant),
        tenant_name: Some("Asha Menon".to_string()),
        landlord_id: Some(LandlordId::new("l-1")),
        region: RegionRef::Id(RegionId::new("r-1")),
        status,
        remark: (status == VerificationStatus::Rejected).then(|| "ID expired".to_string()),
        documents: vec![Document {
            name: "Consent form".to_string(),
            file_url: "/uploads/regions/r-1/consent.pdf".to_string(),
            uploaded_at: timestamp("2025-03-01T10:00:00Z"),
            uploaded_by: Some("Zone office".to_string()),
        }],
        tenant_documents: Vec::new(),
        verified_at: status
            .is_terminal()
            .then(|| timestamp("2025-03-04T09:30:00Z")),
    }
}

pub(super) fn region(id: &str, name: &str, code: &str) -> Region {
    Region {
        id: RegionId::new(id),
        name: name.to_string(),
        code: code.to_string(),
        document_url: Some(format!("/templates/{code}.pdf")),
    }
}

pub(super) fn landlord(id: &str, verification: Option<&str>) -> LandlordSummary {
    LandlordSummary {
        id: LandlordId::new(id),
        name: "Meera Rao".to_string(),
        email: Some("meera@example.com".to_string()),
        phone: Some("+91 98450 00000".to_string()),
        region: Some(RegionRef::Id(RegionId::new("r-1"))),
        verification_id: verification.map(VerificationId::new),
        tenant_count: Some(4),
    }
}

pub(super) fn options() -> DeskOptions {
    DeskOptions::new("https://files.example.com")
}

pub(super) fn desk(api: MockVerificationApi) -> VerificationDesk<MockVerificationApi> {
    VerificationDesk::new(Arc::new(api), options())
}

pub(super) fn error_messages<A>(desk: &VerificationDesk<A>) -> Vec<String>
where
    A: crate::workflows::verification::api::VerificationApi + 'static,
{
    desk.events()
        .iter()
        .filter_map(|event| match event {
            DeskEvent::Notice(notice) if notice.level == NoticeLevel::Error => {
                Some(notice.message.clone())
            }
            _ => None,
        })
        .collect()
}

pub(super) fn info_messages<A>(desk: &VerificationDesk<A>) -> Vec<String>
where
    A: crate::workflows::verification::api::VerificationApi + 'static,
{
    desk.events()
        .iter()
        .filter_map(|event| match event {
            DeskEvent::Notice(notice) if notice.level == NoticeLevel::Info => {
                Some(notice.message.clone())
            }
            _ => None,
        })
        .collect()
}
