use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use rental_desk::workflows::verification::wire::{
    RawDocument, RawLandlord, RawReference, RawRegion, RawRegionRef, RawVerificationRecord,
};
use rental_desk::workflows::verification::{ReviewAction, VerificationStatus};
use serde::Serialize;

use super::routes::StubError;

/// Bearer token the stub accepts; it signs in as [`STUB_LANDLORD_ID`].
pub const STUB_TOKEN: &str = "stub-landlord-token";
pub const STUB_LANDLORD_ID: &str = "l-1";

#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub metrics: Arc<PrometheusHandle>,
}

#[derive(Debug, Clone)]
struct StubTenant {
    id: String,
    name: String,
    landlord_id: String,
    uploads: Vec<RawDocument>,
}

#[derive(Debug, Default)]
struct StubData {
    regions: Vec<RawRegion>,
    landlords: BTreeMap<String, RawLandlord>,
    tenants: Vec<StubTenant>,
    records: Vec<RawVerificationRecord>,
    next_record: u32,
}

/// Either side of `GET /{accountId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum Account {
    Landlord(RawLandlord),
    Verification(RawVerificationRecord),
}

#[derive(Debug, Clone, Default)]
pub struct StubStore {
    data: Arc<Mutex<StubData>>,
}

impl StubStore {
    /// Two regions, landlord `l-1` with tenants `t-1`..`t-3`, and no verifications yet.
    pub fn seeded() -> Self {
        let seeded_at = seed_time();
        let regions = vec![
            RawRegion {
                id: "r-1".to_string(),
                name: "Zone A".to_string(),
                code: "ZA".to_string(),
                document_url: Some("/templates/za-police-verification.pdf".to_string()),
            },
            RawRegion {
                id: "r-2".to_string(),
                name: "Old Town".to_string(),
                code: "OT".to_string(),
                document_url: Some("/templates/ot-police-verification.pdf".to_string()),
            },
        ];

        let mut landlords = BTreeMap::new();
        landlords.insert(
            STUB_LANDLORD_ID.to_string(),
            RawLandlord {
                id: STUB_LANDLORD_ID.to_string(),
                name: "Meera Rao".to_string(),
                email: Some("meera.rao@example.com".to_string()),
                phone: Some("+91 98450 00000".to_string()),
                region_id: None,
                verification_id: None,
                tenant_count: Some(3),
            },
        );

        let tenants = [("t-1", "Asha Menon"), ("t-2", "Ravi Kumar"), ("t-3", "Farah Khan")]
            .into_iter()
            .map(|(id, name)| StubTenant {
                id: id.to_string(),
                name: name.to_string(),
                landlord_id: STUB_LANDLORD_ID.to_string(),
                uploads: vec![RawDocument {
                    name: "Aadhaar card".to_string(),
                    file_url: format!("/uploads/tenants/{id}/aadhaar.pdf"),
                    uploaded_at: seeded_at,
                    uploaded_by: Some(name.to_string()),
                }],
            })
            .collect();

        Self {
            data: Arc::new(Mutex::new(StubData {
                regions,
                landlords,
                tenants,
                records: Vec::new(),
                next_record: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StubData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn regions(&self) -> Vec<RawRegion> {
        self.lock().regions.clone()
    }

    pub(crate) fn link_region(&self, landlord_id: &str, region_id: &str) -> Result<(), StubError> {
        let mut data = self.lock();
        let region = data
            .regions
            .iter()
            .find(|region| region.id == region_id)
            .cloned()
            .ok_or_else(|| StubError::NotFound("Region not found".to_string()))?;
        let landlord = data
            .landlords
            .get_mut(landlord_id)
            .ok_or_else(|| StubError::NotFound("Landlord not found".to_string()))?;
        landlord.region_id = Some(RawRegionRef::Populated {
            id: Some(region.id),
            name: region.name,
            code: region.code,
        });
        Ok(())
    }

    pub(crate) fn account(&self, id: &str) -> Result<Account, StubError> {
        let data = self.lock();
        if let Some(landlord) = data.landlords.get(id) {
            return Ok(Account::Landlord(landlord.clone()));
        }
        data.records
            .iter()
            .find(|record| record.record_id.as_deref() == Some(id))
            .cloned()
            .map(Account::Verification)
            .ok_or_else(|| StubError::NotFound("Account not found".to_string()))
    }

    pub(crate) fn assignments(
        &self,
        landlord_id: &str,
        region_id: &str,
    ) -> Vec<RawVerificationRecord> {
        self.lock()
            .records
            .iter()
            .filter(|record| {
                landlord_of(record) == Some(landlord_id) && region_of(record) == Some(region_id)
            })
            .cloned()
            .collect()
    }

    /// Validates every tenant before creating any record.
    pub(crate) fn assign(
        &self,
        landlord_id: &str,
        region_id: &str,
        tenant_ids: &[String],
    ) -> Result<usize, StubError> {
        if tenant_ids.is_empty() {
            return Err(StubError::BadRequest(
                "At least one tenant is required".to_string(),
            ));
        }

        let mut data = self.lock();
        let region = linked_region(&data, landlord_id, region_id)?;
        let tenants = tenant_ids
            .iter()
            .map(|id| {
                data.tenants
                    .iter()
                    .find(|tenant| &tenant.id == id && tenant.landlord_id == landlord_id)
                    .cloned()
                    .ok_or_else(|| {
                        StubError::BadRequest(format!(
                            "Tenant {id} does not belong to this landlord"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        for tenant in &tenants {
            create_record(&mut data, landlord_id, &region, tenant, now);
        }
        Ok(tenants.len())
    }

    pub(crate) fn send_all(&self, landlord_id: &str, region_id: &str) -> Result<u32, StubError> {
        let mut data = self.lock();
        let region = linked_region(&data, landlord_id, region_id)?;
        let tenants: Vec<StubTenant> = data
            .tenants
            .iter()
            .filter(|tenant| tenant.landlord_id == landlord_id)
            .cloned()
            .collect();
        if tenants.is_empty() {
            return Err(StubError::BadRequest(
                "No tenants found for this landlord".to_string(),
            ));
        }

        let now = Utc::now();
        for tenant in &tenants {
            create_record(&mut data, landlord_id, &region, tenant, now);
        }
        Ok(tenants.len() as u32)
    }

    /// Served keyed by `verificationId`, the older shape of this read path.
    pub(crate) fn tenant_verifications(&self, tenant_id: &str) -> Vec<RawVerificationRecord> {
        self.lock()
            .records
            .iter()
            .filter(|record| tenant_of(record) == tenant_id)
            .cloned()
            .map(|mut record| {
                record.verification_id = record.record_id.take();
                record
            })
            .collect()
    }

    pub(crate) fn review(
        &self,
        verification_id: &str,
        action: ReviewAction,
        remark: Option<String>,
    ) -> Result<VerificationStatus, StubError> {
        let remark = remark.filter(|remark| !remark.trim().is_empty());
        if action == ReviewAction::Reject && remark.is_none() {
            return Err(StubError::BadRequest(
                "Remark is required when rejecting".to_string(),
            ));
        }

        let mut data = self.lock();
        let record = data
            .records
            .iter_mut()
            .find(|record| record.record_id.as_deref() == Some(verification_id))
            .ok_or_else(|| StubError::NotFound("Verification not found".to_string()))?;
        if record.status.is_terminal() {
            return Err(StubError::Conflict(
                "Verification already processed".to_string(),
            ));
        }

        record.status = VerificationStatus::after(action);
        record.remark = match action {
            ReviewAction::Approve => None,
            ReviewAction::Reject => remark,
        };
        record.verified_at = Some(Utc::now());
        Ok(record.status)
    }
}

fn seed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_740_823_200, 0).unwrap_or_default()
}

fn linked_region(
    data: &StubData,
    landlord_id: &str,
    region_id: &str,
) -> Result<RawRegion, StubError> {
    let landlord = data
        .landlords
        .get(landlord_id)
        .ok_or_else(|| StubError::NotFound("Landlord not found".to_string()))?;
    let linked = match &landlord.region_id {
        Some(RawRegionRef::Id(id)) => Some(id.as_str()),
        Some(RawRegionRef::Populated { id, .. }) => id.as_deref(),
        None => None,
    };
    if linked != Some(region_id) {
        return Err(StubError::BadRequest(
            "Landlord is not linked to this region".to_string(),
        ));
    }
    data.regions
        .iter()
        .find(|region| region.id == region_id)
        .cloned()
        .ok_or_else(|| StubError::NotFound("Region not found".to_string()))
}

fn create_record(
    data: &mut StubData,
    landlord_id: &str,
    region: &RawRegion,
    tenant: &StubTenant,
    now: DateTime<Utc>,
) {
    let id = format!("v-{}", data.next_record);
    data.next_record += 1;

    let documents = region
        .document_url
        .iter()
        .map(|url| RawDocument {
            name: format!("{} police verification form", region.name),
            file_url: url.clone(),
            uploaded_at: now,
            uploaded_by: Some(region.name.clone()),
        })
        .collect();

    data.records.push(RawVerificationRecord {
        record_id: Some(id.clone()),
        verification_id: None,
        tenant_id: RawReference::Populated {
            id: tenant.id.clone(),
            name: Some(tenant.name.clone()),
        },
        landlord_id: Some(RawReference::Id(landlord_id.to_string())),
        region_id: RawRegionRef::Id(region.id.clone()),
        status: VerificationStatus::UnderReview,
        remark: None,
        documents,
        tenant_documents: tenant.uploads.clone(),
        verified_at: None,
    });

    if let Some(landlord) = data.landlords.get_mut(landlord_id) {
        landlord.verification_id.get_or_insert(id);
    }
}

fn tenant_of(record: &RawVerificationRecord) -> &str {
    match &record.tenant_id {
        RawReference::Id(id) | RawReference::Populated { id, .. } => id,
    }
}

fn landlord_of(record: &RawVerificationRecord) -> Option<&str> {
    match record.landlord_id.as_ref()? {
        RawReference::Id(id) | RawReference::Populated { id, .. } => Some(id.as_str()),
    }
}

fn region_of(record: &RawVerificationRecord) -> Option<&str> {
    match &record.region_id {
        RawRegionRef::Id(id) => Some(id.as_str()),
        RawRegionRef::Populated { id, .. } => id.as_deref(),
    }
}
