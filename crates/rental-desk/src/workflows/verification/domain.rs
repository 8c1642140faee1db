use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Canonical key of a verification record, whichever field the API used for it.
    VerificationId
);
string_id!(TenantId);
string_id!(LandlordId);
string_id!(RegionId);

/// Review status of a verification record.
///
/// `UnderReview` is the only state with outgoing transitions; `Verified` and `Rejected`
/// are terminal as far as this client is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    UnderReview,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::UnderReview => "under_review",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, VerificationStatus::UnderReview)
    }

    /// Status a record lands in once `action` is accepted.
    pub const fn after(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Approve => VerificationStatus::Verified,
            ReviewAction::Reject => VerificationStatus::Rejected,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Landlord decision on a record that is under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
        }
    }
}

/// File attached to a verification record, either by the landlord/region or the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    /// Usually relative; see [`resolve_file_url`].
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Option<String>,
}

impl Document {
    pub fn resolved_url(&self, file_base_url: &str) -> String {
        resolve_file_url(file_base_url, &self.file_url)
    }
}

/// Joins a stored file path onto the file host, leaving absolute URLs untouched.
pub fn resolve_file_url(file_base_url: &str, file_url: &str) -> String {
    let lowered = file_url.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        return file_url.to_string();
    }

    format!(
        "{}/{}",
        file_base_url.trim_end_matches('/'),
        file_url.trim_start_matches('/')
    )
}

/// Verification jurisdiction as listed by the region catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub code: String,
    /// Template document tenants have to view and sign.
    pub document_url: Option<String>,
}

impl Region {
    pub fn display_name(&self) -> String {
        region_label(&self.name, &self.code)
    }
}

/// `"Name (CODE)"`, or just the name when the region carries no code.
pub fn region_label(name: &str, code: &str) -> String {
    if code.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({code})")
    }
}

/// Region as embedded in a record: sometimes populated, sometimes just the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionRef {
    Id(RegionId),
    Populated {
        id: Option<RegionId>,
        name: String,
        code: String,
    },
}

impl RegionRef {
    pub fn id(&self) -> Option<&RegionId> {
        match self {
            RegionRef::Id(id) => Some(id),
            RegionRef::Populated { id, .. } => id.as_ref(),
        }
    }
}

/// One tenant's verification for one landlord/region pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: VerificationId,
    pub tenant_id: TenantId,
    pub tenant_name: Option<String>,
    pub landlord_id: Option<LandlordId>,
    pub region: RegionRef,
    pub status: VerificationStatus,
    /// Only meaningful once the record was rejected.
    pub remark: Option<String>,
    pub documents: Vec<Document>,
    pub tenant_documents: Vec<Document>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    pub fn review_controls(&self, force_review_panel: bool) -> ReviewControls {
        ReviewControls::for_status(self.status, force_review_panel)
    }
}

/// Enabled state of the approve/reject controls for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewControls {
    pub panel_visible: bool,
    pub approve_enabled: bool,
    pub reject_enabled: bool,
}

impl ReviewControls {
    /// Controls depend on the status alone; the force flag only reveals the panel.
    pub const fn for_status(status: VerificationStatus, force_review_panel: bool) -> Self {
        let open = matches!(status, VerificationStatus::UnderReview);
        Self {
            panel_visible: open || force_review_panel,
            approve_enabled: open,
            reject_enabled: open,
        }
    }
}

/// Landlord account projection shown on the summary view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandlordSummary {
    pub id: LandlordId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub region: Option<RegionRef>,
    /// Verification displayed standalone on the summary view.
    pub verification_id: Option<VerificationId>,
    pub tenant_count: Option<u32>,
}

/// Explicit first-wins policy for lookups the API may answer with several records.
pub fn pick_first(records: Vec<VerificationRecord>) -> Option<VerificationRecord> {
    records.into_iter().next()
}

/// Acknowledgement of a fan-out call. Per-tenant outcomes are not observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentReceipt {
    pub landlord_id: LandlordId,
    pub region_id: RegionId,
    pub tenant_count: usize,
}

/// Acknowledgement of an accepted review decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewReceipt {
    pub verification_id: VerificationId,
    pub action: ReviewAction,
    pub status: VerificationStatus,
}
