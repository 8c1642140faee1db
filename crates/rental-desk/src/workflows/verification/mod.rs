//! Police-verification assignment and review workflow.
//!
//! Regions come from the catalog, landlords link to a region and fan the region's document
//! set out to their tenants, and each resulting record moves from `under_review` to
//! `verified` or `rejected` once the landlord reviews it. The desk keeps the client-side
//! projection of that server state and re-fetches it after every mutation.

pub mod api;
pub mod cache;
pub mod credentials;
pub mod desk;
pub mod domain;
pub mod http;
pub mod notice;
pub mod regions;
pub mod validation;
pub mod wire;

#[cfg(test)]
mod tests;

pub use api::{ApiError, MockVerificationApi, VerificationApi};
pub use cache::{CacheError, SnapshotCache};
pub use credentials::{token_source, FileToken, StaticToken, TokenSource};
pub use desk::{
    AssignmentList, DeskError, DeskOptions, DeskState, LandlordView, LoadingFlags, RefreshScope,
    VerificationDesk,
};
pub use domain::{
    pick_first, resolve_file_url, AssignmentReceipt, Document, LandlordId, LandlordSummary,
    Region, RegionId, RegionRef, ReviewAction, ReviewControls, ReviewReceipt, TenantId,
    VerificationId, VerificationRecord, VerificationStatus,
};
pub use http::HttpVerificationApi;
pub use notice::{DeskEvent, Notice, NoticeLevel, Operation};
pub use regions::RegionCatalog;
pub use validation::{ReviewDecision, TenantSelection, ValidationError};
