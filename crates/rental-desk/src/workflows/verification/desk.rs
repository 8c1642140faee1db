use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::{ApiError, VerificationApi};
use super::cache::SnapshotCache;
use super::domain::{
    pick_first, AssignmentReceipt, Document, LandlordId, LandlordSummary, RegionId, RegionRef,
    ReviewAction, ReviewControls, ReviewReceipt, TenantId, VerificationId, VerificationRecord,
    VerificationStatus,
};
use super::notice::{DeskEvent, Notice, Operation};
use super::regions::RegionCatalog;
use super::validation::{require_id, ReviewDecision, TenantSelection, ValidationError};
use crate::config::AppConfig;

/// Startup options for a desk.
#[derive(Debug, Clone)]
pub struct DeskOptions {
    pub file_base_url: String,
    pub force_review_panel: bool,
}

impl DeskOptions {
    pub fn new(file_base_url: impl Into<String>) -> Self {
        Self {
            file_base_url: file_base_url.into(),
            force_review_panel: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            file_base_url: config.api.file_base_url.clone(),
            force_review_panel: config.desk.force_review_panel,
        }
    }
}

/// Read to re-run after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshScope {
    Assignments,
    Record(VerificationId),
    LandlordSummary,
}

/// Assignment records of one landlord/region pair as last fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentList {
    pub landlord_id: LandlordId,
    pub region_id: RegionId,
    pub records: Vec<VerificationRecord>,
}

impl AssignmentList {
    /// First record for the tenant. Duplicates are possible; later ones are ignored.
    pub fn for_tenant(&self, tenant_id: &TenantId) -> Option<&VerificationRecord> {
        self.records
            .iter()
            .find(|record| &record.tenant_id == tenant_id)
    }

    pub fn get(&self, id: &VerificationId) -> Option<&VerificationRecord> {
        self.records.iter().find(|record| &record.id == id)
    }
}

/// Landlord summary, possibly served from the snapshot cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandlordView {
    pub summary: LandlordSummary,
    /// Set when the API was unreachable and the cached copy is shown instead.
    pub stale_since: Option<DateTime<Utc>>,
}

impl LandlordView {
    pub fn is_stale(&self) -> bool {
        self.stale_since.is_some()
    }
}

/// Client-held, non-authoritative projection of server state.
#[derive(Debug, Clone, Default)]
pub struct DeskState {
    pub regions: RegionCatalog,
    pub assignment_scope: Option<(LandlordId, RegionId)>,
    pub assignments: Option<AssignmentList>,
    /// Record open in the detail view, from a direct lookup or the tenant document viewer.
    pub record: Option<VerificationRecord>,
    pub landlord_scope: Option<LandlordId>,
    pub landlord: Option<LandlordView>,
}

impl DeskState {
    fn held_copies<'a>(
        &'a self,
        id: &'a VerificationId,
    ) -> impl Iterator<Item = &'a VerificationRecord> + 'a {
        self.record
            .iter()
            .filter(move |record| &record.id == id)
            .chain(
                self.assignments
                    .iter()
                    .filter_map(move |list| list.get(id)),
            )
    }
}

/// In-flight counters per operation, shared with observers through cheap clones.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlags {
    in_flight: Arc<Mutex<BTreeMap<Operation, usize>>>,
}

impl LoadingFlags {
    pub fn is_loading(&self, operation: Operation) -> bool {
        self.lock().contains_key(&operation)
    }

    pub fn any(&self) -> bool {
        !self.lock().is_empty()
    }

    fn begin(&self, operation: Operation) -> LoadingGuard {
        *self.lock().entry(operation).or_insert(0) += 1;
        LoadingGuard {
            flags: self.clone(),
            operation,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Operation, usize>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears its flag on every exit path, including cancellation.
struct LoadingGuard {
    flags: LoadingFlags,
    operation: Operation,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut in_flight = self.flags.lock();
        if let Some(count) = in_flight.get_mut(&self.operation) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&self.operation);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no verification record found for tenant {0}")]
    NotFound(TenantId),
    #[error("view closed before the request completed")]
    Cancelled,
}

impl DeskError {
    /// Text for the notification shown to the operator.
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            DeskError::Validation(err) => err.to_string(),
            DeskError::Api(err) => err
                .server_message()
                .unwrap_or(operation.fallback_message())
                .to_string(),
            DeskError::NotFound(_) => "No documents found for this tenant".to_string(),
            DeskError::Cancelled => operation.fallback_message().to_string(),
        }
    }
}

/// Drives the assignment and review workflow for one view.
///
/// Every mutation is followed by exactly one re-fetch of each view that shows the
/// affected data; client state is replaced wholesale, never merged. Closing the desk
/// cancels in-flight requests and no result is committed afterwards.
pub struct VerificationDesk<A> {
    api: Arc<A>,
    options: DeskOptions,
    state: DeskState,
    loading: LoadingFlags,
    events: Vec<DeskEvent>,
    lifetime: CancellationToken,
    cache: Option<SnapshotCache>,
}

impl<A> VerificationDesk<A>
where
    A: VerificationApi + 'static,
{
    pub fn new(api: Arc<A>, options: DeskOptions) -> Self {
        Self {
            api,
            options,
            state: DeskState::default(),
            loading: LoadingFlags::default(),
            events: Vec::new(),
            lifetime: CancellationToken::new(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn state(&self) -> &DeskState {
        &self.state
    }

    pub fn options(&self) -> &DeskOptions {
        &self.options
    }

    pub fn loading(&self) -> LoadingFlags {
        self.loading.clone()
    }

    /// Token tied to the view; cancelling it is equivalent to [`Self::close`].
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub fn close(&self) {
        self.lifetime.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn events(&self) -> &[DeskEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DeskEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn review_controls(&self, record: &VerificationRecord) -> ReviewControls {
        record.review_controls(self.options.force_review_panel)
    }

    pub fn region_label(&self, region: &RegionRef) -> String {
        self.state.regions.label(region)
    }

    pub fn document_url(&self, document: &Document) -> String {
        document.resolved_url(&self.options.file_base_url)
    }

    pub async fn load_regions(&mut self) -> Result<(), DeskError> {
        let api = Arc::clone(&self.api);
        let regions = self.run(Operation::LoadRegions, api.list_regions()).await?;
        debug!(count = regions.len(), "regions loaded");
        self.state.regions.replace(regions);
        Ok(())
    }

    /// Links the signed-in landlord to a region, the prerequisite for assigning in it.
    pub async fn link_region(&mut self, region_id: &str) -> Result<(), DeskError> {
        let operation = Operation::LinkRegion;
        let region_id = RegionId(self.validated(operation, "region id", region_id)?);

        let api = Arc::clone(&self.api);
        self.run(operation, api.link_region(&region_id)).await?;

        info!(region = %region_id, "landlord linked to region");
        self.notify(operation, "Region linked successfully");
        if self.state.landlord_scope.is_some() {
            self.refresh_after_mutation(RefreshScope::LandlordSummary)
                .await;
        }
        Ok(())
    }

    /// Selects the landlord/region pair whose assignments the view lists, and loads them.
    pub async fn open_assignments(
        &mut self,
        landlord_id: &str,
        region_id: &str,
    ) -> Result<(), DeskError> {
        let operation = Operation::LoadAssignments;
        let landlord_id = LandlordId(self.validated(operation, "landlord id", landlord_id)?);
        let region_id = RegionId(self.validated(operation, "region id", region_id)?);
        self.select_assignments(landlord_id, region_id);
        self.refresh(RefreshScope::Assignments).await
    }

    pub async fn open_record(&mut self, verification_id: &str) -> Result<(), DeskError> {
        let id = VerificationId(self.validated(
            Operation::LoadRecord,
            "verification id",
            verification_id,
        )?);
        self.refresh(RefreshScope::Record(id)).await
    }

    pub async fn open_landlord(&mut self, landlord_id: &str) -> Result<(), DeskError> {
        let landlord_id = LandlordId(self.validated(
            Operation::LoadLandlord,
            "landlord id",
            landlord_id,
        )?);
        if self
            .state
            .landlord
            .as_ref()
            .is_some_and(|view| view.summary.id != landlord_id)
        {
            self.state.landlord = None;
        }
        self.state.landlord_scope = Some(landlord_id);
        self.refresh(RefreshScope::LandlordSummary).await
    }

    /// Fans the region's document set out to the selected tenants.
    pub async fn assign<I, S>(
        &mut self,
        landlord_id: &str,
        region_id: &str,
        tenant_ids: I,
    ) -> Result<AssignmentReceipt, DeskError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let operation = Operation::Assign;
        let landlord_id = LandlordId(self.validated(operation, "landlord id", landlord_id)?);
        let region_id = RegionId(self.validated(operation, "region id", region_id)?);
        let tenants =
            TenantSelection::new(tenant_ids).map_err(|err| self.fail(operation, err.into()))?;

        let api = Arc::clone(&self.api);
        self.run(operation, api.assign(&landlord_id, &region_id, &tenants))
            .await?;

        info!(
            landlord = %landlord_id,
            region = %region_id,
            tenants = tenants.len(),
            "verification assigned"
        );
        self.notify(
            operation,
            format!("Verification assigned to {} tenant(s)", tenants.len()),
        );
        self.after_assignment(&landlord_id, &region_id).await;

        Ok(AssignmentReceipt {
            landlord_id,
            region_id,
            tenant_count: tenants.len(),
        })
    }

    /// Assigns to the landlord's whole tenant roster in the region.
    pub async fn assign_all(
        &mut self,
        landlord_id: &str,
        region_id: &str,
    ) -> Result<AssignmentReceipt, DeskError> {
        let operation = Operation::AssignAll;
        let landlord_id = LandlordId(self.validated(operation, "landlord id", landlord_id)?);
        let region_id = RegionId(self.validated(operation, "region id", region_id)?);

        let api = Arc::clone(&self.api);
        let assigned = self
            .run(operation, api.assign_all(&landlord_id, &region_id))
            .await?;

        info!(
            landlord = %landlord_id,
            region = %region_id,
            assigned,
            "verification assigned to all tenants"
        );
        self.notify(
            operation,
            format!("Verification assigned to {assigned} tenant(s)"),
        );
        self.after_assignment(&landlord_id, &region_id).await;

        Ok(AssignmentReceipt {
            landlord_id,
            region_id,
            tenant_count: assigned as usize,
        })
    }

    /// Loads the tenant's verification record with its uploaded documents into the
    /// detail view. The first record wins when the API returns several.
    pub async fn tenant_documents(
        &mut self,
        tenant_id: &str,
    ) -> Result<VerificationRecord, DeskError> {
        let operation = Operation::LoadTenantDocuments;
        let tenant_id = TenantId(self.validated(operation, "tenant id", tenant_id)?);

        let api = Arc::clone(&self.api);
        let records = self
            .run(operation, api.tenant_verifications(&tenant_id))
            .await?;
        if records.len() > 1 {
            debug!(
                tenant = %tenant_id,
                count = records.len(),
                "several verification records, using the first"
            );
        }

        match pick_first(records) {
            Some(record) => {
                self.state.record = Some(record.clone());
                Ok(record)
            }
            None => Err(self.fail(operation, DeskError::NotFound(tenant_id))),
        }
    }

    /// Submits an approve/reject decision and re-fetches every view showing the record.
    pub async fn review(
        &mut self,
        verification_id: &str,
        action: ReviewAction,
        remark: Option<&str>,
    ) -> Result<ReviewReceipt, DeskError> {
        let operation = Operation::Review;
        let id = VerificationId(self.validated(operation, "verification id", verification_id)?);
        let decision =
            ReviewDecision::new(action, remark).map_err(|err| self.fail(operation, err.into()))?;

        // Re-opening resolved records is not part of the known server contract.
        let resolved = self
            .state
            .held_copies(&id)
            .map(|record| record.status)
            .find(|status| status.is_terminal());
        if let Some(status) = resolved {
            let err = ValidationError::AlreadyResolved { id, status };
            return Err(self.fail(operation, err.into()));
        }

        let api = Arc::clone(&self.api);
        self.run(operation, api.review(&id, &decision)).await?;

        info!(verification = %id, action = action.label(), "review submitted");
        self.notify(
            operation,
            match action {
                ReviewAction::Approve => "Verification approved",
                ReviewAction::Reject => "Verification rejected",
            },
        );

        for scope in self.refresh_targets(&id) {
            self.refresh_after_mutation(scope).await;
        }

        Ok(ReviewReceipt {
            verification_id: id,
            action,
            status: VerificationStatus::after(action),
        })
    }

    /// Re-runs one read and replaces the matching state. Without a selected scope there
    /// is nothing to refresh.
    pub async fn refresh(&mut self, scope: RefreshScope) -> Result<(), DeskError> {
        let api = Arc::clone(&self.api);
        match scope {
            RefreshScope::Assignments => {
                let Some((landlord_id, region_id)) = self.state.assignment_scope.clone() else {
                    debug!("no assignment list selected");
                    return Ok(());
                };
                let records = self
                    .run(
                        Operation::LoadAssignments,
                        api.list_assignments(&landlord_id, &region_id),
                    )
                    .await?;
                self.state.assignments = Some(AssignmentList {
                    landlord_id,
                    region_id,
                    records,
                });
            }
            RefreshScope::Record(id) => {
                let record = self
                    .run(Operation::LoadRecord, api.fetch_verification(&id))
                    .await?;
                self.state.record = Some(record);
            }
            RefreshScope::LandlordSummary => {
                let Some(landlord_id) = self.state.landlord_scope.clone() else {
                    debug!("no landlord selected");
                    return Ok(());
                };
                match self
                    .run(Operation::LoadLandlord, api.fetch_landlord(&landlord_id))
                    .await
                {
                    Ok(summary) => {
                        self.store_snapshot(&summary);
                        self.state.landlord = Some(LandlordView {
                            summary,
                            stale_since: None,
                        });
                    }
                    Err(DeskError::Cancelled) => return Err(DeskError::Cancelled),
                    Err(err) => {
                        self.fall_back_to_snapshot(&landlord_id);
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    fn refresh_targets(&self, id: &VerificationId) -> Vec<RefreshScope> {
        let mut targets = Vec::new();
        if self
            .state
            .assignments
            .as_ref()
            .is_some_and(|list| list.get(id).is_some())
        {
            targets.push(RefreshScope::Assignments);
        }
        if self
            .state
            .record
            .as_ref()
            .is_some_and(|record| &record.id == id)
        {
            targets.push(RefreshScope::Record(id.clone()));
        }
        if self
            .state
            .landlord
            .as_ref()
            .is_some_and(|view| view.summary.verification_id.as_ref() == Some(id))
        {
            targets.push(RefreshScope::LandlordSummary);
        }
        targets
    }

    async fn after_assignment(&mut self, landlord_id: &LandlordId, region_id: &RegionId) {
        self.select_assignments(landlord_id.clone(), region_id.clone());
        self.refresh_after_mutation(RefreshScope::Assignments).await;
    }

    /// A list loaded for another landlord/region pair is dropped rather than shown
    /// under the new selection.
    fn select_assignments(&mut self, landlord_id: LandlordId, region_id: RegionId) {
        if self
            .state
            .assignments
            .as_ref()
            .is_some_and(|list| list.landlord_id != landlord_id || list.region_id != region_id)
        {
            self.state.assignments = None;
        }
        self.state.assignment_scope = Some((landlord_id, region_id));
    }

    /// The mutation already succeeded; a failed refresh is reported and leaves stale state.
    async fn refresh_after_mutation(&mut self, scope: RefreshScope) {
        if let Err(err) = self.refresh(scope.clone()).await {
            debug!(?scope, error = %err, "refresh after mutation failed");
        }
    }

    async fn run<T, F>(&mut self, operation: Operation, request: F) -> Result<T, DeskError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let result = match self.guarded(operation, request).await {
            Ok(_) if self.lifetime.is_cancelled() => Err(DeskError::Cancelled),
            other => other,
        };
        result.map_err(|err| self.fail(operation, err))
    }

    async fn guarded<T, F>(&self, operation: Operation, request: F) -> Result<T, DeskError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let _loading = self.loading.begin(operation);
        tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => Err(DeskError::Cancelled),
            result = request => result.map_err(DeskError::from),
        }
    }

    fn validated(
        &mut self,
        operation: Operation,
        field: &'static str,
        raw: &str,
    ) -> Result<String, DeskError> {
        require_id(field, raw).map_err(|err| self.fail(operation, err.into()))
    }

    fn notify(&mut self, operation: Operation, message: impl Into<String>) {
        self.events
            .push(DeskEvent::Notice(Notice::info(operation, message)));
    }

    fn fail(&mut self, operation: Operation, err: DeskError) -> DeskError {
        match &err {
            DeskError::Cancelled => {
                debug!(operation = operation.label(), "view closed, result dropped");
            }
            DeskError::Api(ApiError::Unauthenticated) => {
                warn!(operation = operation.label(), "session missing, redirecting to login");
                self.events.push(DeskEvent::LoginRedirect { operation });
            }
            other => {
                warn!(
                    operation = operation.label(),
                    error = %other,
                    "verification operation failed"
                );
                self.events.push(DeskEvent::Notice(Notice::error(
                    operation,
                    other.user_message(operation),
                )));
            }
        }
        err
    }

    fn store_snapshot(&self, summary: &LandlordSummary) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.store(summary) {
                warn!(error = %err, "unable to write landlord snapshot");
            }
        }
    }

    fn fall_back_to_snapshot(&mut self, landlord_id: &LandlordId) {
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.load(landlord_id) {
            Ok(Some((summary, saved_at))) => {
                info!(landlord = %landlord_id, %saved_at, "showing cached landlord summary");
                self.state.landlord = Some(LandlordView {
                    summary,
                    stale_since: Some(saved_at),
                });
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "landlord snapshot unreadable"),
        }
    }
}
