use std::sync::Arc;

use rental_desk::config::AppConfig;
use rental_desk::error::AppError;
use rental_desk::workflows::verification::{
    DeskError, DeskEvent, DeskOptions, HttpVerificationApi, SnapshotCache, VerificationApi,
    VerificationDesk,
};
use tracing::{debug, info};

use crate::cli::Command;
use crate::render;

pub(crate) async fn execute(command: Command, config: &AppConfig) -> Result<(), AppError> {
    let api = Arc::new(HttpVerificationApi::from_config(&config.api)?);
    let mut desk = VerificationDesk::new(api, DeskOptions::from_config(config));
    if let Some(path) = &config.desk.cache_path {
        desk = desk.with_cache(SnapshotCache::new(path));
    }

    info!(?config.environment, api = %config.api.base_url, "verification desk ready");

    let outcome = dispatch(&mut desk, command).await;
    finish(&mut desk, outcome)
}

/// Runs one command and returns what to print on success.
pub(crate) async fn dispatch<A>(
    desk: &mut VerificationDesk<A>,
    command: Command,
) -> Result<String, DeskError>
where
    A: VerificationApi + 'static,
{
    match command {
        Command::Regions => {
            desk.load_regions().await?;
            Ok(render::regions(desk.state().regions.regions()))
        }
        Command::Link { region_id } => {
            desk.link_region(&region_id).await?;
            Ok(String::new())
        }
        Command::Assignments(scope) => {
            load_region_labels(desk).await;
            desk.open_assignments(&scope.landlord, &scope.region).await?;
            Ok(assignment_listing(desk))
        }
        Command::Assign { scope, tenants } => {
            let receipt = desk
                .assign(&scope.landlord, &scope.region, &tenants)
                .await?;
            Ok(render::assignment_receipt(&receipt) + &assignment_listing(desk))
        }
        Command::SendAll(scope) => {
            let receipt = desk.assign_all(&scope.landlord, &scope.region).await?;
            Ok(render::assignment_receipt(&receipt) + &assignment_listing(desk))
        }
        Command::Review(args) => {
            load_region_labels(desk).await;
            desk.open_record(&args.verification_id).await?;
            let receipt = desk
                .review(
                    &args.verification_id,
                    args.decision.into(),
                    args.remark.as_deref(),
                )
                .await?;
            Ok(render::review_receipt(&receipt) + &open_record(desk))
        }
        Command::TenantDocuments { tenant_id } => {
            load_region_labels(desk).await;
            desk.tenant_documents(&tenant_id).await?;
            Ok(open_record(desk))
        }
        Command::Record { verification_id } => {
            load_region_labels(desk).await;
            desk.open_record(&verification_id).await?;
            Ok(open_record(desk))
        }
        Command::Landlord { landlord_id } => {
            load_region_labels(desk).await;
            let loaded = desk.open_landlord(&landlord_id).await;
            // A cached snapshot may still be on screen after a failed refresh.
            let rendered = landlord_summary(desk);
            match loaded {
                Ok(()) => Ok(rendered),
                Err(err) if !rendered.is_empty() => {
                    debug!(error = %err, "landlord refresh failed, showing snapshot");
                    Ok(rendered)
                }
                Err(err) => Err(err),
            }
        }
        // Served by the CLI before any desk exists.
        Command::Stub(_) => Ok(String::new()),
    }
}

/// Prints notices and output; a login redirect ends the run with [`AppError::LoginRequired`].
fn finish<A>(
    desk: &mut VerificationDesk<A>,
    outcome: Result<String, DeskError>,
) -> Result<(), AppError>
where
    A: VerificationApi + 'static,
{
    let events = desk.take_events();
    let notices = render::events(&events);
    let redirected = events
        .iter()
        .any(|event| matches!(event, DeskEvent::LoginRedirect { .. }));

    match outcome {
        Ok(output) => {
            print!("{output}");
            print!("{notices}");
            if redirected {
                return Err(AppError::LoginRequired);
            }
            Ok(())
        }
        Err(err) => {
            eprint!("{notices}");
            Err(err.into())
        }
    }
}

/// Region labels fall back to `N/A` when the catalog cannot be loaded.
async fn load_region_labels<A>(desk: &mut VerificationDesk<A>)
where
    A: VerificationApi + 'static,
{
    if let Err(err) = desk.load_regions().await {
        debug!(error = %err, "region catalog unavailable");
    }
}

fn assignment_listing<A>(desk: &VerificationDesk<A>) -> String
where
    A: VerificationApi + 'static,
{
    match &desk.state().assignments {
        Some(list) => render::assignments(list, |record| desk.region_label(&record.region)),
        None => String::new(),
    }
}

fn open_record<A>(desk: &VerificationDesk<A>) -> String
where
    A: VerificationApi + 'static,
{
    match &desk.state().record {
        Some(record) => render::record(
            record,
            &desk.region_label(&record.region),
            desk.review_controls(record),
            |document| desk.document_url(document),
        ),
        None => String::new(),
    }
}

fn landlord_summary<A>(desk: &VerificationDesk<A>) -> String
where
    A: VerificationApi + 'static,
{
    match &desk.state().landlord {
        Some(view) => render::landlord(
            view,
            view.summary
                .region
                .as_ref()
                .map(|region| desk.region_label(region)),
        ),
        None => String::new(),
    }
}
