use clap::{Args, Parser, Subcommand, ValueEnum};
use rental_desk::config::AppConfig;
use rental_desk::error::AppError;
use rental_desk::telemetry;
use rental_desk::workflows::verification::ReviewAction;

use crate::commands;
use crate::stub;

#[derive(Parser, Debug)]
#[command(
    name = "rental-desk",
    about = "Assign and review tenant police verifications from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// List the verification regions
    Regions,
    /// Link the signed-in landlord to a region
    Link {
        region_id: String,
    },
    /// Show the verification records of a landlord in a region
    Assignments(ScopeArgs),
    /// Assign the region's verification documents to selected tenants
    Assign {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Tenant to assign; repeat for several tenants
        #[arg(long = "tenant", required = true)]
        tenants: Vec<String>,
    },
    /// Assign the region's verification documents to every tenant of the landlord
    SendAll(ScopeArgs),
    /// Approve or reject a verification record
    Review(ReviewArgs),
    /// Show a tenant's verification record and uploaded documents
    TenantDocuments {
        tenant_id: String,
    },
    /// Show one verification record
    Record {
        verification_id: String,
    },
    /// Show a landlord's account summary
    Landlord {
        landlord_id: String,
    },
    /// Run the in-memory contract stub server
    Stub(StubArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ScopeArgs {
    /// Landlord whose tenants are assigned
    #[arg(long)]
    pub(crate) landlord: String,
    /// Region whose document set is assigned
    #[arg(long)]
    pub(crate) region: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReviewArgs {
    pub(crate) verification_id: String,
    #[arg(value_enum)]
    pub(crate) decision: Decision,
    /// Reason for the decision; required when rejecting
    #[arg(long)]
    pub(crate) remark: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for ReviewAction {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approve => ReviewAction::Approve,
            Decision::Reject => ReviewAction::Reject,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct StubArgs {
    /// Override the configured host for the stub server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the stub server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Stub(args) => stub::server::run(config, args.host, args.port).await,
        command => commands::execute(command, &config).await,
    }
}
