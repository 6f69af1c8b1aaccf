use analytics::AnalysisWindow;
use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::ConfigArgs;
use core_types::{AvailabilityStatus, HospitalLevel, HospitalType, ServiceType};
use database::{connect, DbRepository};
use uuid::Uuid;

mod commands;
mod render;

/// The main entry point for the Pulse hospital administration tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config.config)
        .with_context(|| format!("Failed to load {}", cli.config.config.display()))?;
    if let Some(filter) = &cli.config.log_filter {
        config.logging.filter = filter.clone();
    }
    // Held until exit so the file writer flushes.
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Initialize the database connection
    let db_pool = connect().await.context("Failed to connect to the database")?;

    let db_repo = DbRepository::new(db_pool);

    // Execute the appropriate command
    let result = commands::dispatch(cli.command, &db_repo, &config).await;

    if let Err(e) = &result {
        tracing::error!(error = ?e, "Command failed.");
    }
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Hospital administration: profile, resources, service queues and analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Apply the database migrations.
    Migrate,
    /// View or edit the hospital profile.
    #[command(subcommand)]
    Hospital(HospitalCommand),
    /// View or submit bed and staff counts.
    #[command(subcommand)]
    Resources(ResourcesCommand),
    /// Manage per-service queues and wait times.
    #[command(subcommand)]
    Services(ServicesCommand),
    /// Occupancy charts and summary statistics over a trailing window.
    Analytics(AnalyticsArgs),
}

#[derive(Subcommand)]
pub(crate) enum HospitalCommand {
    /// Register the hospital for an owner account.
    Register(HospitalRegisterArgs),
    /// Show the hospital profile.
    Show(OwnerArgs),
    /// Edit profile fields. Omitted fields keep their current value.
    Update(HospitalUpdateArgs),
}

#[derive(Subcommand)]
pub(crate) enum ResourcesCommand {
    /// Show the latest resource snapshot.
    Current(OwnerArgs),
    /// Record a new resource snapshot.
    Submit(ResourceSubmitArgs),
}

#[derive(Subcommand)]
pub(crate) enum ServicesCommand {
    /// List every offered service with its queue status.
    List(OwnerArgs),
    /// Update a service's queue. The status is derived unless given.
    Update(ServiceUpdateArgs),
    /// Show a service's queue history.
    History(ServiceHistoryArgs),
}

#[derive(Parser)]
pub(crate) struct OwnerArgs {
    /// The account that owns the hospital.
    #[arg(long)]
    pub owner: Uuid,
}

#[derive(Parser)]
pub(crate) struct HospitalRegisterArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    /// public, private or mixed.
    #[arg(long = "type", default_value = "public")]
    pub hospital_type: HospitalType,
    /// primary, secondary or tertiary.
    #[arg(long, default_value = "primary")]
    pub level: HospitalLevel,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
    /// An offered service. Repeatable or comma-separated, e.g. `--service emergency,surgery`.
    #[arg(long = "service", value_delimiter = ',', required = true)]
    pub services: Vec<ServiceType>,
}

#[derive(Parser)]
pub(crate) struct HospitalUpdateArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    /// public, private or mixed.
    #[arg(long = "type")]
    pub hospital_type: Option<HospitalType>,
    /// primary, secondary or tertiary.
    #[arg(long)]
    pub level: Option<HospitalLevel>,
}

#[derive(Parser)]
pub(crate) struct ResourceSubmitArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[arg(long)]
    pub total_beds: i32,
    #[arg(long)]
    pub available_beds: i32,
    #[arg(long)]
    pub total_doctors: i32,
    #[arg(long)]
    pub available_doctors: i32,
    #[arg(long, default_value_t = 0)]
    pub on_duty_staff: i32,
    /// Beds assigned to a service, e.g. `--beds-for surgery=12`. Repeatable.
    #[arg(long = "beds-for", value_parser = parse_service_count)]
    pub beds_by_service: Vec<(ServiceType, i32)>,
    /// Doctors assigned to a service, e.g. `--doctors-for emergency=4`. Repeatable.
    #[arg(long = "doctors-for", value_parser = parse_service_count)]
    pub doctors_by_service: Vec<(ServiceType, i32)>,
}

#[derive(Parser)]
pub(crate) struct ServiceUpdateArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[arg(long)]
    pub service: ServiceType,
    #[arg(long)]
    pub active: Option<bool>,
    #[arg(long)]
    pub queue: Option<i32>,
    #[arg(long)]
    pub capacity: Option<i32>,
    /// Average wait in minutes.
    #[arg(long)]
    pub avg_wait: Option<i32>,
    /// Maximum wait in minutes.
    #[arg(long)]
    pub max_wait: Option<i32>,
    /// available, busy, full or closed. Derived from the queue when omitted.
    #[arg(long)]
    pub status: Option<AvailabilityStatus>,
}

#[derive(Parser)]
pub(crate) struct ServiceHistoryArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[arg(long)]
    pub service: ServiceType,
    /// 24h, 7, 30, 90 or any number of days. Defaults to the configured window.
    #[arg(long)]
    pub window: Option<AnalysisWindow>,
}

#[derive(Parser)]
pub(crate) struct AnalyticsArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    /// 24h, 7, 30, 90 or any number of days. Defaults to the configured window.
    #[arg(long)]
    pub window: Option<AnalysisWindow>,
    /// Print the series and summary as JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

impl ServiceUpdateArgs {
    /// True when `--status` is the only field being changed.
    pub(crate) fn only_sets_status(&self) -> bool {
        self.active.is_none()
            && self.queue.is_none()
            && self.capacity.is_none()
            && self.avg_wait.is_none()
            && self.max_wait.is_none()
    }
}

/// Parses `service=count` pairs such as `surgery=12`.
fn parse_service_count(raw: &str) -> Result<(ServiceType, i32), String> {
    let (service, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SERVICE=COUNT, got '{raw}'"))?;
    let service = service.trim().parse::<ServiceType>().map_err(|e| e.to_string())?;
    let count = count
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid count '{count}': {e}"))?;
    Ok((service, count))
}
