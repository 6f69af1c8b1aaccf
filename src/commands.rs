use crate::render;
use crate::{
    AnalyticsArgs, Commands, HospitalCommand, HospitalRegisterArgs, HospitalUpdateArgs,
    ResourceSubmitArgs,
    ResourcesCommand, ServiceHistoryArgs, ServiceUpdateArgs, ServicesCommand,
};
use analytics::{AnalysisWindow, ResourceAnalyticsEngine};
use anyhow::{bail, Context};
use chrono::Utc;
use configuration::Config;
use core_types::{AvailabilityStatus, HospitalUpdate, NewHospital, ResourceUpdate, ServiceType};
use database::{DbError, DbRepository};
use std::collections::HashMap;

/// Runs every command that needs the repository.
pub(crate) async fn dispatch(
    command: Commands,
    db_repo: &DbRepository,
    config: &Config,
) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            db_repo.migrate().await.context("Failed to run database migrations")?;
            println!("Database schema is up to date.");
        }
        Commands::Hospital(HospitalCommand::Register(args)) => handle_hospital_register(args, db_repo).await?,
        Commands::Hospital(HospitalCommand::Show(args)) => {
            let hospital = db_repo.get_hospital_by_owner(args.owner).await?;
            println!("{}", render::hospital_table(&hospital));
        }
        Commands::Hospital(HospitalCommand::Update(args)) => handle_hospital_update(args, db_repo).await?,
        Commands::Resources(ResourcesCommand::Current(args)) => {
            let hospital = db_repo.get_hospital_by_owner(args.owner).await?;
            match db_repo.get_current_resources(hospital.id).await? {
                Some(snapshot) => println!("{}", render::resources_table(&snapshot)),
                None => println!("No resources recorded yet for {}.", hospital.name),
            }
        }
        Commands::Resources(ResourcesCommand::Submit(args)) => handle_resource_submit(args, db_repo).await?,
        Commands::Services(ServicesCommand::List(args)) => {
            let hospital = db_repo.get_hospital_by_owner(args.owner).await?;
            let services = db_repo.services_for(&hospital).await?;
            println!("{}", render::services_table(&services));
        }
        Commands::Services(ServicesCommand::Update(args)) => {
            handle_service_update(args, db_repo, config).await?
        }
        Commands::Services(ServicesCommand::History(args)) => {
            handle_service_history(args, db_repo, config).await?
        }
        Commands::Analytics(args) => handle_analytics(args, db_repo, config).await?,
    }
    Ok(())
}

async fn handle_hospital_register(args: HospitalRegisterArgs, db_repo: &DbRepository) -> anyhow::Result<()> {
    let mut services_offered = Vec::with_capacity(args.services.len());
    for service in args.services {
        if !services_offered.contains(&service) {
            services_offered.push(service);
        }
    }

    let registration = NewHospital {
        owner_id: args.owner.owner,
        name: args.name,
        email: args.email,
        phone: args.phone,
        address: args.address,
        contact: args.contact,
        hospital_type: args.hospital_type,
        level: args.level,
        latitude: args.latitude,
        longitude: args.longitude,
        services_offered,
    };

    let hospital = db_repo
        .create_hospital(&registration)
        .await
        .context("Hospital was not registered")?;
    println!("Hospital registered.");
    println!("{}", render::hospital_table(&hospital));
    Ok(())
}

async fn handle_hospital_update(args: HospitalUpdateArgs, db_repo: &DbRepository) -> anyhow::Result<()> {
    let hospital = db_repo.get_hospital_by_owner(args.owner.owner).await?;

    let mut update = HospitalUpdate::from(&hospital);
    if let Some(name) = args.name {
        update.name = name;
    }
    if args.phone.is_some() {
        update.phone = args.phone;
    }
    if args.address.is_some() {
        update.address = args.address;
    }
    if args.contact.is_some() {
        update.contact = args.contact;
    }
    if let Some(hospital_type) = args.hospital_type {
        update.hospital_type = hospital_type;
    }
    if let Some(level) = args.level {
        update.level = level;
    }

    let updated = db_repo.update_hospital(hospital.id, &update).await?;
    println!("Hospital information updated.");
    println!("{}", render::hospital_table(&updated));
    Ok(())
}

async fn handle_resource_submit(args: ResourceSubmitArgs, db_repo: &DbRepository) -> anyhow::Result<()> {
    let hospital = db_repo.get_hospital_by_owner(args.owner.owner).await?;

    let update = ResourceUpdate {
        total_beds: args.total_beds,
        available_beds: args.available_beds,
        total_doctors: args.total_doctors,
        available_doctors: args.available_doctors,
        on_duty_staff: args.on_duty_staff,
        beds_by_service: by_service(&args.beds_by_service),
        doctors_by_service: by_service(&args.doctors_by_service),
    };

    let snapshot = db_repo
        .submit_resources(hospital.id, &update)
        .await
        .context("Resource update was not recorded")?;
    println!("Resources updated.");
    println!("{}", render::resources_table(&snapshot));
    Ok(())
}

async fn handle_service_update(
    args: ServiceUpdateArgs,
    db_repo: &DbRepository,
    config: &Config,
) -> anyhow::Result<()> {
    let hospital = db_repo.get_hospital_by_owner(args.owner.owner).await?;
    if !hospital.services_offered.contains(&args.service) {
        bail!(
            "{} does not offer the {} service",
            hospital.name,
            args.service.display_name()
        );
    }

    if let Some(status) = args.status.filter(|_| args.only_sets_status()) {
        match db_repo.update_service_status(hospital.id, args.service, status).await {
            Ok(updated) => {
                db_repo.record_service_snapshot(&updated.to_snapshot()).await?;
                println!("{}", render::services_table(std::slice::from_ref(&updated)));
                return Ok(());
            }
            // Never saved yet: fall through and store the full record.
            Err(DbError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut record = db_repo
        .services_for(&hospital)
        .await?
        .into_iter()
        .find(|record| record.service_type == args.service)
        .context("Offered service is missing from the service list")?;

    if let Some(active) = args.active {
        record.is_active = active;
    }
    if let Some(queue) = args.queue {
        record.queue_length = queue;
    }
    if let Some(capacity) = args.capacity {
        record.current_capacity = capacity;
    }
    if let Some(avg_wait) = args.avg_wait {
        record.avg_wait_time = avg_wait;
    }
    if let Some(max_wait) = args.max_wait {
        record.max_wait_time = max_wait;
    }
    record.availability_status = args.status.unwrap_or_else(|| {
        AvailabilityStatus::derive(
            record.is_active,
            record.queue_length,
            record.current_capacity,
            config.services.busy_queue_threshold,
        )
    });

    let saved = db_repo.save_service(&record).await?;
    println!("{}", render::services_table(std::slice::from_ref(&saved)));
    Ok(())
}

async fn handle_service_history(
    args: ServiceHistoryArgs,
    db_repo: &DbRepository,
    config: &Config,
) -> anyhow::Result<()> {
    let hospital = db_repo.get_hospital_by_owner(args.owner.owner).await?;
    let window = resolve_window(args.window, config);

    let history = db_repo
        .get_service_history(hospital.id, args.service, config.analytics.history_limit)
        .await?;

    let engine = ResourceAnalyticsEngine::with_label_format(&config.analytics.label_format);
    let windowed = engine.select_window_now(&history, window.days());
    let series = engine.to_service_series(&windowed);

    if series.is_empty() {
        println!(
            "No history for {} in the selected period ({}).",
            args.service.display_name(),
            window
        );
        return Ok(());
    }
    println!("{} - {}", args.service.display_name(), window);
    println!("{}", render::service_series_table(&series));
    Ok(())
}

async fn handle_analytics(args: AnalyticsArgs, db_repo: &DbRepository, config: &Config) -> anyhow::Result<()> {
    let hospital = db_repo.get_hospital_by_owner(args.owner.owner).await?;
    let window = resolve_window(args.window, config);

    let history = db_repo
        .get_resources_history(hospital.id, config.analytics.history_limit)
        .await?;

    let engine = ResourceAnalyticsEngine::with_label_format(&config.analytics.label_format);
    let report = engine.analyze(&history, window.days(), Utc::now());
    tracing::info!(
        hospital_id = %hospital.id,
        window_days = report.window_days,
        snapshots = report.snapshot_count,
        "Analytics computed."
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} - {}", hospital.name, window);
    println!("{}", render::summary_table(&report.summary));
    if report.is_empty() {
        println!("No data for the selected period. Record resources to populate the charts.");
    } else {
        println!("{}", render::series_table(&report.series));
    }
    Ok(())
}

fn resolve_window(requested: Option<AnalysisWindow>, config: &Config) -> AnalysisWindow {
    requested.unwrap_or_else(|| AnalysisWindow::from_days(config.analytics.default_window_days))
}

fn by_service(pairs: &[(ServiceType, i32)]) -> HashMap<String, i32> {
    pairs
        .iter()
        .map(|(service, count)| (service.as_str().to_string(), *count))
        .collect()
}
