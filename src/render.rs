//! Terminal tables for the CLI output.

use analytics::{occupancy_percent, DerivedSeriesPoint, ServiceSeriesPoint, SummaryStatistics};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use core_types::{Hospital, ResourceSnapshot, ServiceRecord};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub(crate) fn hospital_table(hospital: &Hospital) -> Table {
    let services: Vec<&str> = hospital
        .services_offered
        .iter()
        .map(|s| s.display_name())
        .collect();

    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Name".to_string(), hospital.name.clone()]);
    table.add_row(vec!["Email".to_string(), hospital.email.clone()]);
    table.add_row(vec!["Type".to_string(), hospital.hospital_type.to_string()]);
    table.add_row(vec!["Level".to_string(), hospital.level.to_string()]);
    table.add_row(vec!["Phone".to_string(), or_dash(hospital.phone.as_deref())]);
    table.add_row(vec!["Address".to_string(), or_dash(hospital.address.as_deref())]);
    table.add_row(vec!["Contact".to_string(), or_dash(hospital.contact.as_deref())]);
    table.add_row(vec![
        "Location".to_string(),
        format!("{:.4}, {:.4}", hospital.latitude, hospital.longitude),
    ]);
    table.add_row(vec!["Services".to_string(), services.join(", ")]);
    table
}

pub(crate) fn resources_table(snapshot: &ResourceSnapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Resource", "Value"]);
    table.add_row(vec![
        "Bed occupancy".to_string(),
        format!(
            "{}% ({} / {} available)",
            occupancy_percent(snapshot),
            snapshot.available_beds,
            snapshot.total_beds
        ),
    ]);
    table.add_row(vec![
        "Available doctors".to_string(),
        format!("{} of {}", snapshot.available_doctors, snapshot.total_doctors),
    ]);
    table.add_row(vec!["Staff on duty".to_string(), snapshot.on_duty_staff.to_string()]);
    table.add_row(vec![
        "Recorded".to_string(),
        snapshot.captured_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    ]);
    table
}

pub(crate) fn services_table(services: &[ServiceRecord]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Service", "Active", "Status", "Queue", "Capacity", "Avg wait", "Max wait",
    ]);
    for service in services {
        table.add_row(vec![
            service.service_type.display_name().to_string(),
            if service.is_active { "yes" } else { "no" }.to_string(),
            service.availability_status.to_string(),
            service.queue_length.to_string(),
            service.current_capacity.to_string(),
            format!("{} min", service.avg_wait_time),
            format!("{} min", service.max_wait_time),
        ]);
    }
    table
}

pub(crate) fn summary_table(summary: &SummaryStatistics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Statistic", "Value"]);
    table.add_row(vec![
        "Average occupancy".to_string(),
        format!("{}%", summary.average_occupancy_percent),
    ]);
    table.add_row(vec![
        "Peak occupancy".to_string(),
        format!("{}%", summary.max_occupancy_percent),
    ]);
    table.add_row(vec![
        "Minimum available beds".to_string(),
        summary.minimum_available_beds.to_string(),
    ]);
    table.add_row(vec![
        "Available doctors (average)".to_string(),
        summary.average_available_doctors.to_string(),
    ]);
    table
}

pub(crate) fn series_table(series: &[DerivedSeriesPoint]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "Occupancy", "Available beds", "Occupied beds", "Available doctors"]);
    for point in series {
        table.add_row(vec![
            point.label.clone(),
            format!("{}%", point.occupancy_rate_percent),
            point.available_beds.to_string(),
            point.occupied_beds.to_string(),
            point.available_doctors.to_string(),
        ]);
    }
    table
}

pub(crate) fn service_series_table(series: &[ServiceSeriesPoint]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "Status", "Queue", "Capacity", "Wait"]);
    for point in series {
        table.add_row(vec![
            point.label.clone(),
            point.status.to_string(),
            point.queue_length.to_string(),
            point.capacity.to_string(),
            format!("{} min", point.wait_time_minutes),
        ]);
    }
    table
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}
