use crate::enums::{AvailabilityStatus, HospitalLevel, HospitalType, ServiceType};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A record that was captured at a single point in time.
///
/// Implemented by every append-only history record so that time-window
/// selection can be shared between resource and service histories.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// One recorded observation of a hospital's resource counts.
///
/// Snapshots are append-only: one is created for every submitted
/// `ResourceUpdate` and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub total_beds: i32,
    pub available_beds: i32,
    pub total_doctors: i32,
    pub available_doctors: i32,
    pub on_duty_staff: i32,
    // Informational only, keyed by `ServiceType` identifier.
    #[serde(default)]
    pub beds_by_service: HashMap<String, i32>,
    #[serde(default)]
    pub doctors_by_service: HashMap<String, i32>,
}

impl Timestamped for ResourceSnapshot {
    fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// The counts an operator submits to append a new `ResourceSnapshot`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUpdate {
    pub total_beds: i32,
    pub available_beds: i32,
    pub total_doctors: i32,
    pub available_doctors: i32,
    pub on_duty_staff: i32,
    #[serde(default)]
    pub beds_by_service: HashMap<String, i32>,
    #[serde(default)]
    pub doctors_by_service: HashMap<String, i32>,
}

impl ResourceUpdate {
    /// Checks the invariants every stored snapshot must hold.
    ///
    /// Counts are non-negative, and the available beds and doctors never
    /// exceed their totals. The analytics engine relies on these and does
    /// not check them again.
    pub fn validate(&self) -> Result<(), CoreError> {
        let counts = [
            ("total_beds", self.total_beds),
            ("available_beds", self.available_beds),
            ("total_doctors", self.total_doctors),
            ("available_doctors", self.available_doctors),
            ("on_duty_staff", self.on_duty_staff),
        ];
        for (field, value) in counts {
            if value < 0 {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    format!("must not be negative (got {value})"),
                ));
            }
        }
        for (service, count) in self.beds_by_service.iter().chain(&self.doctors_by_service) {
            if *count < 0 {
                return Err(CoreError::InvalidInput(
                    format!("by_service[{service}]"),
                    format!("must not be negative (got {count})"),
                ));
            }
        }

        if self.available_beds > self.total_beds {
            return Err(CoreError::InvalidInput(
                "available_beds".to_string(),
                format!(
                    "{} available beds exceed the total of {}",
                    self.available_beds, self.total_beds
                ),
            ));
        }
        if self.available_doctors > self.total_doctors {
            return Err(CoreError::InvalidInput(
                "available_doctors".to_string(),
                format!(
                    "{} available doctors exceed the total of {}",
                    self.available_doctors, self.total_doctors
                ),
            ));
        }
        Ok(())
    }
}

impl From<&ResourceSnapshot> for ResourceUpdate {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self {
            total_beds: snapshot.total_beds,
            available_beds: snapshot.available_beds,
            total_doctors: snapshot.total_doctors,
            available_doctors: snapshot.available_doctors,
            on_duty_staff: snapshot.on_duty_staff,
            beds_by_service: snapshot.beds_by_service.clone(),
            doctors_by_service: snapshot.doctors_by_service.clone(),
        }
    }
}

/// A hospital's profile, owned by a single account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub hospital_type: HospitalType,
    pub level: HospitalLevel,
    pub latitude: f64,
    pub longitude: f64,
    pub services_offered: Vec<ServiceType>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to register a hospital for an owner account.
///
/// Location and offered services are fixed at registration; `HospitalUpdate`
/// does not touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHospital {
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub hospital_type: HospitalType,
    pub level: HospitalLevel,
    pub latitude: f64,
    pub longitude: f64,
    pub services_offered: Vec<ServiceType>,
}

impl NewHospital {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "name".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let well_formed_email = self
            .email
            .trim()
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed_email {
            return Err(CoreError::InvalidInput(
                "email".to_string(),
                format!("'{}' is not an email address", self.email),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::InvalidInput(
                "latitude".to_string(),
                format!("must be between -90 and 90 (got {})", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::InvalidInput(
                "longitude".to_string(),
                format!("must be between -180 and 180 (got {})", self.longitude),
            ));
        }
        if self.services_offered.is_empty() {
            return Err(CoreError::InvalidInput(
                "services_offered".to_string(),
                "at least one service must be offered".to_string(),
            ));
        }
        Ok(())
    }
}

/// The editable part of a hospital profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub hospital_type: HospitalType,
    pub level: HospitalLevel,
}

impl HospitalUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "name".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&Hospital> for HospitalUpdate {
    fn from(hospital: &Hospital) -> Self {
        Self {
            name: hospital.name.clone(),
            phone: hospital.phone.clone(),
            address: hospital.address.clone(),
            contact: hospital.contact.clone(),
            hospital_type: hospital.hospital_type,
            level: hospital.level,
        }
    }
}

/// The current queue state of one service at one hospital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub hospital_id: Uuid,
    pub service_type: ServiceType,
    pub is_active: bool,
    pub current_capacity: i32,
    pub queue_length: i32,
    /// Minutes.
    pub avg_wait_time: i32,
    /// Minutes.
    pub max_wait_time: i32,
    pub availability_status: AvailabilityStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    /// The record shown for an offered service that has never been saved.
    pub fn default_for(hospital_id: Uuid, service_type: ServiceType) -> Self {
        Self {
            hospital_id,
            service_type,
            is_active: true,
            current_capacity: 0,
            queue_length: 0,
            avg_wait_time: 0,
            max_wait_time: 0,
            availability_status: AvailabilityStatus::Available,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let counts = [
            ("current_capacity", self.current_capacity),
            ("queue_length", self.queue_length),
            ("avg_wait_time", self.avg_wait_time),
            ("max_wait_time", self.max_wait_time),
        ];
        for (field, value) in counts {
            if value < 0 {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    format!("must not be negative (got {value})"),
                ));
            }
        }
        Ok(())
    }

    /// The history entry recorded whenever this record is saved.
    pub fn to_snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            id: Uuid::new_v4(),
            hospital_id: self.hospital_id,
            service_type: self.service_type,
            queue_length: self.queue_length,
            wait_time: self.avg_wait_time,
            capacity: self.current_capacity,
            availability_status: self.availability_status,
            recorded_at: Utc::now(),
        }
    }
}

/// An append-only history entry for a service's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub service_type: ServiceType,
    pub queue_length: i32,
    /// Average wait in minutes at the time of recording.
    pub wait_time: i32,
    pub capacity: i32,
    pub availability_status: AvailabilityStatus,
    pub recorded_at: DateTime<Utc>,
}

impl Timestamped for ServiceSnapshot {
    fn timestamp(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(total_beds: i32, available_beds: i32, total_doctors: i32, available_doctors: i32) -> ResourceUpdate {
        ResourceUpdate {
            total_beds,
            available_beds,
            total_doctors,
            available_doctors,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_counts_within_totals() {
        assert!(update(100, 20, 10, 10).validate().is_ok());
        assert!(update(0, 0, 0, 0).validate().is_ok());
    }

    #[test]
    fn rejects_more_available_beds_than_total() {
        let err = update(10, 11, 5, 5).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "available_beds"));
    }

    #[test]
    fn rejects_more_available_doctors_than_total() {
        let err = update(10, 5, 3, 4).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "available_doctors"));
    }

    #[test]
    fn rejects_negative_counts() {
        let mut negative = update(10, 5, 3, 2);
        negative.on_duty_staff = -1;
        let err = negative.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "on_duty_staff"));

        let mut per_service = update(10, 5, 3, 2);
        per_service.beds_by_service.insert("surgery".to_string(), -2);
        assert!(per_service.validate().is_err());
    }

    #[test]
    fn hospital_update_requires_a_name() {
        let profile = HospitalUpdate {
            name: "   ".to_string(),
            phone: None,
            address: None,
            contact: None,
            hospital_type: HospitalType::Public,
            level: HospitalLevel::Primary,
        };
        assert!(profile.validate().is_err());
    }

    fn registration() -> NewHospital {
        NewHospital {
            owner_id: Uuid::new_v4(),
            name: "Clinique Ngaliema".to_string(),
            email: "admin@ngaliema.cd".to_string(),
            phone: None,
            address: Some("Avenue des Cliniques, Kinshasa".to_string()),
            contact: None,
            hospital_type: HospitalType::Private,
            level: HospitalLevel::Secondary,
            latitude: -4.3217,
            longitude: 15.2663,
            services_offered: vec![ServiceType::Emergency, ServiceType::Maternity],
        }
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn registration_checks_email_location_and_services() {
        let mut bad_email = registration();
        bad_email.email = "admin@".to_string();
        let err = bad_email.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "email"));

        let mut off_the_map = registration();
        off_the_map.latitude = 91.0;
        let err = off_the_map.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "latitude"));

        let mut not_a_number = registration();
        not_a_number.longitude = f64::NAN;
        assert!(not_a_number.validate().is_err());

        let mut no_services = registration();
        no_services.services_offered.clear();
        let err = no_services.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "services_offered"));
    }

    #[test]
    fn saved_service_snapshot_carries_average_wait() {
        let mut record = ServiceRecord::default_for(Uuid::new_v4(), ServiceType::Emergency);
        record.queue_length = 4;
        record.avg_wait_time = 25;
        record.current_capacity = 12;

        let snapshot = record.to_snapshot();
        assert_eq!(snapshot.hospital_id, record.hospital_id);
        assert_eq!(snapshot.wait_time, 25);
        assert_eq!(snapshot.capacity, 12);
        assert_eq!(snapshot.queue_length, 4);
    }
}
