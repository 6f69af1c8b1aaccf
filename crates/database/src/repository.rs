use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{
    AvailabilityStatus, Hospital, HospitalUpdate, NewHospital, ResourceSnapshot, ResourceUpdate,
    ServiceRecord, ServiceSnapshot, ServiceType,
};
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::types::Json;
use sqlx::{Row, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

const HOSPITAL_COLUMNS: &str = "id, owner_id, name, email, phone, address, contact, hospital_type, level, latitude, longitude, services_offered, created_at";

const RESOURCE_COLUMNS: &str = "id, hospital_id, total_beds, available_beds, total_doctors, available_doctors, on_duty_staff, beds_by_service, doctors_by_service, created_at";

const SERVICE_COLUMNS: &str = "hospital_id, service_type, is_active, current_capacity, queue_length, avg_wait_time, max_wait_time, availability_status, updated_at";

const SERVICE_HISTORY_COLUMNS: &str = "id, hospital_id, service_type, queue_length, wait_time, capacity, availability_status, recorded_at";

const UPSERT_SERVICE_SQL: &str = r#"
    INSERT INTO hospital_services (
        hospital_id, service_type, is_active, current_capacity, queue_length,
        avg_wait_time, max_wait_time, availability_status, updated_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
    ON CONFLICT (hospital_id, service_type) DO UPDATE SET
        is_active = EXCLUDED.is_active,
        current_capacity = EXCLUDED.current_capacity,
        queue_length = EXCLUDED.queue_length,
        avg_wait_time = EXCLUDED.avg_wait_time,
        max_wait_time = EXCLUDED.max_wait_time,
        availability_status = EXCLUDED.availability_status,
        updated_at = NOW()
    RETURNING hospital_id, service_type, is_active, current_capacity, queue_length,
        avg_wait_time, max_wait_time, availability_status, updated_at
"#;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations on this repository's pool.
    pub async fn migrate(&self) -> Result<(), DbError> {
        crate::connection::run_migrations(&self.pool).await
    }

    // ==========================================================================
    // Hospitals
    // ==========================================================================

    /// Registers the hospital for an owner account.
    ///
    /// Each owner has at most one hospital; a second registration fails with
    /// `DbError::AlreadyExists`.
    pub async fn create_hospital(&self, hospital: &NewHospital) -> Result<Hospital, DbError> {
        if let Err(e) = hospital.validate() {
            tracing::warn!(owner_id = %hospital.owner_id, error = %e, "Rejected hospital registration.");
            return Err(e.into());
        }

        let services: Vec<&str> = hospital.services_offered.iter().map(|s| s.as_str()).collect();
        let query = format!(
            r#"
            INSERT INTO hospitals (
                id, owner_id, name, email, phone, address, contact, hospital_type, level,
                latitude, longitude, services_offered, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING {HOSPITAL_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(hospital.owner_id)
            .bind(hospital.name.trim())
            .bind(hospital.email.trim())
            .bind(&hospital.phone)
            .bind(&hospital.address)
            .bind(&hospital.contact)
            .bind(hospital.hospital_type.as_str())
            .bind(hospital.level.as_str())
            .bind(hospital.latitude)
            .bind(hospital.longitude)
            .bind(services)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let duplicate_owner = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if duplicate_owner {
                    DbError::AlreadyExists
                } else {
                    DbError::QueryError(e)
                }
            })?;

        let created = hospital_from_row(&row)?;
        tracing::info!(hospital_id = %created.id, owner_id = %created.owner_id, "Hospital registered.");
        Ok(created)
    }

    /// Fetches the hospital owned by the given account.
    pub async fn get_hospital_by_owner(&self, owner_id: Uuid) -> Result<Hospital, DbError> {
        let query = format!("SELECT {HOSPITAL_COLUMNS} FROM hospitals WHERE owner_id = $1");
        let row = sqlx::query(&query)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        hospital_from_row(&row)
    }

    /// Replaces the editable profile fields and returns the updated hospital.
    pub async fn update_hospital(
        &self,
        hospital_id: Uuid,
        update: &HospitalUpdate,
    ) -> Result<Hospital, DbError> {
        update.validate()?;

        let query = format!(
            r#"
            UPDATE hospitals
            SET name = $2, phone = $3, address = $4, contact = $5, hospital_type = $6, level = $7
            WHERE id = $1
            RETURNING {HOSPITAL_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(hospital_id)
            .bind(&update.name)
            .bind(&update.phone)
            .bind(&update.address)
            .bind(&update.contact)
            .bind(update.hospital_type.as_str())
            .bind(update.level.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        tracing::info!(%hospital_id, "Hospital profile updated.");
        hospital_from_row(&row)
    }

    // ==========================================================================
    // Resources
    // ==========================================================================

    /// Fetches the most recent resource snapshot, if any has been recorded.
    pub async fn get_current_resources(
        &self,
        hospital_id: Uuid,
    ) -> Result<Option<ResourceSnapshot>, DbError> {
        let mut latest = self.get_resources_history(hospital_id, 1).await?;
        Ok(latest.pop())
    }

    /// Validates a resource update and appends it as a new snapshot.
    ///
    /// Rejected updates never reach the database, so the history only holds
    /// snapshots with `available <= total` for beds and doctors.
    pub async fn submit_resources(
        &self,
        hospital_id: Uuid,
        update: &ResourceUpdate,
    ) -> Result<ResourceSnapshot, DbError> {
        if let Err(e) = update.validate() {
            tracing::warn!(%hospital_id, error = %e, "Rejected resource update.");
            return Err(e.into());
        }

        let query = format!(
            r#"
            INSERT INTO hospital_resources (
                id, hospital_id, total_beds, available_beds, total_doctors,
                available_doctors, on_duty_staff, beds_by_service, doctors_by_service, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING {RESOURCE_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(hospital_id)
            .bind(update.total_beds)
            .bind(update.available_beds)
            .bind(update.total_doctors)
            .bind(update.available_doctors)
            .bind(update.on_duty_staff)
            .bind(Json(&update.beds_by_service))
            .bind(Json(&update.doctors_by_service))
            .fetch_one(&self.pool)
            .await?;

        let snapshot = resource_from_row(&row)?;
        tracing::info!(
            %hospital_id,
            snapshot_id = %snapshot.id,
            available_beds = snapshot.available_beds,
            total_beds = snapshot.total_beds,
            "Resource snapshot recorded."
        );
        Ok(snapshot)
    }

    /// Fetches up to `limit` snapshots for one hospital, most recent first.
    ///
    /// This is the history provider for the analytics engine.
    pub async fn get_resources_history(
        &self,
        hospital_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ResourceSnapshot>, DbError> {
        let query = format!(
            "SELECT {RESOURCE_COLUMNS} FROM hospital_resources WHERE hospital_id = $1 ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query(&query)
            .bind(hospital_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(%hospital_id, limit, fetched = rows.len(), "Fetched resource history.");
        rows.iter().map(resource_from_row).collect()
    }

    // ==========================================================================
    // Services
    // ==========================================================================

    /// Fetches all stored service records for a hospital, ordered by service type.
    pub async fn list_services(&self, hospital_id: Uuid) -> Result<Vec<ServiceRecord>, DbError> {
        let query = format!(
            "SELECT {SERVICE_COLUMNS} FROM hospital_services WHERE hospital_id = $1 ORDER BY service_type"
        );
        let rows = sqlx::query(&query)
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(service_from_row).collect()
    }

    /// Returns one record per offered service, filling in defaults for the
    /// services that have never been saved.
    pub async fn services_for(&self, hospital: &Hospital) -> Result<Vec<ServiceRecord>, DbError> {
        let stored = self.list_services(hospital.id).await?;
        Ok(merge_offered_services(hospital, stored))
    }

    /// Upserts the record for `(hospital_id, service_type)` and appends its
    /// history entry in one transaction.
    pub async fn save_service(&self, record: &ServiceRecord) -> Result<ServiceRecord, DbError> {
        record.validate()?;
        let mut tx = self.pool.begin().await?;

        // Note: must use the transaction object `tx` for both statements
        let saved = upsert_service_row(&mut tx, record).await?;

        let snapshot = saved.to_snapshot();
        insert_service_snapshot(&mut *tx, &snapshot).await?;

        tx.commit().await?;
        tracing::info!(
            hospital_id = %saved.hospital_id,
            service = %saved.service_type,
            status = %saved.availability_status,
            queue_length = saved.queue_length,
            "Service saved."
        );
        Ok(saved)
    }

    /// Changes only the availability status of an existing service record.
    ///
    /// Fails with `DbError::NotFound` if the service was never saved.
    pub async fn update_service_status(
        &self,
        hospital_id: Uuid,
        service_type: ServiceType,
        status: AvailabilityStatus,
    ) -> Result<ServiceRecord, DbError> {
        let query = format!(
            r#"
            UPDATE hospital_services
            SET availability_status = $3, updated_at = NOW()
            WHERE hospital_id = $1 AND service_type = $2
            RETURNING {SERVICE_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(hospital_id)
            .bind(service_type.as_str())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        service_from_row(&row)
    }

    /// Fetches up to `limit` history entries for one service, most recent first.
    pub async fn get_service_history(
        &self,
        hospital_id: Uuid,
        service_type: ServiceType,
        limit: u32,
    ) -> Result<Vec<ServiceSnapshot>, DbError> {
        let query = format!(
            r#"
            SELECT {SERVICE_HISTORY_COLUMNS} FROM service_history
            WHERE hospital_id = $1 AND service_type = $2
            ORDER BY recorded_at DESC
            LIMIT $3
            "#
        );
        let rows = sqlx::query(&query)
            .bind(hospital_id)
            .bind(service_type.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(service_snapshot_from_row).collect()
    }

    /// Appends a single service history entry.
    pub async fn record_service_snapshot(&self, snapshot: &ServiceSnapshot) -> Result<(), DbError> {
        insert_service_snapshot(&self.pool, snapshot).await
    }
}

/// One record per offered service, in the hospital's order.
///
/// Stored rows win over defaults. Rows for services the hospital no longer
/// offers are dropped.
fn merge_offered_services(hospital: &Hospital, stored: Vec<ServiceRecord>) -> Vec<ServiceRecord> {
    let mut stored: HashMap<ServiceType, ServiceRecord> = stored
        .into_iter()
        .map(|record| (record.service_type, record))
        .collect();

    hospital
        .services_offered
        .iter()
        .map(|service| {
            stored
                .remove(service)
                .unwrap_or_else(|| ServiceRecord::default_for(hospital.id, *service))
        })
        .collect()
}

async fn upsert_service_row(
    tx: &mut Transaction<'_, Postgres>,
    record: &ServiceRecord,
) -> Result<ServiceRecord, DbError> {
    let row = sqlx::query(UPSERT_SERVICE_SQL)
        .bind(record.hospital_id)
        .bind(record.service_type.as_str())
        .bind(record.is_active)
        .bind(record.current_capacity)
        .bind(record.queue_length)
        .bind(record.avg_wait_time)
        .bind(record.max_wait_time)
        .bind(record.availability_status.as_str())
        .fetch_one(&mut **tx)
        .await?;

    service_from_row(&row)
}

/// Shared by the transactional `save_service` and `record_service_snapshot`.
async fn insert_service_snapshot<'e, E>(executor: E, snapshot: &ServiceSnapshot) -> Result<(), DbError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO service_history (
            id, hospital_id, service_type, queue_length, wait_time, capacity,
            availability_status, recorded_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(snapshot.id)
    .bind(snapshot.hospital_id)
    .bind(snapshot.service_type.as_str())
    .bind(snapshot.queue_length)
    .bind(snapshot.wait_time)
    .bind(snapshot.capacity)
    .bind(snapshot.availability_status.as_str())
    .bind(snapshot.recorded_at)
    .execute(executor)
    .await?;
    Ok(())
}

// ==============================================================================
// Row mapping
// ==============================================================================

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| DbError::InvalidData(format!("column '{column}': {e}")))
}

fn hospital_from_row(row: &PgRow) -> Result<Hospital, DbError> {
    let services: Vec<String> = row.try_get("services_offered")?;
    let services_offered = services
        .iter()
        .map(|s| {
            s.parse::<ServiceType>()
                .map_err(|e| DbError::InvalidData(format!("column 'services_offered': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Hospital {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        contact: row.try_get("contact")?,
        hospital_type: parse_column(row, "hospital_type")?,
        level: parse_column(row, "level")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        services_offered,
        created_at: row.try_get("created_at")?,
    })
}

fn resource_from_row(row: &PgRow) -> Result<ResourceSnapshot, DbError> {
    let Json(beds_by_service): Json<HashMap<String, i32>> = row.try_get("beds_by_service")?;
    let Json(doctors_by_service): Json<HashMap<String, i32>> = row.try_get("doctors_by_service")?;
    let captured_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(ResourceSnapshot {
        id: row.try_get("id")?,
        hospital_id: row.try_get("hospital_id")?,
        captured_at,
        total_beds: row.try_get("total_beds")?,
        available_beds: row.try_get("available_beds")?,
        total_doctors: row.try_get("total_doctors")?,
        available_doctors: row.try_get("available_doctors")?,
        on_duty_staff: row.try_get("on_duty_staff")?,
        beds_by_service,
        doctors_by_service,
    })
}

fn service_from_row(row: &PgRow) -> Result<ServiceRecord, DbError> {
    Ok(ServiceRecord {
        hospital_id: row.try_get("hospital_id")?,
        service_type: parse_column(row, "service_type")?,
        is_active: row.try_get("is_active")?,
        current_capacity: row.try_get("current_capacity")?,
        queue_length: row.try_get("queue_length")?,
        avg_wait_time: row.try_get("avg_wait_time")?,
        max_wait_time: row.try_get("max_wait_time")?,
        availability_status: parse_column(row, "availability_status")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn service_snapshot_from_row(row: &PgRow) -> Result<ServiceSnapshot, DbError> {
    Ok(ServiceSnapshot {
        id: row.try_get("id")?,
        hospital_id: row.try_get("hospital_id")?,
        service_type: parse_column(row, "service_type")?,
        queue_length: row.try_get("queue_length")?,
        wait_time: row.try_get("wait_time")?,
        capacity: row.try_get("capacity")?,
        availability_status: parse_column(row, "availability_status")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{HospitalLevel, HospitalType};

    fn hospital(services_offered: Vec<ServiceType>) -> Hospital {
        Hospital {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Hôpital Général".to_string(),
            email: "contact@hopital-general.cd".to_string(),
            phone: None,
            address: None,
            contact: None,
            hospital_type: HospitalType::Public,
            level: HospitalLevel::Tertiary,
            latitude: -4.31,
            longitude: 15.31,
            services_offered,
            created_at: Utc::now(),
        }
    }

    fn stored(hospital: &Hospital, service_type: ServiceType, queue_length: i32) -> ServiceRecord {
        let mut record = ServiceRecord::default_for(hospital.id, service_type);
        record.queue_length = queue_length;
        record.availability_status = AvailabilityStatus::Busy;
        record.updated_at = Some(Utc::now());
        record
    }

    #[test]
    fn offered_services_without_rows_get_defaults() {
        let hospital = hospital(vec![ServiceType::Emergency, ServiceType::Radiology]);
        let merged = merge_offered_services(&hospital, Vec::new());

        assert_eq!(
            merged,
            vec![
                ServiceRecord::default_for(hospital.id, ServiceType::Emergency),
                ServiceRecord::default_for(hospital.id, ServiceType::Radiology),
            ]
        );
    }

    #[test]
    fn stored_rows_win_and_follow_the_offered_order() {
        let hospital = hospital(vec![ServiceType::Surgery, ServiceType::Emergency, ServiceType::Laboratory]);
        let rows = vec![
            stored(&hospital, ServiceType::Emergency, 8),
            stored(&hospital, ServiceType::Surgery, 2),
        ];

        let merged = merge_offered_services(&hospital, rows);
        let order: Vec<ServiceType> = merged.iter().map(|r| r.service_type).collect();
        assert_eq!(
            order,
            vec![ServiceType::Surgery, ServiceType::Emergency, ServiceType::Laboratory]
        );
        assert_eq!(merged[0].queue_length, 2);
        assert_eq!(merged[1].queue_length, 8);
        assert_eq!(merged[2].updated_at, None);
    }

    #[test]
    fn rows_for_services_no_longer_offered_are_dropped() {
        let hospital = hospital(vec![ServiceType::Pediatrics]);
        let rows = vec![
            stored(&hospital, ServiceType::Cardiology, 4),
            stored(&hospital, ServiceType::Pediatrics, 1),
        ];

        let merged = merge_offered_services(&hospital, rows);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].service_type, ServiceType::Pediatrics);
        assert_eq!(merged[0].queue_length, 1);
    }
}
