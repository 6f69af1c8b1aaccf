use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The medical services a hospital can offer and report queue status for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Emergency,
    Maternity,
    Surgery,
    GeneralConsultation,
    Pediatrics,
    Cardiology,
    Radiology,
    Laboratory,
}

impl ServiceType {
    pub const ALL: [ServiceType; 8] = [
        ServiceType::Emergency,
        ServiceType::Maternity,
        ServiceType::Surgery,
        ServiceType::GeneralConsultation,
        ServiceType::Pediatrics,
        ServiceType::Cardiology,
        ServiceType::Radiology,
        ServiceType::Laboratory,
    ];

    /// The identifier stored in the `service_type` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Emergency => "emergency",
            ServiceType::Maternity => "maternity",
            ServiceType::Surgery => "surgery",
            ServiceType::GeneralConsultation => "general_consultation",
            ServiceType::Pediatrics => "pediatrics",
            ServiceType::Cardiology => "cardiology",
            ServiceType::Radiology => "radiology",
            ServiceType::Laboratory => "laboratory",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceType::Emergency => "Emergency",
            ServiceType::Maternity => "Maternity",
            ServiceType::Surgery => "Surgery",
            ServiceType::GeneralConsultation => "General Consultation",
            ServiceType::Pediatrics => "Pediatrics",
            ServiceType::Cardiology => "Cardiology",
            ServiceType::Radiology => "Radiology",
            ServiceType::Laboratory => "Laboratory",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant("service type".to_string(), s.to_string()))
    }
}

/// The queue status shown for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Busy,
    Full,
    Closed,
}

impl AvailabilityStatus {
    /// Derives the status of a service from its queue.
    ///
    /// An inactive service is always closed. An empty queue is available, a
    /// queue that reaches a known capacity is full, and a queue longer than
    /// `busy_threshold` is busy.
    pub fn derive(is_active: bool, queue_length: i32, capacity: i32, busy_threshold: i32) -> Self {
        if !is_active {
            return AvailabilityStatus::Closed;
        }
        if queue_length == 0 {
            return AvailabilityStatus::Available;
        }
        if capacity > 0 && queue_length >= capacity {
            return AvailabilityStatus::Full;
        }
        if queue_length > busy_threshold {
            return AvailabilityStatus::Busy;
        }
        AvailabilityStatus::Available
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Full => "full",
            AvailabilityStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(AvailabilityStatus::Available),
            "busy" => Ok(AvailabilityStatus::Busy),
            "full" => Ok(AvailabilityStatus::Full),
            "closed" => Ok(AvailabilityStatus::Closed),
            other => Err(CoreError::UnknownVariant(
                "availability status".to_string(),
                other.to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalType {
    #[default]
    Public,
    Private,
    Mixed,
}

impl HospitalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalType::Public => "public",
            HospitalType::Private => "private",
            HospitalType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for HospitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HospitalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(HospitalType::Public),
            "private" => Ok(HospitalType::Private),
            "mixed" => Ok(HospitalType::Mixed),
            other => Err(CoreError::UnknownVariant("hospital type".to_string(), other.to_string())),
        }
    }
}

/// The care level of a hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalLevel {
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

impl HospitalLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalLevel::Primary => "primary",
            HospitalLevel::Secondary => "secondary",
            HospitalLevel::Tertiary => "tertiary",
        }
    }
}

impl fmt::Display for HospitalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HospitalLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(HospitalLevel::Primary),
            "secondary" => Ok(HospitalLevel::Secondary),
            "tertiary" => Ok(HospitalLevel::Tertiary),
            other => Err(CoreError::UnknownVariant("hospital level".to_string(), other.to_string())),
        }
    }
}
