pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{AvailabilityStatus, HospitalLevel, HospitalType, ServiceType};
pub use error::CoreError;
pub use structs::{
    Hospital, HospitalUpdate, NewHospital, ResourceSnapshot, ResourceUpdate, ServiceRecord, ServiceSnapshot,
    Timestamped,
};
