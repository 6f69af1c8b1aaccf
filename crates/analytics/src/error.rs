use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid analysis window '{0}': expected a day count such as 1, 7, 30, 90 or '24h'")]
    InvalidWindow(String),
}
