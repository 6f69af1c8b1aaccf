use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trailing time span used to filter history before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisWindow {
    Last24Hours,
    Last7Days,
    Last30Days,
    Last90Days,
    /// Any other number of days.
    Custom(u32),
}

impl AnalysisWindow {
    /// The windows offered in the period selector.
    pub const PRESETS: [AnalysisWindow; 4] = [
        AnalysisWindow::Last24Hours,
        AnalysisWindow::Last7Days,
        AnalysisWindow::Last30Days,
        AnalysisWindow::Last90Days,
    ];

    /// Maps a day count to its preset, or to `Custom` if there is none.
    pub fn from_days(days: u32) -> Self {
        Self::PRESETS
            .into_iter()
            .find(|preset| preset.days() == days)
            .unwrap_or(AnalysisWindow::Custom(days))
    }

    pub fn days(&self) -> u32 {
        match self {
            AnalysisWindow::Last24Hours => 1,
            AnalysisWindow::Last7Days => 7,
            AnalysisWindow::Last30Days => 30,
            AnalysisWindow::Last90Days => 90,
            AnalysisWindow::Custom(days) => *days,
        }
    }

    pub fn label(&self) -> String {
        match self {
            AnalysisWindow::Last24Hours => "Last 24 hours".to_string(),
            AnalysisWindow::Custom(1) => "Last day".to_string(),
            other => format!("Last {} days", other.days()),
        }
    }
}

impl Default for AnalysisWindow {
    fn default() -> Self {
        AnalysisWindow::Last7Days
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Accepts `24h`, a bare day count (`7`), or a day count with a `d` suffix (`30d`).
impl FromStr for AnalysisWindow {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        if trimmed == "24h" {
            return Ok(AnalysisWindow::Last24Hours);
        }
        let digits = trimmed.strip_suffix('d').unwrap_or(&trimmed);
        digits
            .parse::<u32>()
            .map(AnalysisWindow::from_days)
            .map_err(|_| AnalyticsError::InvalidWindow(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_presets_and_custom_windows() {
        assert_eq!("24h".parse(), Ok(AnalysisWindow::Last24Hours));
        assert_eq!("1".parse(), Ok(AnalysisWindow::Last24Hours));
        assert_eq!("7".parse(), Ok(AnalysisWindow::Last7Days));
        assert_eq!("30d".parse(), Ok(AnalysisWindow::Last30Days));
        assert_eq!(" 90 ".parse(), Ok(AnalysisWindow::Last90Days));
        assert_eq!("14d".parse(), Ok(AnalysisWindow::Custom(14)));
    }

    #[test]
    fn rejects_garbage() {
        assert!("week".parse::<AnalysisWindow>().is_err());
        assert!("-7".parse::<AnalysisWindow>().is_err());
        assert!("".parse::<AnalysisWindow>().is_err());
    }

    #[test]
    fn preset_day_counts() {
        let days: Vec<u32> = AnalysisWindow::PRESETS.iter().map(|w| w.days()).collect();
        assert_eq!(days, vec![1, 7, 30, 90]);
        assert_eq!(AnalysisWindow::from_days(30), AnalysisWindow::Last30Days);
        assert_eq!(AnalysisWindow::from_days(14), AnalysisWindow::Custom(14));
    }
}
