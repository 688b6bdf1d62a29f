use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current and longest run of consecutive active days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub longest: u32,
    /// Last day that extended the streak
    #[serde(default, rename = "lastDate", alias = "lastActiveDate")]
    pub last_active_date: Option<NaiveDate>,
}
