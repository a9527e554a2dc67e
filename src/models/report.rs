// Domain models - Daily report
use serde::{Deserialize, Serialize};

/// A daily activity report (site log)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    /// Calendar date, ISO `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub break_time: String,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    /// Free text, may contain markup
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// A crew member present on the day of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// An embedded photo (data URL) with its caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub caption: String,
}

impl Report {
    /// Start a report for `date` with the usual site hours.
    pub fn new(id: String, date: String) -> Self {
        Self {
            id,
            date,
            weather: "Sol".to_string(),
            start_time: "07:00".to_string(),
            end_time: "17:00".to_string(),
            break_time: "12:00-13:00".to_string(),
            team: Vec::new(),
            activities: Vec::new(),
            photos: Vec::new(),
        }
    }

    /// Start the next report from a previous one, carrying hours, crew and
    /// activities over but not weather or photos.
    pub fn continue_from(id: String, date: String, base: &Report) -> Self {
        Self {
            id,
            date,
            weather: String::new(),
            start_time: base.start_time.clone(),
            end_time: base.end_time.clone(),
            break_time: base.break_time.clone(),
            team: base.team.clone(),
            activities: base.activities.clone(),
            photos: Vec::new(),
        }
    }
}
