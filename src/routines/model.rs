//! Routine and activity types.
//!
//! Wire format is camelCase to match the existing mobile client.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Day a routine activity is scheduled on.
///
/// Serializes as the lowercase day name; parses case-insensitively, since
/// clients and the model are inconsistent about capitalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    /// Today's day in the server's local time zone.
    pub fn today() -> Self {
        chrono::Local::now().weekday().into()
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    /// Case-insensitive day-name parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(DayOfWeek::Monday),
            "tuesday" => Ok(DayOfWeek::Tuesday),
            "wednesday" => Ok(DayOfWeek::Wednesday),
            "thursday" => Ok(DayOfWeek::Thursday),
            "friday" => Ok(DayOfWeek::Friday),
            "saturday" => Ok(DayOfWeek::Saturday),
            "sunday" => Ok(DayOfWeek::Sunday),
            other => Err(format!("'{other}' is not a valid day name")),
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DayOfWeek {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DayOfWeek {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One scheduled activity within a weekly routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub day_of_week: DayOfWeek,
    pub time: String,
    pub duration: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A weekly activity routine for one child.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub child_name: String,
    pub goal: String,
    pub activities: Vec<Activity>,
    pub week_start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Provenance flag kept server-side; responses never expose it.
    #[serde(default, skip_serializing)]
    pub generated_by_ai: bool,
}

impl Routine {
    /// Mark the activity matching exact name + day as completed.
    ///
    /// Returns false (and leaves the routine untouched) when no activity
    /// matches.
    pub fn complete_activity(&mut self, name: &str, day: DayOfWeek) -> bool {
        let Some(activity) = self
            .activities
            .iter_mut()
            .find(|a| a.name == name && a.day_of_week == day)
        else {
            return false;
        };
        activity.completed = true;
        activity.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        true
    }

    /// Activities scheduled on `day`, projected as reminders.
    pub fn reminders_for(&self, day: DayOfWeek) -> Vec<Reminder> {
        self.activities
            .iter()
            .filter(|a| a.day_of_week == day)
            .map(|a| Reminder {
                routine_id: self.id.clone(),
                child_name: self.child_name.clone(),
                goal: self.goal.clone(),
                activity: a.name.clone(),
                time: a.time.clone(),
                duration: a.duration.clone(),
                materials: a.materials.clone(),
                completed: a.completed,
            })
            .collect()
    }
}

/// Daily reminder projection of an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub routine_id: String,
    pub child_name: String,
    pub goal: String,
    pub activity: String,
    pub time: String,
    pub duration: String,
    pub materials: Vec<String>,
    pub completed: bool,
}

/// Generate a routine id: `routine_<millis>_<9 alphanumerics>`.
pub fn generate_routine_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("routine_{millis}_{}", suffix.to_lowercase())
}

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap());

/// Whether `time` is a valid `HH:MM` wall-clock string.
pub fn is_valid_time(time: &str) -> bool {
    TIME_RE.is_match(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, day: DayOfWeek) -> Activity {
        Activity {
            name: name.to_string(),
            day_of_week: day,
            time: "09:00".to_string(),
            duration: "15 minutes".to_string(),
            materials: vec!["blocks".to_string()],
            description: String::new(),
            completed: false,
            completed_at: None,
        }
    }

    fn routine(activities: Vec<Activity>) -> Routine {
        Routine {
            id: generate_routine_id(),
            child_name: "Sam".to_string(),
            goal: "turn taking".to_string(),
            activities,
            week_start_date: NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            generated_by_ai: false,
        }
    }

    #[test]
    fn id_matches_expected_pattern() {
        let id = generate_routine_id();
        let re = Regex::new(r"^routine_\d+_[a-z0-9]{9}$").unwrap();
        assert!(re.is_match(&id), "unexpected id: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_routine_id();
        let b = generate_routine_id();
        assert_ne!(a, b);
    }

    #[test]
    fn complete_activity_matches_name_and_day() {
        let mut r = routine(vec![
            activity("Block tower", DayOfWeek::Monday),
            activity("Block tower", DayOfWeek::Wednesday),
        ]);
        assert!(r.complete_activity("Block tower", DayOfWeek::Wednesday));
        assert!(!r.activities[0].completed);
        assert!(r.activities[1].completed);
        assert!(r.activities[1].completed_at.is_some());
    }

    #[test]
    fn complete_unknown_activity_leaves_routine_unmodified() {
        let mut r = routine(vec![activity("Block tower", DayOfWeek::Monday)]);
        let before = r.updated_at;
        assert!(!r.complete_activity("Block tower", DayOfWeek::Friday));
        assert!(!r.activities[0].completed);
        assert_eq!(r.updated_at, before);
    }

    #[test]
    fn reminders_filter_by_day() {
        let r = routine(vec![
            activity("Morning song", DayOfWeek::Tuesday),
            activity("Puzzle", DayOfWeek::Tuesday),
            activity("Swim", DayOfWeek::Sunday),
        ]);
        let reminders = r.reminders_for(DayOfWeek::Tuesday);
        assert_eq!(reminders.len(), 2);
        assert!(reminders.iter().all(|rem| rem.routine_id == r.id));
    }

    #[test]
    fn day_parse_is_case_insensitive() {
        assert_eq!("Monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("SUNDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("moonday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn time_validation() {
        assert!(is_valid_time("09:30"));
        assert!(is_valid_time("9:30"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("noon"));
    }

    #[test]
    fn activity_serializes_camel_case() {
        let json = serde_json::to_value(activity("A", DayOfWeek::Friday)).unwrap();
        assert_eq!(json["dayOfWeek"], "friday");
        assert!(json.get("completedAt").is_none());
    }

    #[test]
    fn generated_by_ai_stays_internal() {
        let mut r = routine(vec![]);
        r.generated_by_ai = true;
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("generatedByAi").is_none());
        assert_eq!(json["childName"], "Sam");
    }

    #[test]
    fn day_deserializes_any_capitalization() {
        let day: DayOfWeek = serde_json::from_str("\"Wednesday\"").unwrap();
        assert_eq!(day, DayOfWeek::Wednesday);
        assert!(serde_json::from_str::<DayOfWeek>("\"moonday\"").is_err());
    }
}
