//! Trip planner domain model: travel styles, the trip form and the payloads
//! sealed into the ledger.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::error::{TripKitError, TripKitResult};

/// Category a trip is filed under. Public statistics are aggregated per style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum TravelStyle {
    /// Peaks, reefs and remote trails.
    Adventure = 0,
    /// Museums, cuisine and local traditions.
    Culture = 1,
    /// Rest, mindfulness and healthy routines.
    Wellness = 2,
    /// Kid-friendly itineraries.
    Family = 3,
}

impl TravelStyle {
    /// Every style, in id order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Numeric id used on the ledger.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Adventure => "Adventure",
            Self::Culture => "Culture",
            Self::Wellness => "Wellness",
            Self::Family => "Family",
        }
    }

    /// One-line pitch shown next to the label.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Adventure => "Climb peaks, dive reefs and chase the sunrise on remote trails.",
            Self::Culture => "Slow travel focused on museums, cuisine and local traditions.",
            Self::Wellness => "Retreats dedicated to rest, mindfulness and healthy routines.",
            Self::Family => "Kid-friendly itineraries balancing play, safety and discovery.",
        }
    }
}

impl TryFrom<u8> for TravelStyle {
    type Error = TripKitError;

    fn try_from(id: u8) -> TripKitResult<Self> {
        Self::iter().find(|style| style.id() == id).ok_or_else(|| {
            TripKitError::invalid_argument("style", format!("unknown travel style {id}"))
        })
    }
}

impl From<TravelStyle> for u8 {
    fn from(style: TravelStyle) -> Self {
        style.id()
    }
}

/// What the traveller fills in before submitting a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForm {
    /// Public title. Stored in clear on the ledger.
    pub title: String,
    /// Public category.
    pub style: TravelStyle,
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: String,
    /// Free-form list of places.
    pub destinations: String,
    /// Free-form day-by-day plan.
    pub plan: String,
}

impl TripForm {
    /// The title as submitted to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::InvalidArgument`] if the title is blank.
    pub fn submission_title(&self) -> TripKitResult<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TripKitError::invalid_argument("title", "title is required"));
        }
        Ok(title.to_string())
    }

    /// Nights counted for statistics. Never below one.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::InvalidArgument`] if a date does not parse.
    pub fn nights(&self) -> TripKitResult<u32> {
        calculate_nights(&self.start_date, &self.end_date).map(|nights| nights.max(1))
    }

    /// The private route part of the trip.
    #[must_use]
    pub fn route_payload(&self) -> RoutePayload {
        RoutePayload {
            title: self.title.clone(),
            destinations: self.destinations.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    /// The private schedule part of the trip, stamped with `captured_at`.
    #[must_use]
    pub fn schedule_payload(&self, captured_at: DateTime<Utc>) -> SchedulePayload {
        SchedulePayload {
            plan: self.plan.clone(),
            captured_at: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Sealed route of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePayload {
    /// Title as typed.
    pub title: String,
    /// Places visited.
    pub destinations: String,
    /// First day.
    pub start_date: String,
    /// Last day.
    pub end_date: String,
}

/// Sealed schedule of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    /// Day-by-day plan.
    pub plan: String,
    /// RFC 3339 time the plan was sealed at.
    pub captured_at: String,
}

/// Nights between two `YYYY-MM-DD` dates, rounded up.
///
/// Returns 0 when either date is blank and at least 1 otherwise, so a
/// same-day or reversed range still counts as one night.
///
/// # Errors
///
/// Returns [`TripKitError::InvalidArgument`] if a non-blank date does not
/// parse.
pub fn calculate_nights(start: &str, end: &str) -> TripKitResult<u32> {
    let (start, end) = (start.trim(), end.trim());
    if start.is_empty() || end.is_empty() {
        return Ok(0);
    }
    let start = parse_date("start_date", start)?;
    let end = parse_date("end_date", end)?;
    let days = (end - start).num_days();
    Ok(u32::try_from(days).unwrap_or(0).max(1))
}

fn parse_date(attribute: &str, raw: &str) -> TripKitResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| {
        TripKitError::invalid_argument(attribute, format!("{raw:?} is not a YYYY-MM-DD date: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    #[test_case("", "2025-07-10", 0 ; "missing start")]
    #[test_case("2025-07-01", "", 0 ; "missing end")]
    #[test_case("2025-07-01", "2025-07-10", 9 ; "nine nights")]
    #[test_case("2025-07-01", "2025-07-01", 1 ; "same day")]
    #[test_case("2025-07-10", "2025-07-01", 1 ; "reversed")]
    #[test_case("2024-02-28", "2024-03-01", 2 ; "leap year")]
    fn test_calculate_nights(start: &str, end: &str, expected: u32) {
        assert_eq!(calculate_nights(start, end).expect("nights"), expected);
    }

    #[test]
    fn test_calculate_nights_rejects_garbage() {
        assert!(matches!(
            calculate_nights("next tuesday", "2025-07-01"),
            Err(TripKitError::InvalidArgument { ref attribute, .. }) if attribute == "start_date"
        ));
    }

    #[test]
    fn test_styles_round_trip_through_ids() {
        let ids: Vec<u8> = TravelStyle::all().map(TravelStyle::id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        for style in TravelStyle::all() {
            assert_eq!(TravelStyle::try_from(style.id()).expect("style"), style);
            assert!(!style.description().is_empty());
        }
        assert!(TravelStyle::try_from(4).is_err());
        assert_eq!(TravelStyle::Wellness.label(), "Wellness");
    }

    fn form() -> TripForm {
        TripForm {
            title: "  Swiss Escape ".to_string(),
            style: TravelStyle::Culture,
            start_date: "2025-07-01".to_string(),
            end_date: "2025-07-10".to_string(),
            destinations: "Zurich, Lucerne".to_string(),
            plan: "Day 1: Arrive".to_string(),
        }
    }

    #[test]
    fn test_form_payloads_use_camel_case() {
        let form = form();
        let route = serde_json::to_value(form.route_payload()).expect("route");
        assert_eq!(route["startDate"], "2025-07-01");
        assert_eq!(route["endDate"], "2025-07-10");

        let captured = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("time");
        let schedule = serde_json::to_value(form.schedule_payload(captured)).expect("schedule");
        assert_eq!(schedule["capturedAt"], "2025-06-01T12:00:00.000Z");
        assert_eq!(schedule["plan"], "Day 1: Arrive");
    }

    #[test]
    fn test_submission_title_is_trimmed_and_required() {
        let mut form = form();
        assert_eq!(form.submission_title().expect("title"), "Swiss Escape");
        form.title = "   ".to_string();
        assert!(form.submission_title().is_err());
    }

    #[test]
    fn test_blank_dates_still_count_one_night() {
        let mut form = form();
        form.end_date = String::new();
        assert_eq!(form.nights().expect("nights"), 1);
    }

    #[test]
    fn test_form_parses_from_json() {
        let form: TripForm = serde_json::from_str(
            r#"{"title":"x","style":2,"startDate":"","endDate":"","destinations":"","plan":""}"#,
        )
        .expect("form");
        assert_eq!(form.style, TravelStyle::Wellness);
    }
}
