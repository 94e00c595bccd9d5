// Wire and domain types shared by the lookup client, the form and the page

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Format the backend uses for departure/arrival times
pub const OFFER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// Format of date query parameters and date inputs
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Data structures for the airport search JSON response
#[derive(Debug, Deserialize, Serialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub locations: Vec<RawLocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLocation {
    pub iata_code: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, rename = "type")]
    pub location_type: Option<String>,
}

// A selectable airport candidate in a typeahead dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportOption {
    pub code: String,
    pub display_label: String,
}

impl AirportOption {
    pub fn new(code: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_label: display_label.into(),
        }
    }
}

impl RawLocation {
    // Locations without an IATA code cannot be searched on, so they yield None
    pub fn into_option(self) -> Option<AirportOption> {
        let code = self.iata_code.filter(|c| !c.is_empty())?;
        let label = format!(
            "{} ({}) - {}, {}",
            self.name.as_deref().unwrap_or_default(),
            code,
            self.city.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default(),
        );
        Some(AirportOption::new(code, label))
    }
}

impl From<LocationsResponse> for Vec<AirportOption> {
    fn from(response: LocationsResponse) -> Self {
        response
            .locations
            .into_iter()
            .filter_map(RawLocation::into_option)
            .collect()
    }
}

// A complete, submittable search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub origin: AirportOption,
    pub destination: AirportOption,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl SearchCriteria {
    // Query parameters in the order the backend documents them
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("origin", self.origin.code.clone()),
            ("destination", self.destination.code.clone()),
            (
                "departure_date",
                self.departure_date.format(DATE_FORMAT).to_string(),
            ),
        ];
        if let Some(return_date) = self.return_date {
            params.push(("return_date", return_date.format(DATE_FORMAT).to_string()));
        }
        params
    }
}

// Data structures for the flight offers JSON response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlightOffer {
    pub id: String,
    pub airline: String,
    pub price: f64,
    pub points_required: u64,
    pub value_per_point: f64,
    #[serde(default)]
    pub point_value: f64,
    #[serde(with = "offer_time")]
    pub departure_time: NaiveDateTime,
    #[serde(with = "offer_time")]
    pub arrival_time: NaiveDateTime,
    pub duration: String,
    pub stops: u32,
    pub total_travel_time: String,
    pub overnight: bool,
    #[serde(default)]
    pub return_flight: Option<ReturnFlight>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReturnFlight {
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub points_required: Option<u64>,
    #[serde(default)]
    pub value_per_point: Option<f64>,
    #[serde(with = "offer_time")]
    pub departure_time: NaiveDateTime,
    #[serde(with = "offer_time")]
    pub arrival_time: NaiveDateTime,
    pub duration: String,
    pub stops: u32,
    pub total_travel_time: String,
    pub overnight: bool,
}

// Error payload returned with non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    // First matching branch wins: errors list, then message, then nothing
    pub fn display_message(&self) -> Option<String> {
        if !self.errors.is_empty() {
            return Some(self.errors.join(", "));
        }
        self.message.clone().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

mod offer_time {
    use super::OFFER_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(OFFER_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, OFFER_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
