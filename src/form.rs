// Search form: selections, dates, validation and submission

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::AirportLookup;
use crate::models::{AirportOption, SearchCriteria, DATE_FORMAT};
use crate::typeahead::AirportField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Origin,
    Destination,
    DepartureDate,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::Origin => "origin",
            FormField::Destination => "destination",
            FormField::DepartureDate => "departure date",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    Incomplete { missing: Vec<FormField> },

    #[error("Invalid {field}: {value:?}, expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
}

// Receives a validated search from the form
#[async_trait]
pub trait SearchHandler: Send + Sync {
    async fn on_search(&self, criteria: SearchCriteria);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSelections {
    pub origin: Option<AirportOption>,
    pub destination: Option<AirportOption>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

impl FormSelections {
    pub fn missing_fields(&self) -> Vec<FormField> {
        let mut missing = Vec::new();
        if self.origin.is_none() {
            missing.push(FormField::Origin);
        }
        if self.destination.is_none() {
            missing.push(FormField::Destination);
        }
        if self.departure_date.is_none() {
            missing.push(FormField::DepartureDate);
        }
        missing
    }

    pub fn criteria(&self) -> Result<SearchCriteria, ValidationError> {
        match (&self.origin, &self.destination, self.departure_date) {
            (Some(origin), Some(destination), Some(departure_date)) => Ok(SearchCriteria {
                origin: origin.clone(),
                destination: destination.clone(),
                departure_date,
                return_date: self.return_date,
            }),
            _ => Err(ValidationError::Incomplete {
                missing: self.missing_fields(),
            }),
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

pub struct SearchForm {
    origin_field: AirportField,
    destination_field: AirportField,
    selections: Mutex<FormSelections>,
}

impl SearchForm {
    pub fn new(lookup: Arc<dyn AirportLookup>, debounce_window: Duration) -> Self {
        Self {
            origin_field: AirportField::new("origin", Arc::clone(&lookup), debounce_window),
            destination_field: AirportField::new("destination", lookup, debounce_window),
            selections: Mutex::new(FormSelections::default()),
        }
    }

    pub fn origin_field(&self) -> &AirportField {
        &self.origin_field
    }

    pub fn destination_field(&self) -> &AirportField {
        &self.destination_field
    }

    pub fn selections(&self) -> FormSelections {
        self.selections.lock().clone()
    }

    // None clears the selection, as the clearable select does
    pub fn select_origin(&self, option: Option<AirportOption>) {
        self.selections.lock().origin = option;
    }

    pub fn select_destination(&self, option: Option<AirportOption>) {
        self.selections.lock().destination = option;
    }

    pub fn set_departure_date(&self, date: Option<NaiveDate>) {
        self.selections.lock().departure_date = date;
    }

    pub fn set_return_date(&self, date: Option<NaiveDate>) {
        self.selections.lock().return_date = date;
    }

    pub fn set_departure_date_str(&self, value: &str) -> Result<(), ValidationError> {
        let date = parse_date("departure date", value)?;
        self.set_departure_date(date);
        Ok(())
    }

    pub fn set_return_date_str(&self, value: &str) -> Result<(), ValidationError> {
        let date = parse_date("return date", value)?;
        self.set_return_date(date);
        Ok(())
    }

    pub fn is_submittable(&self) -> bool {
        self.selections.lock().missing_fields().is_empty()
    }

    // Forwards one snapshot per call; incomplete forms never reach the handler
    pub async fn submit(&self, handler: &dyn SearchHandler) -> Result<(), ValidationError> {
        let criteria = self.selections.lock().criteria();
        let criteria = match criteria {
            Ok(criteria) => criteria,
            Err(err) => {
                debug!(error = %err, "Search form submitted incomplete");
                return Err(err);
            }
        };

        info!(
            origin = %criteria.origin.code,
            destination = %criteria.destination.code,
            departure_date = %criteria.departure_date,
            "Submitting flight search"
        );
        handler.on_search(criteria).await;
        Ok(())
    }

    pub fn teardown(&self) {
        self.origin_field.teardown();
        self.destination_field.teardown();
    }
}
