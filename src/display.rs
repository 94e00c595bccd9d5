// Plain-text rendering of the dropdown empty state and the results area

use std::fmt::Write;

use crate::models::{FlightOffer, ReturnFlight, OFFER_TIME_FORMAT};
use crate::page::PageState;
use crate::typeahead::FieldState;

pub const LOADING_LINE: &str = "Loading...";
pub const NO_OFFERS_LINE: &str = "No flight offers available.";

pub fn render_field(state: &FieldState) -> String {
    if state.loading {
        return LOADING_LINE.to_string();
    }
    match state.empty_state_message() {
        Some(message) => message,
        None => state
            .options
            .iter()
            .map(|option| option.display_label.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn render_results(state: &PageState) -> String {
    if state.loading {
        return LOADING_LINE.to_string();
    }

    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}");
    }

    if state.results.is_empty() {
        out.push_str(NO_OFFERS_LINE);
        return out;
    }

    out.push_str("Flight Offers\n");
    for offer in &state.results {
        out.push('\n');
        render_offer(&mut out, offer);
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn render_offer(out: &mut String, offer: &FlightOffer) {
    let _ = writeln!(out, "Airline: {} - ${}", offer.airline, offer.price);
    let _ = writeln!(
        out,
        "Points Required: {} | Value per Point: {} cents",
        offer.points_required, offer.value_per_point
    );
    let _ = writeln!(
        out,
        "Departure: {} | Arrival: {}",
        offer.departure_time.format(OFFER_TIME_FORMAT),
        offer.arrival_time.format(OFFER_TIME_FORMAT)
    );
    let _ = writeln!(out, "Duration: {} | Stops: {}", offer.duration, offer.stops);
    let _ = writeln!(
        out,
        "Total Travel Time: {} | Overnight: {}",
        offer.total_travel_time,
        yes_no(offer.overnight)
    );

    if let Some(return_flight) = &offer.return_flight {
        render_return_flight(out, offer, return_flight);
    }
}

// Missing return-leg pricing falls back to the outbound offer's figures
fn render_return_flight(out: &mut String, offer: &FlightOffer, leg: &ReturnFlight) {
    out.push_str("Return Flight\n");
    let _ = writeln!(
        out,
        "Airline: {} - ${}",
        leg.airline.as_deref().unwrap_or(&offer.airline),
        leg.price.unwrap_or(offer.price)
    );
    let _ = writeln!(
        out,
        "Points Required: {} | Value per Point: {} cents",
        leg.points_required.unwrap_or(offer.points_required),
        leg.value_per_point.unwrap_or(offer.value_per_point)
    );
    let _ = writeln!(
        out,
        "Departure: {} | Arrival: {}",
        leg.departure_time.format(OFFER_TIME_FORMAT),
        leg.arrival_time.format(OFFER_TIME_FORMAT)
    );
    let _ = writeln!(out, "Duration: {} | Stops: {}", leg.duration, leg.stops);
    let _ = writeln!(
        out,
        "Total Travel Time: {} | Overnight: {}",
        leg.total_travel_time,
        yes_no(leg.overnight)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::offer;
    use crate::models::AirportOption;
    use chrono::NaiveDate;

    #[test]
    fn test_render_empty_and_error() {
        let mut state = PageState::default();
        assert_eq!(render_results(&state), NO_OFFERS_LINE);

        state.error = Some("A, B".to_string());
        assert_eq!(render_results(&state), "Error: A, B\nNo flight offers available.");

        state.loading = true;
        assert_eq!(render_results(&state), LOADING_LINE);
    }

    #[test]
    fn test_render_offer_with_return_flight() {
        let mut outbound = offer("1", 1.3);
        outbound.return_flight = Some(ReturnFlight {
            airline: None,
            price: None,
            points_required: None,
            value_per_point: None,
            departure_time: NaiveDate::from_ymd_opt(2025, 6, 8)
                .unwrap()
                .and_hms_opt(22, 5, 0)
                .unwrap(),
            arrival_time: NaiveDate::from_ymd_opt(2025, 6, 9)
                .unwrap()
                .and_hms_opt(6, 40, 0)
                .unwrap(),
            duration: "5h 35m".to_string(),
            stops: 1,
            total_travel_time: "8h 35m".to_string(),
            overnight: true,
        });

        let mut state = PageState::default();
        state.results = vec![outbound];
        let text = render_results(&state);

        assert!(text.starts_with("Flight Offers\n"));
        assert!(text.contains("Airline: Delta Air Lines - $199\n"));
        assert!(text.contains("Points Required: 15307 | Value per Point: 1.3 cents\n"));
        assert!(text.contains("Departure: 2025-06-01 08:00 | Arrival: 2025-06-01 11:15\n"));
        assert!(text.contains("Total Travel Time: 6h 15m | Overnight: No\n"));

        let (_, return_block) = text.split_once("Return Flight\n").unwrap();
        assert!(return_block.contains("Airline: Delta Air Lines - $199\n"));
        assert!(return_block.contains("Departure: 2025-06-08 22:05 | Arrival: 2025-06-09 06:40\n"));
        assert!(return_block.contains("Duration: 5h 35m | Stops: 1\n"));
        assert!(return_block.contains("Overnight: Yes"));
    }

    #[test]
    fn test_render_prices_without_padding() {
        let mut outbound = offer("1", 1.25);
        outbound.price = 245.6;
        let mut state = PageState::default();
        state.results = vec![outbound];

        let text = render_results(&state);
        assert!(text.contains("Airline: Delta Air Lines - $245.6\n"));
        assert!(text.contains("Value per Point: 1.25 cents\n"));
    }

    #[test]
    fn test_render_field() {
        let mut state = FieldState::default();
        assert_eq!(render_field(&state), "No airports found");

        state.options = vec![
            AirportOption::new("JFK", "JOHN F KENNEDY INTL (JFK) - NEW YORK, USA"),
            AirportOption::new("LGA", "LAGUARDIA (LGA) - NEW YORK, USA"),
        ];
        assert_eq!(
            render_field(&state),
            "JOHN F KENNEDY INTL (JFK) - NEW YORK, USA\nLAGUARDIA (LGA) - NEW YORK, USA"
        );

        state.options.clear();
        state.error = Some("Unable to load airports".to_string());
        assert_eq!(render_field(&state), "Unable to load airports");
    }
}
