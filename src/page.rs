// Page-level search controller: results, loading flag and error line

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{ApiError, FlightOfferSource};
use crate::form::SearchHandler;
use crate::models::{FlightOffer, SearchCriteria};
use crate::typeahead::RequestState;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";
pub const FETCH_FAILED: &str = "An error occurred while fetching flight offers.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub results: Vec<FlightOffer>,
    pub loading: bool,
    pub error: Option<String>,
    searched: bool,
}

impl PageState {
    pub fn request_state(&self) -> RequestState {
        if self.loading {
            RequestState::Loading
        } else if !self.searched {
            RequestState::Idle
        } else {
            match &self.error {
                Some(message) => RequestState::Settled(Err(message.clone())),
                None => RequestState::Settled(Ok(())),
            }
        }
    }
}

// Server payloads win; anything else gets a generic line
pub fn search_error_message(err: &ApiError) -> String {
    match err {
        ApiError::ServerError { .. } => err
            .server_message()
            .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
        ApiError::NetworkError(_) | ApiError::InvalidResponse(_) | ApiError::InvalidUrl(_) => {
            FETCH_FAILED.to_string()
        }
    }
}

// Clears the loading flag however the search future ends
struct LoadingGuard<'a> {
    state: &'a watch::Sender<PageState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

pub struct SearchPage {
    offers: Arc<dyn FlightOfferSource>,
    state: watch::Sender<PageState>,
}

impl SearchPage {
    pub fn new(offers: Arc<dyn FlightOfferSource>) -> Self {
        let (state, _) = watch::channel(PageState::default());
        Self { offers, state }
    }

    pub fn state(&self) -> PageState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    pub async fn search(&self, criteria: SearchCriteria) {
        self.state.send_modify(|s| {
            s.results.clear();
            s.error = None;
            s.loading = true;
            s.searched = true;
        });
        let _loading = LoadingGuard { state: &self.state };

        match self.offers.flight_offers(&criteria).await {
            Ok(offers) => {
                info!(count = offers.len(), "Displaying flight offers");
                self.state.send_modify(|s| s.results = offers);
            }
            Err(err) => {
                warn!(error = %err, "Flight offer search failed");
                let message = search_error_message(&err);
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
    }
}

#[async_trait]
impl SearchHandler for SearchPage {
    async fn on_search(&self, criteria: SearchCriteria) {
        self.search(criteria).await;
    }
}
