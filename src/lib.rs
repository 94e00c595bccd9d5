// Flight points search client: airport typeahead, search form and results page

pub mod airport_cache;
pub mod api;
pub mod config;
pub mod debounce;
pub mod display;
pub mod form;
pub mod models;
pub mod page;
pub mod typeahead;

// Re-export key types for convenience
pub use airport_cache::{AirportCache, CacheConfig, CacheStatsReport, CachedAirportLookup};
pub use api::{AirportLookup, ApiError, ClientError, ClientStats, FlightOfferSource, HttpApiClient};
pub use config::ClientConfig;
pub use debounce::Debouncer;
pub use form::{FormField, SearchForm, SearchHandler, ValidationError};
pub use models::{AirportOption, ErrorBody, FlightOffer, ReturnFlight, SearchCriteria};
pub use page::{PageState, SearchPage};
pub use typeahead::{AirportField, FieldState, RequestState};
