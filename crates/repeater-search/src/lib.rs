//! Route search pipeline and its upstream provider clients.

pub mod config;
pub mod directions;
pub mod error;
pub mod pipeline;
pub mod repeaterbook;
pub mod retry;

pub use config::SearchConfig;
pub use directions::DirectionsClient;
pub use error::{ProximityError, RouteError, SearchError};
pub use pipeline::{
    NoProgress, ProgressSink, ProgressUpdate, ProximitySource, RouteProvider, SearchPipeline,
    SearchRequest, DEFAULT_SEARCH_RADIUS_MI,
};
pub use repeaterbook::RepeaterBookClient;
pub use retry::RetryPolicy;
