pub mod models;
pub mod normalize;
pub mod polyline;
pub mod sampler;
pub mod spatial;

pub use models::{
    Band, NormalizedRepeater, RawRepeaterRecord, RouteInfo, RouteSample, SearchResult, UnknownBand,
};
pub use normalize::{filter_and_deduplicate, format_offset, normalize_repeater};
pub use polyline::{decode_polyline, encode_polyline, PolylineError};
pub use sampler::{sample_route, DEFAULT_SAMPLE_INTERVAL_MI, MAX_SAMPLE_POINTS};
pub use spatial::{haversine_miles, RoutePoint};
