//! Data model shared by the matchers, strategies and cache.

mod cached;
mod closest_miss;
mod matcher;
mod request;

pub use cached::CachedResponse;
pub use closest_miss::ClosestMiss;
pub use matcher::{
    KeyedMatchers, MatcherConfig, MatcherValue, RequestFieldMatcher, RequestMatcher,
    RequestMatcherResponsePair, ResponseDetails,
};
pub use request::{parse_form_body, MultiMap, RequestDetails, RequestDetailsView};
