use crate::models::RequestMatcher;

/// Decide whether a matching verdict may be reused for an identical future request.
///
/// A request that differs only in headers or state could get a different
/// verdict, so any header or state involvement (by the winner, or by a pair
/// that failed only on headers or state) makes the verdict non-cacheable.
pub fn is_cachable(
    pair: Option<&RequestMatcher>,
    matched_on_all_but_headers_at_least_once: bool,
    matched_on_all_but_state_at_least_once: bool,
) -> bool {
    if matched_on_all_but_headers_at_least_once || matched_on_all_but_state_at_least_once {
        return false;
    }
    match pair {
        Some(matcher) => !matcher.includes_header_matching() && !matcher.includes_state_matching(),
        None => true,
    }
}
