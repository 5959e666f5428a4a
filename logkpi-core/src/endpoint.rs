//! Endpoint normalization.
//!
//! Collapses the known endpoint families onto a single grouping key:
//!
//! ```text
//! /status/403            → /status
//! /basic-auth/user/pass  → /basic-auth
//! /anything?x=1          → /anything
//! ```
//!
//! The rule set is fixed. Any endpoint outside the two prefixed families only
//! loses its query string.

const STATUS_PREFIX: &str = "/status";
const BASIC_AUTH_PREFIX: &str = "/basic-auth";

/// Normalize an endpoint into its grouping base.
pub fn normalize(endpoint: &str) -> &str {
    if endpoint.starts_with(STATUS_PREFIX) {
        return STATUS_PREFIX;
    }
    if endpoint.starts_with(BASIC_AUTH_PREFIX) {
        return BASIC_AUTH_PREFIX;
    }
    match endpoint.split_once('?') {
        Some((path, _query)) => path,
        None => endpoint,
    }
}
