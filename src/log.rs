//! Thin named wrapper around the `log` crate for the validator's one
//! logging call site (§4.7). Kept as a function rather than a bare
//! `log::debug!` call site so the message format is defined in one
//! place.

/// Emitted once per descriptor list that passes `validate::validate`,
/// at debug level so a caller with logging enabled can confirm which
/// types were accepted without the validator changing the pass/fail
/// outcome.
pub fn descriptor_validated(type_name: &'static str, field_count: usize) {
    log::debug!("{type_name}: descriptor validated ({field_count} fields)");
}
