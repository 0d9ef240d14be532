//! Logger-name to platform-tag derivation.
//!
//! Platform log tags are capped at [`TAG_MAX_LEN`] characters. Hierarchical
//! logger names (dotted names or Rust module paths) are shortened to fit:
//! a handful of well-known channels map to fixed tags, everything under the
//! pool dependency's namespace collapses into a single tag, and any other
//! name keeps its most specific (rightmost) portion.

use std::borrow::Cow;

/// Maximum tag length accepted by the platform logging facility.
pub const TAG_MAX_LEN: usize = 23;

/// Fixed tag for the pool wire-tracing channel.
pub const WIRE_TAG: &str = "RoostPoolWire";
/// Fixed tag for the pool header-tracing channel.
pub const HEADERS_TAG: &str = "RoostPoolHeader";
/// Fixed tag covering all chatter from the pool dependency itself.
pub const POOL_TAG: &str = "ConnPool";

const WIRE_CHANNEL: &str = "roost_pool.wire";
const HEADERS_CHANNEL: &str = "roost_pool.headers";
const POOL_NAMESPACE: &str = "deadpool";

fn normalize(name: &str) -> Cow<'_, str> {
    if name.contains("::") {
        Cow::Owned(name.replace("::", "."))
    } else {
        Cow::Borrowed(name)
    }
}

/// Derives the platform tag for a logger name.
///
/// Rust module-path separators (`::`) are treated as name separators (`.`).
/// Resolution order: exact channel overrides, pool-namespace coarsening,
/// then [`derive_tag`].
#[must_use]
pub fn tag_for_name(name: &str) -> String {
    let name = normalize(name);
    match name.as_ref() {
        WIRE_CHANNEL => WIRE_TAG.to_string(),
        HEADERS_CHANNEL => HEADERS_TAG.to_string(),
        name if name.starts_with(POOL_NAMESPACE) => POOL_TAG.to_string(),
        name => derive_tag(name),
    }
}

/// Shortens a dotted logger name to at most [`TAG_MAX_LEN`] characters.
///
/// Names that already fit are used unmodified. Longer names keep the segment
/// after the last `.` if that still fits, otherwise the last
/// [`TAG_MAX_LEN`] characters of the full name. Tail truncation preserves
/// the most specific part of the name.
#[must_use]
pub fn derive_tag(name: &str) -> String {
    let length = name.chars().count();
    if length <= TAG_MAX_LEN {
        return name.to_string();
    }
    let suffix_len = name
        .rfind('.')
        .map_or(length, |i| name[i + 1..].chars().count());
    if suffix_len <= TAG_MAX_LEN {
        name.chars().skip(length - suffix_len).collect()
    } else {
        name.chars().skip(length - TAG_MAX_LEN).collect()
    }
}
