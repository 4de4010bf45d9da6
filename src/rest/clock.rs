//! Conversion between the wire date format and internal timestamps.
//!
//! Internally every timestamp is an offset-naive UTC [`NaiveDateTime`].
//! Offset-aware values coming out of a store are normalized on the way in,
//! and the two representations are never compared directly.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};

use crate::rest::document::Value;

/// RFC 1123, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`.
pub const WIRE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn to_wire_format(timestamp: Option<NaiveDateTime>) -> Option<String> {
    timestamp.map(|t| t.format(WIRE_FORMAT).to_string())
}

/// Parses a wire-format date. Absent, empty and malformed input all yield
/// `None`.
pub fn from_wire_format(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }

    match NaiveDateTime::parse_from_str(s, WIRE_FORMAT) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::debug!(value = %s, error = %e, "Ignoring unparseable wire date");
            None
        }
    }
}

pub fn normalize_store_timestamp(timestamp: DateTime<FixedOffset>) -> NaiveDateTime {
    timestamp.naive_utc()
}

/// Fallback for documents lacking a creation or update time.
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// The wire date plus one second. Stored timestamps keep sub-second
/// precision while the wire format is truncated to whole seconds.
/// A date with no representable successor is treated as absent.
pub fn weak_comparison_bound(s: Option<&str>) -> Option<NaiveDateTime> {
    let t = from_wire_format(s)?;
    let bound = t.checked_add_signed(TimeDelta::seconds(1));
    if bound.is_none() {
        tracing::debug!(value = %t, "Ignoring wire date at the end of the representable range");
    }
    bound
}

/// Reads a document timestamp field, accepting either timestamp flavour or a
/// wire-format string. Anything else is treated as missing.
pub fn timestamp_of(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::DateTime(t) => Some(*t),
        Value::ZonedDateTime(t) => Some(normalize_store_timestamp(*t)),
        Value::String(s) => from_wire_format(Some(s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_unix_zero() {
        assert_eq!(epoch().and_utc().timestamp(), 0);
    }

    #[test]
    fn absent_inputs_stay_absent() {
        assert_eq!(to_wire_format(None), None);
        assert_eq!(from_wire_format(None), None);
        assert_eq!(from_wire_format(Some("")), None);
        assert_eq!(weak_comparison_bound(None), None);
    }
}
