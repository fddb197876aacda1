//! Request-number formatting and parsing.
//!
//! Request numbers are the human-readable handles for orders: `TRQ_1`,
//! `TRQ_2`, ... strictly increasing and never reused, even after
//! cancellation. Allocation lives in the core; the pure string helpers
//! live here so every crate formats and parses them identically.

/// Prefix shared by all request numbers.
pub const REQUEST_NUMBER_PREFIX: &str = "TRQ_";

/// Formats a sequence value as a request number.
pub fn format_request_number(n: u64) -> String {
	format!("{}{}", REQUEST_NUMBER_PREFIX, n)
}

/// Parses the numeric suffix out of a request number.
///
/// Returns `None` for anything that is not `TRQ_<decimal>` exactly.
pub fn parse_request_number(s: &str) -> Option<u64> {
	s.strip_prefix(REQUEST_NUMBER_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips() {
		assert_eq!(format_request_number(1), "TRQ_1");
		assert_eq!(parse_request_number("TRQ_1"), Some(1));
		assert_eq!(parse_request_number("TRQ_4021"), Some(4021));
	}

	#[test]
	fn rejects_malformed() {
		assert_eq!(parse_request_number("TRQ_"), None);
		assert_eq!(parse_request_number("TRQ-7"), None);
		assert_eq!(parse_request_number("trq_7"), None);
		assert_eq!(parse_request_number("TRQ_7x"), None);
		assert_eq!(parse_request_number(""), None);
	}
}
