//! Request-number allocation.
//!
//! The next number is derived from the most recently created order's
//! suffix. Allocation alone is not atomic; the store's uniqueness
//! constraint on `request_number` is what makes it safe. Two concurrent
//! creates can compute the same candidate, but only one insert wins and
//! the loser retries with fresh state. Numbers are therefore strictly
//! increasing with no reuse, even across cancellations.

use crate::CoreError;
use trq_storage::OrderStore;
use trq_types::{format_request_number, parse_request_number};

/// Computes the next request number from store state.
///
/// The very first order gets `TRQ_1`. An unparsable stored number means
/// corrupt data; that fails loudly instead of silently restarting the
/// sequence at 1.
pub async fn next_request_number(orders: &dyn OrderStore) -> Result<String, CoreError> {
	match orders.find_latest().await? {
		None => Ok(format_request_number(1)),
		Some(latest) => {
			let n = parse_request_number(&latest.request_number).ok_or_else(|| {
				CoreError::Internal(format!(
					"stored request number is unparsable: {}",
					latest.request_number
				))
			})?;
			Ok(format_request_number(n + 1))
		}
	}
}
