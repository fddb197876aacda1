//! API modules for the TRQ service.

use serde::Serialize;
use trq_core::Page;

pub mod admin;
pub mod auth;
pub mod orders;
pub mod vin;

/// Wire shape of one paginated bucket slice.
#[derive(Debug, Serialize)]
pub struct PageBody<T> {
	pub items: Vec<T>,
	pub page: usize,
	pub total_pages: u64,
}

impl<T> From<Page<T>> for PageBody<T> {
	fn from(page: Page<T>) -> Self {
		Self {
			items: page.items,
			page: page.page,
			total_pages: page.total_pages,
		}
	}
}
