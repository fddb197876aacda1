//! Dashboard partitioning and pagination.
//!
//! Routes orders into the admin dashboard's three disjoint buckets and the
//! customer dashboard's active/archived split. Buckets are mutually
//! exclusive by construction but deliberately not exhaustive: an unclaimed
//! order that has left `Submitted` (priced before anyone claimed it)
//! belongs to none of them; the router logs when it sees one.

use crate::authz::{authorize, Action};
use crate::CoreError;
use std::sync::Arc;
use trq_storage::{OrderFilter, OrderStore, OwnerFilter};
use trq_types::{Actor, Order, OrderStatus, UserId};

/// Statuses a customer sees under "my submissions"; everything else is
/// archived.
pub const ACTIVE_STATUSES: [OrderStatus; 4] = [
	OrderStatus::Submitted,
	OrderStatus::Quoted,
	OrderStatus::Accepted,
	OrderStatus::Requote,
];

const MINE_STATUSES: [OrderStatus; 3] = [
	OrderStatus::Submitted,
	OrderStatus::Quoted,
	OrderStatus::Accepted,
];

/// One paginated slice of a bucket.
#[derive(Debug, Clone)]
pub struct Page<T> {
	/// Items on this page, newest first.
	pub items: Vec<T>,
	/// The 1-indexed page that was requested.
	pub page: usize,
	/// Total pages in the bucket (`ceil(count / page_size)`).
	pub total_pages: u64,
}

/// The three admin buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminBucket {
	/// Claimed by the acting admin and still being worked.
	Mine,
	/// Unclaimed, freshly submitted.
	Unclaimed,
	/// Claimed past submission (including paid and cancelled), except the
	/// acting admin's own working set.
	Claimed,
}

fn mine_filter(admin: &UserId) -> OrderFilter {
	OrderFilter {
		owner: OwnerFilter::Exactly(admin.clone()),
		statuses: Some(MINE_STATUSES.to_vec()),
		is_paid: Some(false),
		..Default::default()
	}
}

fn unclaimed_filter() -> OrderFilter {
	OrderFilter {
		owner: OwnerFilter::Unset,
		statuses: Some(vec![OrderStatus::Submitted]),
		..Default::default()
	}
}

// Claimed must not overlap Mine, so the viewer's working set is carved out
// explicitly: an admin's own Quoted order satisfies the raw
// owner-set/non-Submitted predicate but belongs under Mine.
fn claimed_filter(admin: &UserId) -> OrderFilter {
	OrderFilter {
		owner: OwnerFilter::Set,
		exclude_statuses: Some(vec![OrderStatus::Submitted]),
		exclude: Some(Box::new(mine_filter(admin))),
		..Default::default()
	}
}

/// Classifies one order for a given admin's dashboard.
///
/// Returns `None` for orders in no bucket (someone else's claimed
/// `Submitted` order, or an unclaimed order that left `Submitted`). The
/// first matching bucket wins; since `Claimed` excludes the viewer's Mine
/// set, every order lands in at most one bucket.
pub fn admin_bucket(order: &Order, admin: &UserId) -> Option<AdminBucket> {
	if mine_filter(admin).matches(order) {
		Some(AdminBucket::Mine)
	} else if unclaimed_filter().matches(order) {
		Some(AdminBucket::Unclaimed)
	} else if claimed_filter(admin).matches(order) {
		Some(AdminBucket::Claimed)
	} else {
		None
	}
}

/// Admin dashboard snapshot: three independently paginated buckets.
#[derive(Debug, Clone)]
pub struct AdminDashboard {
	pub mine: Page<Order>,
	pub unclaimed: Page<Order>,
	pub claimed: Page<Order>,
}

/// Customer dashboard snapshot.
#[derive(Debug, Clone)]
pub struct CustomerDashboard {
	pub active: Page<Order>,
	pub archived: Page<Order>,
}

/// Computes dashboard views against the order store.
pub struct DashboardRouter {
	orders: Arc<dyn OrderStore>,
	page_size: usize,
}

impl DashboardRouter {
	pub fn new(orders: Arc<dyn OrderStore>, page_size: usize) -> Self {
		Self { orders, page_size }
	}

	/// Builds the three admin buckets for one page number.
	///
	/// The same page parameter applies to each bucket; the buckets
	/// paginate independently of each other.
	pub async fn admin_dashboard(
		&self,
		actor: &Actor,
		page: usize,
	) -> Result<AdminDashboard, CoreError> {
		authorize(actor, Action::AdminDashboardRead, None)?;

		let mine = self.page(mine_filter(&actor.id), page).await?;
		let unclaimed = self.page(unclaimed_filter(), page).await?;
		let claimed = self.page(claimed_filter(&actor.id), page).await?;

		self.warn_on_orphans().await;

		Ok(AdminDashboard {
			mine,
			unclaimed,
			claimed,
		})
	}

	/// Builds the customer's active/archived split for one page number.
	pub async fn customer_dashboard(
		&self,
		actor: &Actor,
		page: usize,
	) -> Result<CustomerDashboard, CoreError> {
		let active = self
			.page(
				OrderFilter {
					requester: Some(actor.id.clone()),
					statuses: Some(ACTIVE_STATUSES.to_vec()),
					..Default::default()
				},
				page,
			)
			.await?;
		let archived = self
			.page(
				OrderFilter {
					requester: Some(actor.id.clone()),
					exclude_statuses: Some(ACTIVE_STATUSES.to_vec()),
					..Default::default()
				},
				page,
			)
			.await?;
		Ok(CustomerDashboard { active, archived })
	}

	async fn page(&self, filter: OrderFilter, page: usize) -> Result<Page<Order>, CoreError> {
		let page = page.max(1);
		// Saturate: an absurd page number is just out of range, never a panic
		let skip = page.saturating_sub(1).saturating_mul(self.page_size);
		let (items, total) = self.orders.query(&filter, skip, self.page_size).await?;
		Ok(Page {
			items,
			page,
			total_pages: total.div_ceil(self.page_size as u64),
		})
	}

	// An unclaimed order outside Submitted appears in no bucket. That state
	// is reachable when an admin prices without claiming first; surface it
	// in the log instead of losing the order quietly.
	async fn warn_on_orphans(&self) {
		let filter = OrderFilter {
			owner: OwnerFilter::Unset,
			exclude_statuses: Some(vec![OrderStatus::Submitted]),
			..Default::default()
		};
		match self.orders.query(&filter, 0, 1).await {
			Ok((_, 0)) => {}
			Ok((orphans, count)) => {
				let example = orphans
					.first()
					.map(|o| o.request_number.clone())
					.unwrap_or_default();
				tracing::warn!(
					count,
					example = %example,
					"Unclaimed orders outside Submitted appear in no admin bucket"
				);
			}
			Err(e) => tracing::warn!(error = %e, "Orphan-order check failed"),
		}
	}
}
