// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Order history
//!
//! Lists past orders (signed-in users only), filters them by status, derives
//! tracking progress and puts the items of a past order back into the cart.

use std::{
	fmt,
	str::FromStr,
	sync::{Arc, RwLock},
};

use storefront_gateway::{HttpMethod, RequestOptions};
use storefront_sdk::{CartEnvelope, CartItemRequest, Order, OrderStatus, OrdersEnvelope};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::{RequestError, StoreContext};

#[derive(Debug, Error)]
pub enum OrdersError {
	#[error("Sign in required to view orders")]
	AuthRequired { sign_in_url: Option<String> },
	#[error("Order {0} not found")]
	NotFound(String),
	#[error(transparent)]
	Request(#[from] RequestError),
}

/// Status filter for the order list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrderFilter {
	#[default]
	All,
	Status(OrderStatus),
}

impl OrderFilter {
	pub fn matches(&self, order: &Order) -> bool {
		match self {
			OrderFilter::All => true,
			OrderFilter::Status(status) => &order.status == status,
		}
	}
}

impl FromStr for OrderFilter {
	type Err = std::convert::Infallible;

	/// `all` or a backend status code such as `SHIPPED`
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "all" {
			Ok(OrderFilter::All)
		} else {
			Ok(OrderFilter::Status(OrderStatus::from(s.to_string())))
		}
	}
}

impl fmt::Display for OrderFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderFilter::All => f.write_str("all"),
			OrderFilter::Status(status) => write!(f, "{}", status),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
	Pending,
	Active,
	Completed,
}

/// Progress through Processing, Shipped and Delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingProgress {
	pub processing: StageState,
	pub shipped: StageState,
	pub delivered: StageState,
}

/// Tracking progress for an order status
///
/// Statuses outside the paid/shipped/delivered flow show no progress.
pub fn tracking(status: &OrderStatus) -> TrackingProgress {
	use StageState::*;

	let (processing, shipped, delivered) = match status {
		OrderStatus::Paid => (Active, Pending, Pending),
		OrderStatus::Shipped => (Completed, Active, Pending),
		OrderStatus::Delivered => (Completed, Completed, Completed),
		_ => (Pending, Pending, Pending),
	};
	TrackingProgress {
		processing,
		shipped,
		delivered,
	}
}

/// Result of putting a past order back into the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
	/// Items accepted by the cart endpoint
	pub added: usize,
	/// Items attempted
	pub attempted: usize,
	/// Cart badge after the reorder, when the cart could be refreshed
	pub badge: Option<u32>,
}

pub struct OrdersManager {
	ctx: Arc<StoreContext>,
	orders: RwLock<Vec<Order>>,
	filter: RwLock<OrderFilter>,
}

impl OrdersManager {
	pub fn new(ctx: Arc<StoreContext>) -> Self {
		Self {
			ctx,
			orders: RwLock::new(Vec::new()),
			filter: RwLock::new(OrderFilter::All),
		}
	}

	fn require_auth(&self) -> Result<(), OrdersError> {
		if self.ctx.hint().is_signed_in() {
			Ok(())
		} else {
			Err(OrdersError::AuthRequired {
				sign_in_url: self.ctx.sign_in_link(),
			})
		}
	}

	/// Fetch the order history, returns the number of orders
	pub async fn load(&self) -> Result<usize, OrdersError> {
		self.require_auth()?;

		let envelope = match self
			.ctx
			.request::<OrdersEnvelope>(
				HttpMethod::Get,
				"/orders/auth",
				RequestOptions::default(),
				"Failed to fetch orders",
			)
			.await
		{
			Ok(envelope) => envelope,
			Err(e) => {
				self.ctx.error(e.to_string());
				return Err(e.into());
			}
		};

		let count = envelope.orders.len();
		*self.orders.write().unwrap_or_else(|e| e.into_inner()) = envelope.orders;
		info!(
			target: "orders",
			"Loaded {} orders in {} mode",
			count,
			self.ctx.gateway().mode()
		);
		Ok(count)
	}

	pub fn orders(&self) -> Vec<Order> {
		self.orders.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	pub fn filter(&self) -> OrderFilter {
		self.filter.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	pub fn set_filter(&self, filter: OrderFilter) {
		*self.filter.write().unwrap_or_else(|e| e.into_inner()) = filter;
	}

	/// Orders matching the current filter, newest first
	pub fn visible(&self) -> Vec<Order> {
		let filter = self.filter();
		let mut visible: Vec<Order> = self
			.orders
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.iter()
			.filter(|order| filter.matches(order))
			.cloned()
			.collect();
		visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		visible
	}

	pub fn find(&self, order_id: &str) -> Option<Order> {
		self.orders
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.iter()
			.find(|order| order.order_id == order_id)
			.cloned()
	}

	/// Add every item of a past order to the cart
	///
	/// Items are added one by one; individual failures are logged and skipped.
	/// One notification summarizes the outcome.
	pub async fn reorder(&self, order_id: &str) -> Result<ReorderOutcome, OrdersError> {
		let order = self
			.find(order_id)
			.ok_or_else(|| OrdersError::NotFound(order_id.to_string()))?;

		if order.items.is_empty() {
			self.ctx.warning("No items to reorder");
			return Ok(ReorderOutcome {
				added: 0,
				attempted: 0,
				badge: None,
			});
		}

		let hint = self.ctx.hint();
		let mut added = 0;
		for (product_id, item) in &order.items {
			let endpoint = hint.endpoint(&format!("/cart/items/{}", product_id));
			let body = CartItemRequest {
				product_id: product_id.clone(),
				weight_grams: item.quantity,
			};
			let options = match RequestOptions::json(&body) {
				Ok(options) => options,
				Err(e) => {
					error!(target: "orders", "Failed to encode {}: {}", item.product_name, e);
					continue;
				}
			};

			match self
				.ctx
				.request::<serde_json::Value>(HttpMethod::Post, &endpoint, options, "Failed to add item")
				.await
			{
				Ok(_) => added += 1,
				Err(e) => error!(target: "orders", "Failed to add {}: {}", item.product_name, e),
			}
		}

		if added == 0 {
			self.ctx.error("Failed to add items to cart");
			return Ok(ReorderOutcome {
				added,
				attempted: order.items.len(),
				badge: None,
			});
		}

		let plural = if added == 1 { "" } else { "s" };
		self.ctx.success(format!("Added {} item{} to cart!", added, plural));

		Ok(ReorderOutcome {
			added,
			attempted: order.items.len(),
			badge: self.refresh_badge().await,
		})
	}

	async fn refresh_badge(&self) -> Option<u32> {
		let endpoint = self.ctx.hint().endpoint("/cart");
		match self
			.ctx
			.request::<CartEnvelope>(HttpMethod::Get, &endpoint, RequestOptions::default(), "Failed to fetch cart")
			.await
		{
			Ok(envelope) => envelope.cart.map(|cart| cart.item_count),
			Err(e) => {
				warn!(target: "orders", "Could not update cart badge: {}", e);
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tracking_progress() {
		use StageState::*;

		let paid = tracking(&OrderStatus::Paid);
		assert_eq!((paid.processing, paid.shipped, paid.delivered), (Active, Pending, Pending));

		let shipped = tracking(&OrderStatus::Shipped);
		assert_eq!(
			(shipped.processing, shipped.shipped, shipped.delivered),
			(Completed, Active, Pending)
		);

		let delivered = tracking(&OrderStatus::Delivered);
		assert_eq!(delivered.delivered, Completed);

		let failed = tracking(&OrderStatus::Failed);
		assert_eq!(failed.processing, Pending);
	}

	#[test]
	fn test_filter_parsing() {
		assert_eq!("all".parse::<OrderFilter>().unwrap(), OrderFilter::All);
		assert_eq!(
			"PENDING_PAYMENT".parse::<OrderFilter>().unwrap(),
			OrderFilter::Status(OrderStatus::PendingPayment)
		);
		assert_eq!(OrderFilter::Status(OrderStatus::Shipped).to_string(), "SHIPPED");
	}
}
