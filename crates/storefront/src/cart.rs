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

//! Cart manager
//!
//! Holds the last cart returned by the API and drives the cart actions.
//! Every action picks the `/auth` endpoint variant from the session hint and
//! replaces local state with the cart returned by the call.
//!
//! # Failure handling
//!
//! A failed action emits an error notification, leaves the previous cart
//! untouched and returns the error. Nothing is retried.

use std::sync::{
	Arc, RwLock,
	atomic::{AtomicBool, Ordering},
};

use storefront_gateway::{HttpMethod, RequestOptions};
use storefront_sdk::{Cart, CartEnvelope, CartItemRequest};
use thiserror::Error;
use tracing::{debug, info};

use crate::context::{RequestError, StoreContext};

#[derive(Debug, Error)]
pub enum CartError {
	#[error(transparent)]
	Request(#[from] RequestError),
	#[error("Failed to encode cart request: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Result of an add-to-cart click
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
	/// The item was added; carries the updated cart, if the API returned one
	Added(Option<Cart>),
	/// Another add was still in flight, nothing was sent
	Dropped,
}

/// Result of a weight change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
	Updated,
	/// Requested weight equals the current one, nothing was sent
	Unchanged,
}

/// Clears the in-flight flag when the add completes, whatever the outcome
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| InFlight(flag))
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

pub struct CartManager {
	ctx: Arc<StoreContext>,
	cart: RwLock<Option<Cart>>,
	adding: AtomicBool,
}

impl CartManager {
	pub fn new(ctx: Arc<StoreContext>) -> Self {
		Self {
			ctx,
			cart: RwLock::new(None),
			adding: AtomicBool::new(false),
		}
	}

	/// Last cart returned by the API
	pub fn cart(&self) -> Option<Cart> {
		self.cart.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Item count shown on the navigation badge
	pub fn badge_count(&self) -> u32 {
		self.cart
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.as_ref()
			.map(|cart| cart.item_count)
			.unwrap_or(0)
	}

	/// Whether an add-to-cart call is in flight
	pub fn is_adding(&self) -> bool {
		self.adding.load(Ordering::Acquire)
	}

	/// Fetch the cart
	pub async fn load(&self) -> Result<Option<Cart>, CartError> {
		let endpoint = self.ctx.hint().endpoint("/cart");
		let cart = self
			.call(HttpMethod::Get, &endpoint, RequestOptions::default(), "Failed to fetch cart")
			.await?;

		info!(
			target: "cart",
			"Cart loaded in {} mode with {} items",
			self.ctx.gateway().mode(),
			self.badge_count()
		);
		Ok(cart)
	}

	/// Add `weight_grams` of a product
	///
	/// While a previous add is in flight further calls are dropped without
	/// reaching the gateway.
	pub async fn add_item(&self, product_id: &str, weight_grams: u32) -> Result<AddOutcome, CartError> {
		let Some(_guard) = InFlight::acquire(&self.adding) else {
			debug!(target: "cart", "Add for {} dropped, another add is in flight", product_id);
			return Ok(AddOutcome::Dropped);
		};

		let endpoint = self.ctx.hint().endpoint(&item_path(product_id));
		let options = item_body(product_id, weight_grams)?;
		let cart = self
			.call(HttpMethod::Post, &endpoint, options, "Failed to add item")
			.await?;

		self.ctx.success("Item added to cart!");
		Ok(AddOutcome::Added(cart))
	}

	/// Change the weight of a cart line
	pub async fn update_item(&self, product_id: &str, weight_grams: u32) -> Result<UpdateOutcome, CartError> {
		let unchanged = self.cart().is_some_and(|cart| {
			cart.items
				.iter()
				.any(|item| item.product_id == product_id && item.weight_grams == weight_grams)
		});
		if unchanged {
			return Ok(UpdateOutcome::Unchanged);
		}

		let endpoint = self.ctx.hint().endpoint(&item_path(product_id));
		let options = item_body(product_id, weight_grams)?;
		self.call(HttpMethod::Put, &endpoint, options, "Failed to update cart")
			.await?;

		self.ctx.success("Cart updated successfully!");
		Ok(UpdateOutcome::Updated)
	}

	/// Remove a cart line
	pub async fn remove_item(&self, product_id: &str) -> Result<Option<Cart>, CartError> {
		let endpoint = self.ctx.hint().endpoint(&item_path(product_id));
		let cart = self
			.call(HttpMethod::Delete, &endpoint, RequestOptions::default(), "Failed to remove item")
			.await?;

		self.ctx.success("Item removed from cart");
		Ok(cart)
	}

	/// Empty the cart
	pub async fn clear(&self) -> Result<Option<Cart>, CartError> {
		let endpoint = self.ctx.hint().endpoint("/cart");
		let cart = self
			.call(HttpMethod::Delete, &endpoint, RequestOptions::default(), "Failed to clear cart")
			.await?;

		self.ctx.success("Cart cleared");
		Ok(cart)
	}

	async fn call(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
		action: &'static str,
	) -> Result<Option<Cart>, CartError> {
		match self
			.ctx
			.request::<CartEnvelope>(method, endpoint, options, action)
			.await
		{
			Ok(envelope) => {
				*self.cart.write().unwrap_or_else(|e| e.into_inner()) = envelope.cart.clone();
				Ok(envelope.cart)
			}
			Err(e) => {
				self.ctx.error(e.to_string());
				Err(e.into())
			}
		}
	}
}

fn item_path(product_id: &str) -> String {
	format!("/cart/items/{}", product_id)
}

fn item_body(product_id: &str, weight_grams: u32) -> Result<RequestOptions, CartError> {
	let body = serde_json::to_string(&CartItemRequest {
		product_id: product_id.to_string(),
		weight_grams,
	})?;
	Ok(RequestOptions::new().with_body(body))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_in_flight_guard() {
		let flag = AtomicBool::new(false);

		let guard = InFlight::acquire(&flag).unwrap();
		assert!(InFlight::acquire(&flag).is_none());

		drop(guard);
		assert!(!flag.load(Ordering::Acquire));
		assert!(InFlight::acquire(&flag).is_some());
	}

	#[test]
	fn test_item_body_is_camel_case() {
		let options = item_body("coffee-1", 500).unwrap();
		assert_eq!(
			options.body.as_deref(),
			Some(r#"{"productId":"coffee-1","weightGrams":500}"#)
		);
		assert_eq!(item_path("coffee-1"), "/cart/items/coffee-1");
	}
}
