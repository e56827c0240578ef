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

//! Product stock display

use std::{
	fmt,
	sync::{Arc, RwLock},
};

use storefront_gateway::{HttpMethod, RequestOptions};
use storefront_sdk::ProductCatalog;
use thiserror::Error;
use tracing::warn;

use crate::context::{RequestError, StoreContext};

#[derive(Debug, Error)]
pub enum ProductsError {
	#[error(transparent)]
	Request(#[from] RequestError),
}

/// Whether a product can be bought
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
	InStock(u32),
	SoldOut,
	/// Product missing from the stock feed
	Unknown,
}

impl Availability {
	/// Buy / add-to-cart buttons stay enabled unless the product is sold out
	pub fn can_purchase(&self) -> bool {
		!matches!(self, Availability::SoldOut)
	}
}

impl fmt::Display for Availability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Availability::InStock(quantity) => write!(f, "In stock ({})", quantity),
			Availability::SoldOut => f.write_str("Sold Out"),
			Availability::Unknown => f.write_str("Unknown"),
		}
	}
}

pub struct ProductsManager {
	ctx: Arc<StoreContext>,
	catalog: RwLock<ProductCatalog>,
}

impl ProductsManager {
	pub fn new(ctx: Arc<StoreContext>) -> Self {
		Self {
			ctx,
			catalog: RwLock::new(ProductCatalog::new()),
		}
	}

	/// Fetch stock levels, returns the number of products
	pub async fn refresh(&self) -> Result<usize, ProductsError> {
		let catalog = match self
			.ctx
			.request::<ProductCatalog>(
				HttpMethod::Get,
				"/products",
				RequestOptions::default(),
				"Products API error",
			)
			.await
		{
			Ok(catalog) => catalog,
			Err(e) => {
				self.ctx.error(e.to_string());
				return Err(e.into());
			}
		};

		let count = catalog.len();
		*self.catalog.write().unwrap_or_else(|e| e.into_inner()) = catalog;
		Ok(count)
	}

	pub fn catalog(&self) -> ProductCatalog {
		self.catalog.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	pub fn availability(&self, product_id: &str) -> Availability {
		match self
			.catalog
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.get(product_id)
		{
			Some(stock) if stock.quantity == 0 => Availability::SoldOut,
			Some(stock) => Availability::InStock(stock.quantity),
			None => {
				warn!(target: "products", "No product data for {}", product_id);
				Availability::Unknown
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_only_sold_out_blocks_purchase() {
		assert!(Availability::InStock(3).can_purchase());
		assert!(Availability::Unknown.can_purchase());
		assert!(!Availability::SoldOut.can_purchase());
		assert_eq!(Availability::SoldOut.to_string(), "Sold Out");
	}
}
