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

//! Storefront client
//!
//! Page managers for the storefront (cart, checkout, order history and
//! product stock) built on top of [`storefront_gateway::ApiGateway`].
//!
//! Managers never render anything. They keep the state a page would show and
//! report action outcomes through a [`Notifier`].

pub mod cart;
pub mod checkout;
pub mod context;
pub mod logging;
pub mod notify;
pub mod orders;
pub mod products;

use std::sync::Arc;

use storefront_gateway::{GatewayError, SessionStore, StorefrontConfig};

pub use cart::{AddOutcome, CartError, CartManager, UpdateOutcome};
pub use checkout::{CheckoutError, CheckoutManager, CheckoutReadiness, CheckoutStep, PaymentForm};
pub use context::{RequestError, StoreContext};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use orders::{OrderFilter, OrdersError, OrdersManager, ReorderOutcome};
pub use products::{Availability, ProductsError, ProductsManager};

/// All page managers over one shared context
pub struct Storefront {
	pub ctx: Arc<StoreContext>,
	pub cart: CartManager,
	pub checkout: CheckoutManager,
	pub orders: OrdersManager,
	pub products: ProductsManager,
}

impl Storefront {
	pub fn new(ctx: Arc<StoreContext>) -> Self {
		Self {
			cart: CartManager::new(ctx.clone()),
			checkout: CheckoutManager::new(ctx.clone()),
			orders: OrdersManager::new(ctx.clone()),
			products: ProductsManager::new(ctx.clone()),
			ctx,
		}
	}

	pub fn from_config(
		config: StorefrontConfig,
		session: Arc<dyn SessionStore>,
		notifier: Arc<dyn Notifier>,
	) -> Result<Self, GatewayError> {
		let ctx = StoreContext::from_config(config, session, notifier)?;
		Ok(Self::new(Arc::new(ctx)))
	}
}
