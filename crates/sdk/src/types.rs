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

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single line in the shopping cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
	/// Product identifier
	pub product_id: String,
	/// Display name
	pub product_name: String,
	/// Selected weight in grams
	pub weight_grams: u32,
	/// Price per 100g
	pub price_per_unit: f64,
	/// Line total
	pub total_price: f64,
}

/// Shopping cart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cart {
	pub items: Vec<CartItem>,
	pub item_count: u32,
	/// Sum of line weights in grams
	pub total_weight: u32,
	pub subtotal: f64,
}

impl Cart {
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// Envelope returned by every cart endpoint: `{ "cart": { ... } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartEnvelope {
	#[serde(default)]
	pub cart: Option<Cart>,
}

/// Body for adding or updating a cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
	pub product_id: String,
	pub weight_grams: u32,
}

/// Stock entry for a product in the `/products` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
	/// Units (or grams) on hand; zero means sold out
	pub quantity: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub price: Option<f64>,
}

/// Product id -> stock entry
pub type ProductCatalog = BTreeMap<String, ProductStock>;

/// Order status
///
/// Known statuses are matched case-sensitively against the backend's
/// upper-case codes; anything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
	Paid,
	PendingPayment,
	Shipped,
	Failed,
	Delivered,
	Other(String),
}

impl OrderStatus {
	/// Backend status code (e.g. `PENDING_PAYMENT`)
	pub fn code(&self) -> &str {
		match self {
			OrderStatus::Paid => "PAID",
			OrderStatus::PendingPayment => "PENDING_PAYMENT",
			OrderStatus::Shipped => "SHIPPED",
			OrderStatus::Failed => "FAILED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Other(code) => code,
		}
	}

	/// Human readable label shown next to an order
	pub fn label(&self) -> &str {
		match self {
			OrderStatus::Paid => "Paid",
			OrderStatus::PendingPayment => "Pending",
			OrderStatus::Shipped => "Shipped",
			OrderStatus::Failed => "Failed",
			OrderStatus::Delivered => "Delivered",
			OrderStatus::Other(code) => code,
		}
	}
}

impl From<String> for OrderStatus {
	fn from(code: String) -> Self {
		match code.as_str() {
			"PAID" => OrderStatus::Paid,
			"PENDING_PAYMENT" => OrderStatus::PendingPayment,
			"SHIPPED" => OrderStatus::Shipped,
			"FAILED" => OrderStatus::Failed,
			"DELIVERED" => OrderStatus::Delivered,
			_ => OrderStatus::Other(code),
		}
	}
}

impl From<OrderStatus> for String {
	fn from(status: OrderStatus) -> Self {
		status.code().to_string()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

/// Line of a past order, keyed by product id in [`Order::items`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
	pub product_name: String,
	/// Ordered weight in grams
	pub quantity: u32,
	#[serde(default)]
	pub price_per_unit: Option<f64>,
	#[serde(default)]
	pub total_price: Option<f64>,
}

/// Order information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	pub order_id: String,
	pub created_at: DateTime<Utc>,
	pub status: OrderStatus,
	pub total_amount: f64,
	#[serde(default)]
	pub items: BTreeMap<String, OrderItem>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shipping: Option<ShippingDetails>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tracking_number: Option<String>,
}

/// Envelope returned by `/orders/auth`: `{ "orders": [ ... ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersEnvelope {
	#[serde(default)]
	pub orders: Vec<Order>,
}

/// Shipping address collected in the first checkout step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingDetails {
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub phone: String,
	pub address: String,
	pub city: String,
	pub state: String,
	pub zip: String,
}

/// Payment data sent to the backend. Never carries the full card number or CVV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
	pub card_name: String,
	pub card_last4: String,
	pub card_expiry: String,
}

/// Price breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
	pub subtotal: f64,
	pub shipping: f64,
	pub tax: f64,
	pub total: f64,
}

/// Checkout line, derived from a cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
	pub product_id: String,
	pub product_name: String,
	pub weight_grams: u32,
	pub price_per_unit: f64,
	/// Weight doubles as quantity on the backend
	pub quantity: u32,
	pub total_price: f64,
}

impl From<&CartItem> for CheckoutItem {
	fn from(item: &CartItem) -> Self {
		Self {
			product_id: item.product_id.clone(),
			product_name: item.product_name.clone(),
			weight_grams: item.weight_grams,
			price_per_unit: item.price_per_unit,
			quantity: item.weight_grams,
			total_price: item.total_price,
		}
	}
}

/// Request body for `POST /checkout/auth`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
	pub items: Vec<CheckoutItem>,
	pub shipping: ShippingDetails,
	pub payment: PaymentSummary,
	pub pricing: Pricing,
}

/// Response from placing an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
	pub order_id: String,
	#[serde(default)]
	pub status: Option<OrderStatus>,
	#[serde(default)]
	pub message: Option<String>,
}

/// Error body some endpoints return alongside a non-2xx status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
	#[serde(default)]
	pub message: Option<String>,
}

/// Postal address attached to a user profile
///
/// Identity providers return either a structured address or a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileAddress {
	Structured {
		#[serde(default)]
		street: Option<String>,
		#[serde(default)]
		city: Option<String>,
		#[serde(default)]
		state: Option<String>,
		#[serde(default, alias = "postal_code")]
		zip: Option<String>,
	},
	Line(String),
}

/// User profile returned by `/user/profile/auth`
///
/// Accepts both the backend's camelCase names and the OIDC claim names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
	#[serde(alias = "given_name")]
	pub first_name: Option<String>,
	#[serde(alias = "family_name")]
	pub last_name: Option<String>,
	pub email: Option<String>,
	#[serde(alias = "phone_number")]
	pub phone: Option<String>,
	pub address: Option<ProfileAddress>,
}

/// Envelope returned by `/user/profile/auth`: `{ "user": { ... } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfileEnvelope {
	#[serde(default)]
	pub user: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_order_status_codes() {
		let status: OrderStatus = serde_json::from_str("\"PENDING_PAYMENT\"").unwrap();
		assert_eq!(status, OrderStatus::PendingPayment);
		assert_eq!(status.label(), "Pending");

		let unknown: OrderStatus = serde_json::from_str("\"ON_HOLD\"").unwrap();
		assert_eq!(unknown, OrderStatus::Other("ON_HOLD".to_string()));
		assert_eq!(unknown.label(), "ON_HOLD");
		assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"ON_HOLD\"");
	}

	#[test]
	fn test_cart_envelope_camel_case() {
		let json = r#"{"cart":{"items":[{"productId":"p1","productName":"Basil","weightGrams":250,"pricePerUnit":1.5,"totalPrice":3.75}],"itemCount":1,"subtotal":3.75}}"#;
		let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
		let cart = envelope.cart.unwrap();
		assert_eq!(cart.item_count, 1);
		assert_eq!(cart.items[0].product_id, "p1");
		assert_eq!(cart.items[0].weight_grams, 250);
	}

	#[test]
	fn test_profile_accepts_oidc_claims() {
		let json = r#"{"given_name":"Ada","family_name":"Lovelace","phone_number":"555","address":{"street":"1 Main","postal_code":"12345"}}"#;
		let profile: UserProfile = serde_json::from_str(json).unwrap();
		assert_eq!(profile.first_name.as_deref(), Some("Ada"));
		assert_eq!(profile.last_name.as_deref(), Some("Lovelace"));
		assert_eq!(profile.phone.as_deref(), Some("555"));
		match profile.address {
			Some(ProfileAddress::Structured { street, zip, .. }) => {
				assert_eq!(street.as_deref(), Some("1 Main"));
				assert_eq!(zip.as_deref(), Some("12345"));
			}
			other => panic!("unexpected address: {:?}", other),
		}
	}

	#[test]
	fn test_checkout_item_uses_weight_as_quantity() {
		let item = CartItem {
			product_id: "p1".to_string(),
			product_name: "Basil".to_string(),
			weight_grams: 500,
			price_per_unit: 1.0,
			total_price: 5.0,
		};
		let line = CheckoutItem::from(&item);
		assert_eq!(line.quantity, 500);
		assert_eq!(line.weight_grams, 500);
	}
}
