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

//! Checkout wizard
//!
//! # Steps
//!
//! 1. **Shipping**: contact and address, prefilled from the user profile
//! 2. **Payment**: card details, validated locally
//! 3. **Review**: price breakdown, then the order is placed
//!
//! # Card data
//!
//! The full card number and CVV are validated and then dropped. Only the
//! cardholder name, the last four digits and the expiry are kept, and only
//! those are sent with the order.
//!
//! Validation failures are returned as [`CheckoutError::Validation`] and never
//! reach the gateway.

use std::{
	fmt,
	sync::{Arc, RwLock},
};

use chrono::{Datelike, NaiveDate};
use storefront_gateway::{HttpMethod, RequestOptions};
use storefront_sdk::{
	Cart, CartEnvelope, CheckoutItem, CheckoutRequest, CheckoutResponse, PaymentSummary, Pricing,
	ProfileAddress, ShippingDetails, UserProfile, UserProfileEnvelope,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::context::{RequestError, StoreContext};

/// Flat shipping cost per order
pub const SHIPPING_COST: f64 = 2.99;

/// Sales tax applied to the subtotal
pub const TAX_RATE: f64 = 0.08;

/// Accepted card number lengths (digits only)
pub const CARD_NUMBER_MIN_DIGITS: usize = 13;
pub const CARD_NUMBER_MAX_DIGITS: usize = 19;

/// Longest formatted card number, e.g. `1234 5678 9012 3456`
const FORMATTED_CARD_MAX_CHARS: usize = 19;

#[derive(Debug, Error)]
pub enum CheckoutError {
	#[error("Sign in required to check out")]
	AuthRequired { sign_in_url: Option<String> },
	#[error("{0}")]
	Validation(String),
	#[error("Your cart is empty")]
	EmptyCart,
	#[error("Order failed: {0}")]
	OrderFailed(String),
	#[error(transparent)]
	Request(#[from] RequestError),
	#[error("Failed to encode order: {0}")]
	Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
	Shipping = 1,
	Payment = 2,
	Review = 3,
}

impl fmt::Display for CheckoutStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CheckoutStep::Shipping => f.write_str("Shipping"),
			CheckoutStep::Payment => f.write_str("Payment"),
			CheckoutStep::Review => f.write_str("Review"),
		}
	}
}

/// What the checkout page can show after [`CheckoutManager::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutReadiness {
	Ready,
	EmptyCart,
}

/// Raw payment form input
#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
	pub card_name: String,
	pub card_number: String,
	pub card_expiry: String,
	pub card_cvv: String,
}

#[derive(Debug, Clone)]
struct CheckoutState {
	step: CheckoutStep,
	cart: Option<Cart>,
	profile: Option<UserProfile>,
	shipping: ShippingDetails,
	payment: Option<PaymentSummary>,
}

impl Default for CheckoutState {
	fn default() -> Self {
		Self {
			step: CheckoutStep::Shipping,
			cart: None,
			profile: None,
			shipping: ShippingDetails::default(),
			payment: None,
		}
	}
}

pub struct CheckoutManager {
	ctx: Arc<StoreContext>,
	state: RwLock<CheckoutState>,
}

impl CheckoutManager {
	pub fn new(ctx: Arc<StoreContext>) -> Self {
		Self {
			ctx,
			state: RwLock::new(CheckoutState::default()),
		}
	}

	fn read(&self) -> std::sync::RwLockReadGuard<'_, CheckoutState> {
		self.state.read().unwrap_or_else(|e| e.into_inner())
	}

	fn write(&self) -> std::sync::RwLockWriteGuard<'_, CheckoutState> {
		self.state.write().unwrap_or_else(|e| e.into_inner())
	}

	fn require_auth(&self) -> Result<(), CheckoutError> {
		if self.ctx.hint().is_signed_in() {
			Ok(())
		} else {
			Err(CheckoutError::AuthRequired {
				sign_in_url: self.ctx.sign_in_link(),
			})
		}
	}

	/// Load the cart and the user profile, then prefill the shipping form
	///
	/// A profile that cannot be loaded only logs a warning.
	pub async fn init(&self) -> Result<CheckoutReadiness, CheckoutError> {
		self.require_auth()?;

		let (cart, profile) = tokio::join!(self.load_cart(), self.load_profile());

		if let Some(profile) = profile {
			let mut state = self.write();
			state.shipping = prefill_shipping(&profile);
			state.profile = Some(profile);
		}

		let cart = cart?;
		info!(
			target: "checkout",
			"Checkout initialized in {} mode",
			self.ctx.gateway().mode()
		);

		match cart {
			Some(cart) if !cart.is_empty() => Ok(CheckoutReadiness::Ready),
			_ => Ok(CheckoutReadiness::EmptyCart),
		}
	}

	async fn load_cart(&self) -> Result<Option<Cart>, CheckoutError> {
		let endpoint = self.ctx.hint().endpoint("/cart");
		match self
			.ctx
			.request::<CartEnvelope>(HttpMethod::Get, &endpoint, RequestOptions::default(), "Failed to load cart")
			.await
		{
			Ok(envelope) => {
				self.write().cart = envelope.cart.clone();
				Ok(envelope.cart)
			}
			Err(e) => {
				self.ctx.error(e.to_string());
				Err(e.into())
			}
		}
	}

	async fn load_profile(&self) -> Option<UserProfile> {
		match self
			.ctx
			.request::<UserProfileEnvelope>(
				HttpMethod::Get,
				"/user/profile/auth",
				RequestOptions::default(),
				"Failed to load user profile",
			)
			.await
		{
			Ok(envelope) => envelope.user,
			Err(e) => {
				warn!(target: "checkout", "Could not load user profile: {}", e);
				None
			}
		}
	}

	pub fn step(&self) -> CheckoutStep {
		self.read().step
	}

	pub fn cart(&self) -> Option<Cart> {
		self.read().cart.clone()
	}

	pub fn profile(&self) -> Option<UserProfile> {
		self.read().profile.clone()
	}

	/// Current shipping form values
	pub fn shipping(&self) -> ShippingDetails {
		self.read().shipping.clone()
	}

	pub fn payment(&self) -> Option<PaymentSummary> {
		self.read().payment.clone()
	}

	/// Price breakdown for the loaded cart
	pub fn pricing(&self) -> Option<Pricing> {
		self.read().cart.as_ref().map(|cart| pricing_for(cart.subtotal))
	}

	/// Cardholder name suggested from the shipping contact
	pub fn suggested_card_name(&self) -> String {
		let state = self.read();
		format!("{} {}", state.shipping.first_name, state.shipping.last_name)
			.trim()
			.to_string()
	}

	/// Validate the shipping form and move to the payment step
	pub fn submit_shipping(&self, form: ShippingDetails) -> Result<(), CheckoutError> {
		let shipping = trim_shipping(form);
		validate_shipping(&shipping)?;

		let mut state = self.write();
		state.shipping = shipping;
		state.step = CheckoutStep::Payment;
		Ok(())
	}

	/// Validate the payment form and move to the review step
	///
	/// `today` is the reference date for the expiry check.
	pub fn submit_payment(&self, form: PaymentForm, today: NaiveDate) -> Result<(), CheckoutError> {
		if self.step() < CheckoutStep::Payment {
			return Err(CheckoutError::Validation(
				"Please complete the shipping details first".to_string(),
			));
		}

		let card_name = form.card_name.trim();
		if card_name.is_empty() {
			return Err(CheckoutError::Validation(
				"Please enter the name on the card".to_string(),
			));
		}

		let card_number: String = form.card_number.split_whitespace().collect();
		if !card_number.chars().all(|c| c.is_ascii_digit())
			|| !(CARD_NUMBER_MIN_DIGITS..=CARD_NUMBER_MAX_DIGITS).contains(&card_number.len())
		{
			return Err(CheckoutError::Validation(
				"Please enter a valid card number".to_string(),
			));
		}

		let expiry = form.card_expiry.trim();
		if !validate_expiry(expiry, today) {
			return Err(CheckoutError::Validation(
				"Please enter a valid expiry date (MM/YY)".to_string(),
			));
		}

		let mut state = self.write();
		state.payment = Some(PaymentSummary {
			card_name: card_name.to_string(),
			card_last4: card_number[card_number.len() - 4..].to_string(),
			card_expiry: expiry.to_string(),
		});
		state.step = CheckoutStep::Review;
		Ok(())
	}

	/// Return to an earlier step; later steps keep their values
	pub fn back_to(&self, step: CheckoutStep) -> Result<(), CheckoutError> {
		let mut state = self.write();
		if step > state.step {
			return Err(CheckoutError::Validation(format!(
				"Cannot skip ahead to the {} step",
				step
			)));
		}
		state.step = step;
		Ok(())
	}

	/// Build the order request from the completed wizard
	pub fn order_request(&self) -> Result<CheckoutRequest, CheckoutError> {
		let state = self.read();
		if state.step != CheckoutStep::Review {
			return Err(CheckoutError::Validation(
				"Please complete the payment details first".to_string(),
			));
		}
		let cart = match &state.cart {
			Some(cart) if !cart.is_empty() => cart,
			_ => return Err(CheckoutError::EmptyCart),
		};
		let payment = state.payment.clone().ok_or_else(|| {
			CheckoutError::Validation("Please complete the payment details first".to_string())
		})?;

		Ok(CheckoutRequest {
			items: cart.items.iter().map(CheckoutItem::from).collect(),
			shipping: state.shipping.clone(),
			payment,
			pricing: pricing_for(cart.subtotal),
		})
	}

	/// Submit the order
	pub async fn place_order(&self, terms_accepted: bool) -> Result<CheckoutResponse, CheckoutError> {
		self.require_auth()?;
		if !terms_accepted {
			return Err(CheckoutError::Validation(
				"Please agree to the Terms & Conditions".to_string(),
			));
		}
		let request = self.order_request()?;
		let options = RequestOptions::new().with_body(serde_json::to_string(&request)?);

		let result = self
			.ctx
			.request::<CheckoutResponse>(HttpMethod::Post, "/checkout/auth", options, "Payment failed")
			.await;

		match result {
			Ok(response) => {
				info!(target: "checkout", "Order {} placed", response.order_id);
				self.ctx.success(format!("Order placed: {}", response.order_id));
				*self.write() = CheckoutState::default();
				Ok(response)
			}
			Err(e) => {
				let reason = match &e {
					RequestError::Status { message, action, .. } => {
						message.clone().unwrap_or_else(|| action.to_string())
					}
					RequestError::Gateway(err) => err.to_string(),
				};
				let error = CheckoutError::OrderFailed(reason);
				self.ctx.error(error.to_string());
				Err(error)
			}
		}
	}
}

/// Shipping, tax and total for `subtotal`
pub fn pricing_for(subtotal: f64) -> Pricing {
	let tax = subtotal * TAX_RATE;
	Pricing {
		subtotal,
		shipping: SHIPPING_COST,
		tax,
		total: subtotal + SHIPPING_COST + tax,
	}
}

/// Shipping form prefilled from a user profile
pub fn prefill_shipping(profile: &UserProfile) -> ShippingDetails {
	let mut shipping = ShippingDetails {
		first_name: profile.first_name.clone().unwrap_or_default(),
		last_name: profile.last_name.clone().unwrap_or_default(),
		email: profile.email.clone().unwrap_or_default(),
		phone: profile.phone.clone().unwrap_or_default(),
		..ShippingDetails::default()
	};

	match &profile.address {
		Some(ProfileAddress::Structured {
			street,
			city,
			state,
			zip,
		}) => {
			shipping.address = street.clone().unwrap_or_default();
			shipping.city = city.clone().unwrap_or_default();
			shipping.state = state.clone().unwrap_or_default();
			shipping.zip = zip.clone().unwrap_or_default();
		}
		Some(ProfileAddress::Line(line)) => shipping.address = line.clone(),
		None => {}
	}

	shipping
}

fn trim_shipping(form: ShippingDetails) -> ShippingDetails {
	ShippingDetails {
		first_name: form.first_name.trim().to_string(),
		last_name: form.last_name.trim().to_string(),
		email: form.email.trim().to_string(),
		phone: form.phone.trim().to_string(),
		address: form.address.trim().to_string(),
		city: form.city.trim().to_string(),
		state: form.state.trim().to_string(),
		zip: form.zip.trim().to_string(),
	}
}

fn validate_shipping(shipping: &ShippingDetails) -> Result<(), CheckoutError> {
	let required = [
		("first name", &shipping.first_name),
		("last name", &shipping.last_name),
		("email", &shipping.email),
		("phone", &shipping.phone),
		("address", &shipping.address),
		("city", &shipping.city),
		("state", &shipping.state),
		("ZIP code", &shipping.zip),
	];
	if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
		return Err(CheckoutError::Validation(format!("Please enter your {}", field)));
	}

	let valid_email = shipping
		.email
		.split_once('@')
		.is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
	if !valid_email {
		return Err(CheckoutError::Validation(
			"Please enter a valid email address".to_string(),
		));
	}
	Ok(())
}

/// `MM/YY` expiry strictly after the month containing `today`
pub fn validate_expiry(expiry: &str, today: NaiveDate) -> bool {
	let Some((month, year)) = expiry.split_once('/') else {
		return false;
	};
	if month.len() != 2
		|| year.len() != 2
		|| !month.chars().chain(year.chars()).all(|c| c.is_ascii_digit())
	{
		return false;
	}

	let (Ok(month), Ok(year)) = (month.parse::<u32>(), year.parse::<i32>()) else {
		return false;
	};
	if !(1..=12).contains(&month) {
		return false;
	}

	(2000 + year, month) > (today.year(), today.month())
}

/// Group digits in blocks of four, at most 19 characters
pub fn format_card_number(value: &str) -> String {
	let cleaned: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
	let grouped = cleaned
		.chunks(4)
		.map(|chunk| chunk.iter().collect::<String>())
		.collect::<Vec<_>>()
		.join(" ");
	grouped.chars().take(FORMATTED_CARD_MAX_CHARS).collect()
}

/// `MMYY` digits become `MM/YY`
pub fn format_expiry(value: &str) -> String {
	let cleaned = digits_only(value);
	if cleaned.len() >= 2 {
		let year: String = cleaned.chars().skip(2).take(2).collect();
		format!("{}/{}", &cleaned[..2], year)
	} else {
		cleaned
	}
}

pub fn digits_only(value: &str) -> String {
	value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(year: i32, month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(year, month, day).unwrap()
	}

	#[test]
	fn test_pricing() {
		let pricing = pricing_for(50.0);
		assert_eq!(pricing.shipping, 2.99);
		assert!((pricing.tax - 4.0).abs() < 1e-9);
		assert!((pricing.total - 56.99).abs() < 1e-9);
	}

	#[test]
	fn test_validate_expiry() {
		let today = date(2026, 10, 19);
		assert!(validate_expiry("11/26", today));
		assert!(validate_expiry("01/27", today));
		assert!(!validate_expiry("10/26", today));
		assert!(!validate_expiry("09/26", today));
		assert!(!validate_expiry("13/27", today));
		assert!(!validate_expiry("00/27", today));
		assert!(!validate_expiry("1/27", today));
		assert!(!validate_expiry("1127", today));
		assert!(!validate_expiry("ab/cd", today));
	}

	#[test]
	fn test_format_card_number() {
		assert_eq!(format_card_number("4111111111111111"), "4111 1111 1111 1111");
		assert_eq!(format_card_number("4111 11"), "4111 11");
		assert_eq!(format_card_number("41111111111111112222"), "4111 1111 1111 1111");
	}

	#[test]
	fn test_format_expiry() {
		assert_eq!(format_expiry("1"), "1");
		assert_eq!(format_expiry("12"), "12/");
		assert_eq!(format_expiry("1228"), "12/28");
		assert_eq!(format_expiry("12/289"), "12/28");
		assert_eq!(digits_only("12 a-3"), "123");
	}

	#[test]
	fn test_prefill_from_line_address() {
		let profile = UserProfile {
			first_name: Some("Ada".to_string()),
			email: Some("ada@example.com".to_string()),
			address: Some(ProfileAddress::Line("1 Main St".to_string())),
			..UserProfile::default()
		};
		let shipping = prefill_shipping(&profile);
		assert_eq!(shipping.first_name, "Ada");
		assert_eq!(shipping.address, "1 Main St");
		assert!(shipping.city.is_empty());
	}

	#[test]
	fn test_shipping_validation() {
		let mut form = ShippingDetails {
			first_name: " Ada ".to_string(),
			last_name: "Lovelace".to_string(),
			email: "ada@example.com".to_string(),
			phone: "555-0100".to_string(),
			address: "1 Main St".to_string(),
			city: "London".to_string(),
			state: "LDN".to_string(),
			zip: "".to_string(),
		};
		assert!(matches!(
			validate_shipping(&trim_shipping(form.clone())),
			Err(CheckoutError::Validation(msg)) if msg == "Please enter your ZIP code"
		));

		form.zip = "12345".to_string();
		form.email = "ada.example.com".to_string();
		assert!(validate_shipping(&trim_shipping(form.clone())).is_err());

		form.email = "ada@example.com".to_string();
		let trimmed = trim_shipping(form);
		assert!(validate_shipping(&trimmed).is_ok());
		assert_eq!(trimmed.first_name, "Ada");
	}
}
