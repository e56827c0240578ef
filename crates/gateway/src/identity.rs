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

//! Hosted-UI identity links
//!
//! Sign-in, sign-up and sign-out are redirects to the identity provider's
//! hosted UI. This module only builds those URLs and clears local session
//! state; token exchange and validation happen outside the storefront.
//!
//! # Query Parameters
//!
//! - Sign in / sign up: `client_id`, `response_type=code`,
//!   `scope=email openid profile`, `redirect_uri`
//! - Sign out: `client_id`, `logout_uri=<current origin>`
//!
//! Values are form-urlencoded (spaces become `+`).

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
	config::IdentityConfig,
	session::{SessionError, SessionStore},
};

/// OAuth response type requested from the hosted UI
pub const RESPONSE_TYPE: &str = "code";

/// OAuth scopes requested from the hosted UI
pub const SCOPES: &str = "email openid profile";

/// Error types for identity link construction
#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("Invalid identity provider domain {domain}: {source}")]
	InvalidDomain {
		domain: String,
		#[source]
		source: url::ParseError,
	},
	#[error("Session error: {0}")]
	Session(#[from] SessionError),
}

/// Hosted-UI link builder
#[derive(Debug, Clone)]
pub struct HostedUi {
	domain: String,
	client_id: String,
	redirect_uri: String,
}

impl HostedUi {
	pub fn new(
		domain: impl Into<String>,
		client_id: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			domain: domain.into().trim_end_matches('/').to_string(),
			client_id: client_id.into(),
			redirect_uri: redirect_uri.into(),
		}
	}

	pub fn from_config(config: &IdentityConfig) -> Self {
		Self::new(&config.domain, &config.client_id, &config.redirect_uri)
	}

	/// `{domain}/login?...`
	pub fn sign_in_url(&self) -> Result<Url, IdentityError> {
		self.authorize_url("login")
	}

	/// `{domain}/signup?...`
	pub fn sign_up_url(&self) -> Result<Url, IdentityError> {
		self.authorize_url("signup")
	}

	/// Clear all local session state and build the logout redirect
	///
	/// The session is cleared before the URL is built, so local state is gone
	/// even when the domain turns out to be invalid.
	pub fn sign_out(&self, store: &dyn SessionStore, origin: &str) -> Result<Url, IdentityError> {
		store.clear()?;
		info!(target: "identity", "Local session cleared");

		let mut url = self.endpoint("logout")?;
		url.query_pairs_mut()
			.append_pair("client_id", &self.client_id)
			.append_pair("logout_uri", origin);
		Ok(url)
	}

	fn authorize_url(&self, path: &str) -> Result<Url, IdentityError> {
		let mut url = self.endpoint(path)?;
		url.query_pairs_mut()
			.append_pair("client_id", &self.client_id)
			.append_pair("response_type", RESPONSE_TYPE)
			.append_pair("scope", SCOPES)
			.append_pair("redirect_uri", &self.redirect_uri);
		Ok(url)
	}

	fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
		let raw = format!("{}/{}", self.domain, path);
		Url::parse(&raw).map_err(|source| IdentityError::InvalidDomain {
			domain: self.domain.clone(),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::{ID_TOKEN_KEY, MemorySessionStore};

	fn hosted_ui() -> HostedUi {
		HostedUi::new(
			"https://shop.auth.eu-west-1.amazoncognito.com/",
			"client-123",
			"https://shop.example/auth/callback.html",
		)
	}

	#[test]
	fn test_sign_in_url() {
		let url = hosted_ui().sign_in_url().unwrap();
		assert_eq!(
			url.as_str(),
			"https://shop.auth.eu-west-1.amazoncognito.com/login?client_id=client-123&response_type=code&scope=email+openid+profile&redirect_uri=https%3A%2F%2Fshop.example%2Fauth%2Fcallback.html"
		);
	}

	#[test]
	fn test_sign_up_url_uses_signup_path() {
		let url = hosted_ui().sign_up_url().unwrap();
		assert_eq!(url.path(), "/signup");
		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
		assert!(pairs.contains(&("scope".to_string(), "email openid profile".to_string())));
	}

	#[test]
	fn test_sign_out_clears_session() {
		let store = MemorySessionStore::with_token("abc");
		store.set("cart_id", "guest-1".to_string()).unwrap();

		let url = hosted_ui()
			.sign_out(&store, "https://shop.example")
			.unwrap();

		assert!(store.get(ID_TOKEN_KEY).is_none());
		assert!(store.get("cart_id").is_none());
		assert_eq!(
			url.as_str(),
			"https://shop.auth.eu-west-1.amazoncognito.com/logout?client_id=client-123&logout_uri=https%3A%2F%2Fshop.example"
		);
	}

	#[test]
	fn test_invalid_domain() {
		let ui = HostedUi::new("YOUR_COGNITO_DOMAIN", "id", "uri");
		assert!(matches!(
			ui.sign_in_url(),
			Err(IdentityError::InvalidDomain { .. })
		));
	}
}
