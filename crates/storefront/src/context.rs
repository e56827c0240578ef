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

//! Shared state for page managers
//!
//! Every manager holds the same [`StoreContext`]: one gateway, one session
//! store, one notification sink and the configuration they were built from.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use storefront_gateway::{
	ApiGateway, GatewayError, HostedUi, HttpMethod, RequestOptions, ResponseLike, RouteTable,
	SessionHint, SessionStore, StorefrontConfig,
};
use storefront_sdk::ApiErrorBody;
use thiserror::Error;

use crate::notify::{Notification, NotificationLevel, Notifier};

/// Failure of a single API call made on behalf of a user action
#[derive(Debug, Error)]
pub enum RequestError {
	#[error(transparent)]
	Gateway(#[from] GatewayError),
	#[error("{action} (status {status})")]
	Status {
		action: &'static str,
		status: u16,
		/// `message` field of the error body, when the backend sent one
		message: Option<String>,
	},
}

impl RequestError {
	/// Backend-provided error message, if any
	pub fn server_message(&self) -> Option<&str> {
		match self {
			RequestError::Status { message, .. } => message.as_deref(),
			RequestError::Gateway(_) => None,
		}
	}
}

pub struct StoreContext {
	config: StorefrontConfig,
	gateway: Arc<ApiGateway>,
	session: Arc<dyn SessionStore>,
	notifier: Arc<dyn Notifier>,
}

impl StoreContext {
	pub fn new(
		config: StorefrontConfig,
		gateway: Arc<ApiGateway>,
		session: Arc<dyn SessionStore>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self {
			config,
			gateway,
			session,
			notifier,
		}
	}

	/// Build the gateway for `config` with the default storefront route table
	pub fn from_config(
		config: StorefrontConfig,
		session: Arc<dyn SessionStore>,
		notifier: Arc<dyn Notifier>,
	) -> Result<Self, GatewayError> {
		let routes = Arc::new(RouteTable::storefront());
		let gateway = ApiGateway::new(&config.api, routes, session.clone())?;
		Ok(Self::new(config, Arc::new(gateway), session, notifier))
	}

	pub fn config(&self) -> &StorefrontConfig {
		&self.config
	}

	pub fn gateway(&self) -> &ApiGateway {
		&self.gateway
	}

	pub fn session(&self) -> &dyn SessionStore {
		self.session.as_ref()
	}

	/// Current session hint, re-read from the store on every call
	pub fn hint(&self) -> SessionHint {
		SessionHint::from_store(self.session.as_ref(), self.config.api.dev_mock_auth)
	}

	pub fn hosted_ui(&self) -> HostedUi {
		HostedUi::from_config(&self.config.identity)
	}

	/// Sign-in link shown when a page needs a session
	pub fn sign_in_link(&self) -> Option<String> {
		self.hosted_ui()
			.sign_in_url()
			.ok()
			.map(|url| url.to_string())
	}

	pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
		self.notifier
			.notify(Notification::new(level, message, self.gateway.is_mock()));
	}

	pub fn success(&self, message: impl Into<String>) {
		self.notify(NotificationLevel::Success, message);
	}

	pub fn warning(&self, message: impl Into<String>) {
		self.notify(NotificationLevel::Warning, message);
	}

	pub fn error(&self, message: impl Into<String>) {
		self.notify(NotificationLevel::Error, message);
	}

	/// Send a request and decode a successful body into `T`
	///
	/// A non-2xx status becomes [`RequestError::Status`] labelled with `action`.
	pub async fn request<T: DeserializeOwned>(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
		action: &'static str,
	) -> Result<T, RequestError> {
		let mut response = self.gateway.send(method, endpoint, options).await?;

		if !response.ok() {
			let message = response
				.json::<ApiErrorBody>()
				.await
				.ok()
				.and_then(|body| body.message);
			return Err(RequestError::Status {
				action,
				status: response.status().as_u16(),
				message,
			});
		}

		Ok(response.json::<T>().await?)
	}
}
