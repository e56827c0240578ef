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

//! API gateway
//!
//! Single entry point used by every page manager to reach the storefront API.
//!
//! # Modes
//!
//! - **Mock** (`use_mock = true`): the endpoint is resolved against the route
//!   table, a fixed latency is simulated, and the fixture is wrapped in a
//!   response that looks like a normal network response (`ok`, status 200).
//! - **Real** (`use_mock = false`): the endpoint is appended to the real API
//!   base and sent with session cookies and, when the session store holds an
//!   identity token, `Authorization: Bearer <token>`. The backend response is
//!   returned unmodified, including non-2xx statuses.
//!
//! Callers never branch on the mode. Errors are never swallowed, retried or
//! cached: every failure propagates to the action that triggered the call.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, warn};
use uuid::Uuid;

use crate::{
	config::ApiConfig,
	dispatcher::{DispatchMode, Dispatcher, HttpDispatcher, MockDispatcher},
	response::{ApiResponse, ResponseLike},
	router::{HttpMethod, RouteError, RouteTable},
	session::SessionStore,
};

/// Error types for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("Routing error: {0}")]
	Route(#[from] RouteError),
	#[error("Mock API error: fixture {fixture} returned status {status}")]
	MockFixture { fixture: String, status: u16 },
	#[error("Network error: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("Invalid JSON: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("Failed to read fixture {fixture}: {source}")]
	Io {
		fixture: String,
		#[source]
		source: std::io::Error,
	},
	#[error("Invalid header {name}")]
	InvalidHeader { name: String },
	#[error("Invalid URL {url}: {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},
}

impl GatewayError {
	/// Whether the error comes from a missing mock route (always a configuration bug)
	pub fn is_no_route(&self) -> bool {
		matches!(self, GatewayError::Route(RouteError::NoRoute { .. }))
	}
}

/// Per-call request options
///
/// Credentials and base URLs are never part of the options; the gateway
/// injects them from its configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
	pub body: Option<String>,
	pub headers: Vec<(String, String)>,
}

impl RequestOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Options carrying `body` serialized as JSON
	pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, GatewayError> {
		Ok(Self {
			body: Some(serde_json::to_string(body)?),
			headers: Vec::new(),
		})
	}

	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}
}

/// Dual-mode API gateway
pub struct ApiGateway {
	dispatcher: Box<dyn Dispatcher>,
}

impl ApiGateway {
	/// Build the gateway for the configured mode
	pub fn new(
		config: &ApiConfig,
		routes: Arc<RouteTable>,
		session: Arc<dyn SessionStore>,
	) -> Result<Self, GatewayError> {
		let dispatcher: Box<dyn Dispatcher> = if config.use_mock {
			Box::new(MockDispatcher::from_config(config, routes))
		} else {
			Box::new(HttpDispatcher::from_config(config, session)?)
		};

		tracing::info!(
			target: "gateway",
			"API gateway initialized in {} mode",
			dispatcher.mode()
		);

		Ok(Self { dispatcher })
	}

	/// Build the gateway around a custom dispatch strategy
	pub fn with_dispatcher(dispatcher: Box<dyn Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub fn mode(&self) -> DispatchMode {
		self.dispatcher.mode()
	}

	pub fn is_mock(&self) -> bool {
		self.mode() == DispatchMode::Mock
	}

	/// Send a logical request
	pub async fn send(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<ApiResponse, GatewayError> {
		let request_id = Uuid::new_v4().to_string();
		let mode = self.dispatcher.mode();
		let span = tracing::debug_span!(
			"api_request",
			request_id = %request_id,
			method = %method,
			endpoint = %endpoint,
			mode = %mode
		);

		async move {
			let started = std::time::Instant::now();
			match self.dispatcher.dispatch(method, endpoint, options).await {
				Ok(response) => {
					debug!(
						target: "gateway",
						status = response.status().as_u16(),
						duration_ms = started.elapsed().as_millis() as u64,
						"Request completed"
					);
					Ok(response)
				}
				Err(e) => {
					warn!(
						target: "gateway",
						error = %e,
						duration_ms = started.elapsed().as_millis() as u64,
						"Request failed"
					);
					Err(e)
				}
			}
		}
		.instrument(span)
		.await
	}

	pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, GatewayError> {
		self.send(HttpMethod::Get, endpoint, RequestOptions::default())
			.await
	}

	pub async fn post<T: Serialize + ?Sized>(
		&self,
		endpoint: &str,
		body: &T,
	) -> Result<ApiResponse, GatewayError> {
		self.send(HttpMethod::Post, endpoint, RequestOptions::json(body)?)
			.await
	}

	pub async fn put<T: Serialize + ?Sized>(
		&self,
		endpoint: &str,
		body: &T,
	) -> Result<ApiResponse, GatewayError> {
		self.send(HttpMethod::Put, endpoint, RequestOptions::json(body)?)
			.await
	}

	pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, GatewayError> {
		self.send(HttpMethod::Delete, endpoint, RequestOptions::default())
			.await
	}
}
