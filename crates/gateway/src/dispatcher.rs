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

//! Dispatch strategies
//!
//! [`MockDispatcher`] answers from static fixtures, [`HttpDispatcher`] talks to
//! the live backend. Exactly one of them backs an
//! [`ApiGateway`](crate::gateway::ApiGateway), chosen once from
//! [`ApiConfig::use_mock`].

use std::{
	fmt,
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};

use async_trait::async_trait;
use reqwest::{
	Client as ReqwestClient,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
	config::ApiConfig,
	gateway::{GatewayError, RequestOptions},
	response::{ApiResponse, FixtureResponse, NetworkResponse},
	router::{FixtureId, HttpMethod, RouteTable},
	session::SessionStore,
};

/// Which backend serves gateway calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
	Mock,
	Real,
}

impl fmt::Display for DispatchMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DispatchMode::Mock => f.write_str("MOCK"),
			DispatchMode::Real => f.write_str("REAL"),
		}
	}
}

/// Dispatch strategy behind the gateway
#[async_trait]
pub trait Dispatcher: Send + Sync {
	fn mode(&self) -> DispatchMode;

	async fn dispatch(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<ApiResponse, GatewayError>;
}

/// Where fixture documents are read from
#[derive(Debug, Clone)]
pub enum FixtureSource {
	/// Fixture files in a local directory
	Directory(PathBuf),
	/// Fixture files served over HTTP under a base URL
	Remote { base: String, client: ReqwestClient },
}

impl FixtureSource {
	/// `http(s)://` bases are fetched over the network, anything else is a directory
	pub fn from_base(base: &str) -> Self {
		if base.starts_with("http://") || base.starts_with("https://") {
			FixtureSource::Remote {
				base: base.trim_end_matches('/').to_string(),
				client: ReqwestClient::new(),
			}
		} else {
			FixtureSource::Directory(PathBuf::from(base))
		}
	}

	/// Load and parse a fixture
	///
	/// A fixture that cannot be served (missing file, non-2xx status) yields
	/// [`GatewayError::MockFixture`] with the status code.
	pub async fn load(&self, fixture: &FixtureId) -> Result<Value, GatewayError> {
		let bytes = match self {
			FixtureSource::Directory(dir) => read_fixture_file(dir, fixture).await?,
			FixtureSource::Remote { base, client } => {
				let url = format!("{}/{}", base, fixture);
				let response = client.get(&url).send().await?;
				let status = response.status();
				if !status.is_success() {
					return Err(GatewayError::MockFixture {
						fixture: fixture.to_string(),
						status: status.as_u16(),
					});
				}
				response.bytes().await?.to_vec()
			}
		};

		Ok(serde_json::from_slice(&bytes)?)
	}
}

async fn read_fixture_file(dir: &Path, fixture: &FixtureId) -> Result<Vec<u8>, GatewayError> {
	let path = dir.join(fixture.as_str());
	match tokio::fs::read(&path).await {
		Ok(bytes) => Ok(bytes),
		Err(e) => {
			let status = match e.kind() {
				std::io::ErrorKind::NotFound => 404,
				std::io::ErrorKind::PermissionDenied => 403,
				_ => {
					return Err(GatewayError::Io {
						fixture: path.display().to_string(),
						source: e,
					});
				}
			};
			Err(GatewayError::MockFixture {
				fixture: path.display().to_string(),
				status,
			})
		}
	}
}

/// Serves calls from static fixtures
pub struct MockDispatcher {
	routes: Arc<RouteTable>,
	source: FixtureSource,
	latency: Duration,
}

impl MockDispatcher {
	pub fn new(routes: Arc<RouteTable>, source: FixtureSource, latency: Duration) -> Self {
		Self {
			routes,
			source,
			latency,
		}
	}

	pub fn from_config(config: &ApiConfig, routes: Arc<RouteTable>) -> Self {
		Self::new(
			routes,
			FixtureSource::from_base(&config.mock_base),
			config.mock_latency(),
		)
	}
}

#[async_trait]
impl Dispatcher for MockDispatcher {
	fn mode(&self) -> DispatchMode {
		DispatchMode::Mock
	}

	async fn dispatch(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<ApiResponse, GatewayError> {
		// Resolve before sleeping: a missing route fails without any I/O
		let fixture = self.routes.resolve(method, endpoint)?;

		if options.body.is_some() {
			debug!(target: "gateway::mock", "Ignoring request body for {} {}", method, endpoint);
		}

		if !self.latency.is_zero() {
			tokio::time::sleep(self.latency).await;
		}

		let payload = self.source.load(fixture).await?;
		Ok(FixtureResponse::new(payload).into())
	}
}

/// Sends calls to the live backend
pub struct HttpDispatcher {
	real_base: String,
	client: ReqwestClient,
	session: Arc<dyn SessionStore>,
}

impl HttpDispatcher {
	/// Create a dispatcher with a cookie-keeping client
	///
	/// Session cookies set by the backend are replayed on later calls, the
	/// equivalent of `credentials: "include"`.
	pub fn new(
		real_base: impl Into<String>,
		session: Arc<dyn SessionStore>,
	) -> Result<Self, GatewayError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self {
			real_base: real_base.into(),
			client,
			session,
		})
	}

	pub fn from_config(
		config: &ApiConfig,
		session: Arc<dyn SessionStore>,
	) -> Result<Self, GatewayError> {
		Self::new(&config.real_base, session)
	}

	/// Target URL: the real base with the endpoint appended verbatim
	pub fn target_url(&self, endpoint: &str) -> Result<Url, GatewayError> {
		let raw = format!("{}{}", self.real_base, endpoint);
		Url::parse(&raw).map_err(|source| GatewayError::InvalidUrl { url: raw, source })
	}

	/// Default headers, then the bearer token, then caller headers
	///
	/// Later entries replace earlier ones with the same name, so a caller's
	/// `Content-Type` or `Authorization` wins over the defaults.
	fn request_headers(&self, extra: Vec<(String, String)>) -> Result<HeaderMap, GatewayError> {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		if let Some(token) = self.session.id_token() {
			let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
				GatewayError::InvalidHeader {
					name: AUTHORIZATION.to_string(),
				}
			})?;
			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		for (name, value) in extra {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| GatewayError::InvalidHeader { name: name.clone() })?;
			let header_value = HeaderValue::from_str(&value)
				.map_err(|_| GatewayError::InvalidHeader { name: name.clone() })?;
			headers.insert(header_name, header_value);
		}

		Ok(headers)
	}
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
	fn mode(&self) -> DispatchMode {
		DispatchMode::Real
	}

	async fn dispatch(
		&self,
		method: HttpMethod,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<ApiResponse, GatewayError> {
		let url = self.target_url(endpoint)?;

		let headers = self.request_headers(options.headers)?;
		let mut request = self.client.request(method.into(), url).headers(headers);

		if let Some(body) = options.body {
			request = request.body(body);
		}

		let response = request.send().await?;
		Ok(NetworkResponse::new(response).into())
	}
}
