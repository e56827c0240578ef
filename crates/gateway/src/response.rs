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

//! Normalized responses
//!
//! Both dispatch modes hand back an [`ApiResponse`], so callers can write
//! `if !response.ok() { .. } let data = response.json::<T>().await?;`
//! without knowing whether a fixture or the live backend served the call.

use async_trait::async_trait;
use reqwest::{StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::gateway::GatewayError;

/// Response accessor contract shared by fixture-backed and network-backed responses
///
/// Body accessors are repeatable: every call observes the same payload.
#[async_trait]
pub trait ResponseLike: Send {
	fn status(&self) -> StatusCode;

	/// Whether the status is in the 2xx range
	fn ok(&self) -> bool {
		self.status().is_success()
	}

	async fn text(&mut self) -> Result<String, GatewayError>;

	async fn json_value(&mut self) -> Result<Value, GatewayError>;
}

/// Response served from an already-parsed fixture
#[derive(Debug, Clone)]
pub struct FixtureResponse {
	payload: Value,
}

impl FixtureResponse {
	pub fn new(payload: Value) -> Self {
		Self { payload }
	}

	pub fn payload(&self) -> &Value {
		&self.payload
	}
}

#[async_trait]
impl ResponseLike for FixtureResponse {
	fn status(&self) -> StatusCode {
		StatusCode::OK
	}

	async fn text(&mut self) -> Result<String, GatewayError> {
		Ok(serde_json::to_string(&self.payload)?)
	}

	async fn json_value(&mut self) -> Result<Value, GatewayError> {
		Ok(self.payload.clone())
	}
}

/// Response from the live backend, passed through unmodified
///
/// The body is read from the wire on first access and kept for later calls.
#[derive(Debug)]
pub struct NetworkResponse {
	status: StatusCode,
	headers: HeaderMap,
	inner: Option<reqwest::Response>,
	body: Option<String>,
}

impl NetworkResponse {
	pub fn new(response: reqwest::Response) -> Self {
		Self {
			status: response.status(),
			headers: response.headers().clone(),
			inner: Some(response),
			body: None,
		}
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	async fn body(&mut self) -> Result<&str, GatewayError> {
		if let Some(response) = self.inner.take() {
			self.body = Some(response.text().await?);
		}
		Ok(self.body.as_deref().unwrap_or_default())
	}
}

#[async_trait]
impl ResponseLike for NetworkResponse {
	fn status(&self) -> StatusCode {
		self.status
	}

	async fn text(&mut self) -> Result<String, GatewayError> {
		Ok(self.body().await?.to_string())
	}

	async fn json_value(&mut self) -> Result<Value, GatewayError> {
		let body = self.body().await?;
		Ok(serde_json::from_str(body)?)
	}
}

/// Response returned by [`ApiGateway::send`](crate::gateway::ApiGateway::send)
#[derive(Debug)]
pub enum ApiResponse {
	Fixture(FixtureResponse),
	Network(NetworkResponse),
}

impl ApiResponse {
	/// Deserialize the body into `T`
	pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, GatewayError> {
		let value = self.json_value().await?;
		Ok(serde_json::from_value(value)?)
	}

	pub fn is_fixture(&self) -> bool {
		matches!(self, ApiResponse::Fixture(_))
	}
}

#[async_trait]
impl ResponseLike for ApiResponse {
	fn status(&self) -> StatusCode {
		match self {
			ApiResponse::Fixture(response) => response.status(),
			ApiResponse::Network(response) => response.status(),
		}
	}

	async fn text(&mut self) -> Result<String, GatewayError> {
		match self {
			ApiResponse::Fixture(response) => response.text().await,
			ApiResponse::Network(response) => response.text().await,
		}
	}

	async fn json_value(&mut self) -> Result<Value, GatewayError> {
		match self {
			ApiResponse::Fixture(response) => response.json_value().await,
			ApiResponse::Network(response) => response.json_value().await,
		}
	}
}

impl From<FixtureResponse> for ApiResponse {
	fn from(response: FixtureResponse) -> Self {
		ApiResponse::Fixture(response)
	}
}

impl From<NetworkResponse> for ApiResponse {
	fn from(response: NetworkResponse) -> Self {
		ApiResponse::Network(response)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn test_fixture_response_shape() {
		let response = ApiResponse::from(FixtureResponse::new(json!({ "cart": { "itemCount": 2 } })));

		assert!(response.ok());
		assert_eq!(response.status(), StatusCode::OK);
		assert!(response.is_fixture());
	}

	#[tokio::test]
	async fn test_fixture_accessors_are_repeatable() {
		let payload = json!({ "orders": [ { "orderId": "A-1" } ] });
		let mut response = ApiResponse::from(FixtureResponse::new(payload.clone()));

		let first = response.json_value().await.unwrap();
		let second = response.json_value().await.unwrap();
		assert_eq!(first, payload);
		assert_eq!(second, payload);

		let text = response.text().await.unwrap();
		assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), payload);
	}

	#[tokio::test]
	async fn test_typed_json() {
		#[derive(serde::Deserialize)]
		struct Envelope {
			orders: Vec<Value>,
		}

		let mut response = ApiResponse::from(FixtureResponse::new(json!({ "orders": [1, 2, 3] })));
		let envelope: Envelope = response.json().await.unwrap();
		assert_eq!(envelope.orders.len(), 3);
	}
}
