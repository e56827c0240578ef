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

//! End-to-end gateway tests against fixture directories and a local HTTP mock

use std::{path::PathBuf, sync::Arc};

use httpmock::prelude::*;
use serde_json::json;
use storefront_gateway::{
	ApiConfig, ApiGateway, GatewayError, HttpMethod, MemorySessionStore, RequestOptions,
	ResponseLike, RouteTable, SessionStore,
};
use storefront_sdk::{CartEnvelope, OrdersEnvelope, ProductCatalog, UserProfileEnvelope};

fn mock_gateway(mock_base: String) -> ApiGateway {
	let config = ApiConfig {
		use_mock: true,
		mock_base,
		mock_latency_ms: 0,
		..ApiConfig::default()
	};
	ApiGateway::new(
		&config,
		Arc::new(RouteTable::storefront()),
		Arc::new(MemorySessionStore::new()),
	)
	.unwrap()
}

fn real_gateway(real_base: String, session: Arc<dyn SessionStore>) -> ApiGateway {
	let config = ApiConfig {
		use_mock: false,
		real_base,
		..ApiConfig::default()
	};
	ApiGateway::new(&config, Arc::new(RouteTable::storefront()), session).unwrap()
}

fn bundled_fixtures() -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../mock")
}

#[tokio::test]
async fn test_mock_and_real_responses_look_the_same() {
	let payload = json!({ "cart": { "items": [], "itemCount": 0, "subtotal": 0 } });

	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("cart.json"), payload.to_string()).unwrap();
	let mock = mock_gateway(dir.path().to_string_lossy().to_string());

	let server = MockServer::start_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cart");
			then.status(200).json_body(payload.clone());
		})
		.await;
	let real = real_gateway(
		server.url("/api"),
		Arc::new(MemorySessionStore::new()),
	);

	let mut from_mock = mock.get("/cart").await.unwrap();
	let mut from_real = real.get("/cart").await.unwrap();

	assert!(from_mock.is_fixture());
	assert!(!from_real.is_fixture());
	assert_eq!(from_mock.ok(), from_real.ok());
	assert_eq!(from_mock.status(), from_real.status());
	assert_eq!(
		from_mock.json_value().await.unwrap(),
		from_real.json_value().await.unwrap()
	);

	// Accessors are repeatable on both
	let mock_cart: CartEnvelope = from_mock.json().await.unwrap();
	let real_cart: CartEnvelope = from_real.json().await.unwrap();
	assert_eq!(mock_cart.cart, real_cart.cart);
	assert_eq!(from_real.text().await.unwrap(), from_real.text().await.unwrap());
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
	let server = MockServer::start_async().await;
	let orders = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/orders/auth")
				.header("authorization", "Bearer abc")
				.header("content-type", "application/json");
			then.status(200).json_body(json!({ "orders": [] }));
		})
		.await;

	let gateway = real_gateway(
		server.url("/api"),
		Arc::new(MemorySessionStore::with_token("abc")),
	);
	let mut response = gateway.get("/orders/auth").await.unwrap();

	orders.assert_async().await;
	let envelope: OrdersEnvelope = response.json().await.unwrap();
	assert!(envelope.orders.is_empty());
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
	let server = MockServer::start_async().await;
	let cart = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/cart")
				.header_missing("authorization");
			then.status(200).json_body(json!({ "cart": null }));
		})
		.await;

	let gateway = real_gateway(server.url("/api"), Arc::new(MemorySessionStore::new()));
	let response = gateway.get("/cart").await.unwrap();

	cart.assert_async().await;
	assert!(response.ok());
}

#[tokio::test]
async fn test_real_mode_passes_error_status_through() {
	let server = MockServer::start_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/checkout/auth");
			then.status(402)
				.json_body(json!({ "message": "Card declined" }));
		})
		.await;

	let gateway = real_gateway(
		server.url("/api"),
		Arc::new(MemorySessionStore::with_token("abc")),
	);
	let mut response = gateway
		.post("/checkout/auth", &json!({ "items": [] }))
		.await
		.unwrap();

	assert!(!response.ok());
	assert_eq!(response.status().as_u16(), 402);
	assert_eq!(
		response.json_value().await.unwrap(),
		json!({ "message": "Card declined" })
	);
}

#[tokio::test]
async fn test_request_body_and_headers_are_forwarded() {
	let server = MockServer::start_async().await;
	let add = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/cart/items/7")
				.header("x-cart-id", "guest-1")
				.json_body(json!({ "productId": "7", "weightGrams": 250 }));
			then.status(200).json_body(json!({ "cart": null }));
		})
		.await;

	let gateway = real_gateway(server.url("/api"), Arc::new(MemorySessionStore::new()));
	let options = RequestOptions::json(&json!({ "productId": "7", "weightGrams": 250 }))
		.unwrap()
		.header("X-Cart-Id", "guest-1");
	gateway
		.send(HttpMethod::Post, "/cart/items/7", options)
		.await
		.unwrap();

	add.assert_async().await;
}

#[tokio::test]
async fn test_caller_content_type_overrides_default() {
	let server = MockServer::start_async().await;
	let form = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/cart/items/7")
				.header("content-type", "application/x-www-form-urlencoded")
				.header_not("content-type", "application/json");
			then.status(200).json_body(json!({ "cart": null }));
		})
		.await;

	let gateway = real_gateway(server.url("/api"), Arc::new(MemorySessionStore::new()));
	let options = RequestOptions::new()
		.with_body("weightGrams=250")
		.header("Content-Type", "application/x-www-form-urlencoded");
	let response = gateway
		.send(HttpMethod::Post, "/cart/items/7", options)
		.await
		.unwrap();

	form.assert_async().await;
	assert!(response.ok());
}

#[tokio::test]
async fn test_caller_authorization_overrides_bearer() {
	let server = MockServer::start_async().await;
	let orders = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/orders/auth")
				.header("authorization", "Bearer override")
				.header_not("authorization", "Bearer abc");
			then.status(200).json_body(json!({ "orders": [] }));
		})
		.await;

	let gateway = real_gateway(
		server.url("/api"),
		Arc::new(MemorySessionStore::with_token("abc")),
	);
	let options = RequestOptions::new().header("Authorization", "Bearer override");
	gateway
		.send(HttpMethod::Get, "/orders/auth", options)
		.await
		.unwrap();

	orders.assert_async().await;
}

#[tokio::test]
async fn test_mock_delete_item_uses_delete_fixture() {
	let gateway = mock_gateway(bundled_fixtures().to_string_lossy().to_string());

	let mut response = gateway.delete("/cart/items/7").await.unwrap();
	let envelope: CartEnvelope = response.json().await.unwrap();
	let expected: CartEnvelope = serde_json::from_str(
		&std::fs::read_to_string(bundled_fixtures().join("cart-delete.json")).unwrap(),
	)
	.unwrap();
	assert_eq!(envelope.cart, expected.cart);
}

#[tokio::test]
async fn test_bundled_fixtures_decode() {
	let gateway = mock_gateway(bundled_fixtures().to_string_lossy().to_string());

	let products: ProductCatalog = gateway.get("/products").await.unwrap().json().await.unwrap();
	assert!(products.values().any(|stock| stock.quantity == 0));

	let orders: OrdersEnvelope = gateway
		.get("/orders/auth")
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	assert!(!orders.orders.is_empty());

	let profile: UserProfileEnvelope = gateway
		.get("/user/profile/auth")
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	assert!(profile.user.is_some());

	for (method, endpoint) in [
		(HttpMethod::Get, "/cart/auth"),
		(HttpMethod::Post, "/cart/items/kenya-nyeri/auth"),
		(HttpMethod::Put, "/cart/items/kenya-nyeri"),
		(HttpMethod::Delete, "/cart/auth"),
		(HttpMethod::Post, "/checkout/auth"),
	] {
		let response = gateway
			.send(method, endpoint, RequestOptions::default())
			.await
			.unwrap();
		assert!(response.ok(), "{} {}", method, endpoint);
	}
}

#[tokio::test]
async fn test_fixtures_served_over_http() {
	let server = MockServer::start_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/mock/products.json");
			then.status(200)
				.json_body(json!({ "p1": { "quantity": 0 } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/mock/orders.json");
			then.status(500);
		})
		.await;

	let gateway = mock_gateway(server.url("/mock"));

	let mut products = gateway.get("/products?ts=1").await.unwrap();
	assert_eq!(
		products.json_value().await.unwrap(),
		json!({ "p1": { "quantity": 0 } })
	);

	match gateway.get("/orders/auth").await {
		Err(GatewayError::MockFixture { status, .. }) => assert_eq!(status, 500),
		other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
	}
}

#[tokio::test]
async fn test_unrouted_mock_call_fails() {
	let gateway = mock_gateway(bundled_fixtures().to_string_lossy().to_string());

	let err = gateway
		.send(HttpMethod::Patch, "/cart/items/7", RequestOptions::default())
		.await
		.unwrap_err();
	assert!(err.is_no_route());
}
