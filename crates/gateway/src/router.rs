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

//! Mock route table
//!
//! Maps a logical endpoint (HTTP method + path) to the static JSON fixture
//! that stands in for the backend response in mock mode.
//!
//! # Matching
//!
//! Resolution runs two ordered passes over the table:
//!
//! 1. **Exact pass**: routes without a wildcard segment, compared against the
//!    whole path string.
//! 2. **Wildcard pass**: routes with at least one `:name` segment, compared
//!    segment by segment. Wildcard segments accept any token, including the
//!    empty tokens produced by a trailing slash.
//!
//! An exact route always wins over a wildcard route that would also match,
//! whatever their order in the table. Inside a pass, table order breaks ties.
//! Query strings never take part in matching.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Marker that opens a wildcard segment (`/cart/items/:id`)
pub const PARAM_MARKER: char = ':';

/// Error types for routing operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
	#[error("No mock route for {method} {path}")]
	NoRoute { method: HttpMethod, path: String },
	#[error("Unsupported HTTP method: {0}")]
	UnsupportedMethod(String),
}

/// HTTP verbs understood by the storefront API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	Get,
	Post,
	Put,
	Delete,
	Patch,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
			HttpMethod::Patch => "PATCH",
		}
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HttpMethod {
	type Err = RouteError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"GET" => Ok(HttpMethod::Get),
			"POST" => Ok(HttpMethod::Post),
			"PUT" => Ok(HttpMethod::Put),
			"DELETE" => Ok(HttpMethod::Delete),
			"PATCH" => Ok(HttpMethod::Patch),
			other => Err(RouteError::UnsupportedMethod(other.to_string())),
		}
	}
}

impl From<HttpMethod> for reqwest::Method {
	fn from(method: HttpMethod) -> Self {
		match method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Delete => reqwest::Method::DELETE,
			HttpMethod::Patch => reqwest::Method::PATCH,
		}
	}
}

/// Opaque handle to a static JSON document (a file name under the mock base)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureId(String);

impl FixtureId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for FixtureId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl PartialEq<&str> for FixtureId {
	fn eq(&self, other: &&str) -> bool {
		self.0 == *other
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

/// Immutable route entry
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
	method: HttpMethod,
	pattern: String,
	segments: Vec<Segment>,
	fixture: FixtureId,
}

impl RouteDescriptor {
	pub fn new(method: HttpMethod, pattern: impl Into<String>, fixture: impl Into<String>) -> Self {
		let pattern = pattern.into();
		let segments = pattern
			.split('/')
			.map(|part| match part.strip_prefix(PARAM_MARKER) {
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(part.to_string()),
			})
			.collect();

		Self {
			method,
			pattern,
			segments,
			fixture: FixtureId::new(fixture),
		}
	}

	pub fn method(&self) -> HttpMethod {
		self.method
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn fixture(&self) -> &FixtureId {
		&self.fixture
	}

	/// Whether the pattern contains at least one `:name` segment
	pub fn has_wildcard(&self) -> bool {
		self.segments
			.iter()
			.any(|segment| matches!(segment, Segment::Param(_)))
	}

	/// Names of the wildcard segments, in order
	pub fn params(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| match segment {
			Segment::Param(name) => Some(name.as_str()),
			Segment::Literal(_) => None,
		})
	}

	fn matches_exact(&self, method: HttpMethod, path: &str) -> bool {
		self.method == method && !self.has_wildcard() && self.pattern == path
	}

	fn matches_wildcard(&self, method: HttpMethod, path: &str) -> bool {
		if self.method != method || !self.has_wildcard() {
			return false;
		}

		let parts: Vec<&str> = path.split('/').collect();
		if parts.len() != self.segments.len() {
			return false;
		}

		self.segments
			.iter()
			.zip(parts)
			.all(|(segment, part)| match segment {
				Segment::Param(_) => true,
				Segment::Literal(literal) => literal == part,
			})
	}
}

/// Drop everything from the first `?` onward
pub fn strip_query(endpoint: &str) -> &str {
	match endpoint.split_once('?') {
		Some((path, _)) => path,
		None => endpoint,
	}
}

/// Ordered, read-only collection of mock routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	routes: Vec<RouteDescriptor>,
}

impl RouteTable {
	/// Create a table from routes in priority order
	pub fn new(routes: Vec<RouteDescriptor>) -> Self {
		tracing::debug!(target: "gateway::router", "Route table built with {} routes", routes.len());
		Self { routes }
	}

	/// Routes served by the storefront fixtures in `mock/`
	pub fn storefront() -> Self {
		use HttpMethod::*;

		Self::new(vec![
			RouteDescriptor::new(Get, "/cart", "cart.json"),
			RouteDescriptor::new(Get, "/cart/auth", "cart.json"),
			RouteDescriptor::new(Post, "/cart/items/:id", "cart-add.json"),
			RouteDescriptor::new(Post, "/cart/items/:id/auth", "cart-add.json"),
			RouteDescriptor::new(Put, "/cart/items/:id", "cart-update.json"),
			RouteDescriptor::new(Put, "/cart/items/:id/auth", "cart-update.json"),
			RouteDescriptor::new(Delete, "/cart/items/:id", "cart-delete.json"),
			RouteDescriptor::new(Delete, "/cart/items/:id/auth", "cart-delete.json"),
			RouteDescriptor::new(Delete, "/cart", "cart-clear.json"),
			RouteDescriptor::new(Delete, "/cart/auth", "cart-clear.json"),
			RouteDescriptor::new(Get, "/products", "products.json"),
			RouteDescriptor::new(Post, "/checkout/auth", "checkout-success.json"),
			RouteDescriptor::new(Get, "/user/profile/auth", "user-profile.json"),
			RouteDescriptor::new(Get, "/orders/auth", "orders.json"),
		])
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
		self.routes.iter()
	}

	/// Resolve a logical endpoint to its fixture
	///
	/// Pure function of the table and the input: no I/O is performed, and a
	/// miss is always reported as [`RouteError::NoRoute`].
	pub fn resolve(&self, method: HttpMethod, endpoint: &str) -> Result<&FixtureId, RouteError> {
		let path = strip_query(endpoint);

		let exact = self
			.routes
			.iter()
			.find(|route| route.matches_exact(method, path));

		let route = match exact {
			Some(route) => route,
			None => self
				.routes
				.iter()
				.find(|route| route.matches_wildcard(method, path))
				.ok_or_else(|| RouteError::NoRoute {
					method,
					path: path.to_string(),
				})?,
		};

		tracing::trace!(
			target: "gateway::router",
			"{} {} -> {} (pattern {})",
			method,
			path,
			route.fixture,
			route.pattern
		);

		Ok(&route.fixture)
	}
}

impl FromIterator<RouteDescriptor> for RouteTable {
	fn from_iter<I: IntoIterator<Item = RouteDescriptor>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}
