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

//! Storefront configuration
//!
//! The configuration is built once at process start and handed to the
//! gateway and the page managers; nothing reads ambient global state.
//!
//! # Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults (mock mode, placeholder identity settings)
//! 2. Optional configuration file (`StorefrontConfig::from_file`)
//! 3. Environment variables with the `STOREFRONT` prefix and `__` as the
//!    section separator, e.g. `STOREFRONT_API__USE_MOCK=false` or
//!    `STOREFRONT_IDENTITY__CLIENT_ID=abc123`
//!
//! A `.env` file is honoured through `dotenv`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Default mode: serve every call from fixtures
pub const DEFAULT_USE_MOCK: bool = true;

/// Default live API base (can be overridden by STOREFRONT_API__REAL_BASE)
pub const DEFAULT_REAL_BASE: &str = "http://localhost:8080/api";

/// Default fixture location, a directory or an http(s) URL (can be overridden by STOREFRONT_API__MOCK_BASE)
pub const DEFAULT_MOCK_BASE: &str = "mock";

/// Default simulated latency for fixture responses in milliseconds
pub const DEFAULT_MOCK_LATENCY_MS: u64 = 300;

/// Substring that marks an unedited placeholder value
pub const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Default identity-provider domain (placeholder)
pub const DEFAULT_IDENTITY_DOMAIN: &str =
	"https://YOUR_COGNITO_DOMAIN.auth.YOUR_REGION.amazoncognito.com";

/// Default app client id (placeholder)
pub const DEFAULT_CLIENT_ID: &str = "YOUR_COGNITO_APP_CLIENT_ID";

/// Default post-login redirect (placeholder)
pub const DEFAULT_REDIRECT_URI: &str = "YOUR_DOMAIN/auth/callback.html";

/// Top-level storefront configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
	pub api: ApiConfig,
	pub identity: IdentityConfig,
}

/// API dispatch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Serve calls from fixtures instead of the live backend
	pub use_mock: bool,
	/// Live API base, endpoints are appended verbatim
	pub real_base: String,
	/// Fixture directory or base URL
	pub mock_base: String,
	/// Simulated latency floor for fixture responses
	pub mock_latency_ms: u64,
	/// Treat every session as signed in (local testing only)
	pub dev_mock_auth: bool,
}

impl ApiConfig {
	pub fn mock_latency(&self) -> Duration {
		Duration::from_millis(self.mock_latency_ms)
	}
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			use_mock: DEFAULT_USE_MOCK,
			real_base: DEFAULT_REAL_BASE.to_string(),
			mock_base: DEFAULT_MOCK_BASE.to_string(),
			mock_latency_ms: DEFAULT_MOCK_LATENCY_MS,
			dev_mock_auth: false,
		}
	}
}

/// Hosted-UI identity provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
	pub domain: String,
	pub client_id: String,
	pub redirect_uri: String,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			domain: DEFAULT_IDENTITY_DOMAIN.to_string(),
			client_id: DEFAULT_CLIENT_ID.to_string(),
			redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
		}
	}
}

/// A configuration value that is missing or still a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
	/// Dotted key, e.g. `identity.client_id`
	pub key: &'static str,
	pub reason: IssueReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueReason {
	Missing,
	Placeholder,
}

impl std::fmt::Display for ConfigIssue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.reason {
			IssueReason::Missing => write!(f, "Missing value for {}", self.key),
			IssueReason::Placeholder => write!(f, "Placeholder value for {}", self.key),
		}
	}
}

impl StorefrontConfig {
	/// Load configuration from defaults and environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();

		let cfg = config::Config::builder()
			.add_source(config::Config::try_from(&Self::default())?)
			.add_source(Self::environment())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, then environment variables
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();

		let cfg = config::Config::builder()
			.add_source(config::Config::try_from(&Self::default())?)
			.add_source(config::File::with_name(path))
			.add_source(Self::environment())
			.build()?;

		cfg.try_deserialize()
	}

	fn environment() -> config::Environment {
		config::Environment::with_prefix(ENV_PREFIX)
			.prefix_separator("_")
			.separator("__")
			.try_parsing(true)
	}

	/// Check for missing or placeholder values
	///
	/// Identity settings are only needed for sign-in links, API bases only
	/// for the mode that uses them.
	pub fn validate(&self) -> Vec<ConfigIssue> {
		let mut issues = Vec::new();

		let identity = [
			("identity.domain", &self.identity.domain),
			("identity.client_id", &self.identity.client_id),
			("identity.redirect_uri", &self.identity.redirect_uri),
		];
		for (key, value) in identity {
			if let Some(reason) = check_value(value) {
				issues.push(ConfigIssue { key, reason });
			}
		}

		let (key, base) = if self.api.use_mock {
			("api.mock_base", &self.api.mock_base)
		} else {
			("api.real_base", &self.api.real_base)
		};
		if let Some(reason) = check_value(base) {
			issues.push(ConfigIssue { key, reason });
		}

		issues
	}

	/// Log every configuration issue
	///
	/// Configuration problems are never fatal: the storefront keeps running
	/// with degraded features (for example, no sign-in links).
	pub fn report(&self) -> usize {
		let issues = self.validate();
		for issue in &issues {
			error!(target: "config", "[CONFIG ERROR] {}", issue);
		}
		issues.len()
	}
}

fn check_value(value: &str) -> Option<IssueReason> {
	if value.trim().is_empty() {
		Some(IssueReason::Missing)
	} else if value.contains(PLACEHOLDER_MARKER) {
		Some(IssueReason::Placeholder)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn test_defaults_use_mock_mode() {
		let config = StorefrontConfig::default();
		assert!(config.api.use_mock);
		assert_eq!(config.api.mock_base, "mock");
		assert_eq!(config.api.mock_latency(), Duration::from_millis(300));
		assert!(!config.api.dev_mock_auth);
	}

	#[test]
	fn test_default_identity_is_flagged() {
		let issues = StorefrontConfig::default().validate();
		let keys: Vec<_> = issues.iter().map(|issue| issue.key).collect();
		assert_eq!(
			keys,
			vec!["identity.domain", "identity.client_id", "identity.redirect_uri"]
		);
		assert!(issues.iter().all(|issue| issue.reason == IssueReason::Placeholder));
	}

	#[test]
	fn test_missing_values_are_flagged() {
		let mut config = StorefrontConfig::default();
		config.identity = IdentityConfig {
			domain: "https://shop.auth.eu-west-1.amazoncognito.com".to_string(),
			client_id: "  ".to_string(),
			redirect_uri: "https://shop.example/auth/callback.html".to_string(),
		};
		config.api.use_mock = false;
		config.api.real_base = String::new();

		let issues = config.validate();
		assert_eq!(
			issues,
			vec![
				ConfigIssue {
					key: "identity.client_id",
					reason: IssueReason::Missing
				},
				ConfigIssue {
					key: "api.real_base",
					reason: IssueReason::Missing
				},
			]
		);
		assert_eq!(config.report(), 2);
	}

	#[test]
	fn test_from_file_overrides_defaults() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(
			file,
			"[api]\nuse_mock = false\nreal_base = \"https://shop.example/api\"\n\n[identity]\nclient_id = \"client-123\""
		)
		.unwrap();

		let config = StorefrontConfig::from_file(file.path().to_str().unwrap()).unwrap();
		assert!(!config.api.use_mock);
		assert_eq!(config.api.real_base, "https://shop.example/api");
		assert_eq!(config.api.mock_latency_ms, DEFAULT_MOCK_LATENCY_MS);
		assert_eq!(config.identity.client_id, "client-123");
		assert_eq!(config.identity.domain, DEFAULT_IDENTITY_DOMAIN);
	}
}
