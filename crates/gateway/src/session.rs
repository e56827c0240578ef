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

//! Client-side session state
//!
//! # Session hint vs authorization
//!
//! [`SessionHint`] answers one question: "is an identity token present in the
//! local session store?". It is **advisory only**:
//!
//! - It never validates the token's signature, issuer or expiry
//! - It only picks an endpoint variant (`/cart` vs `/cart/auth`) or a UI branch
//! - The backend is the sole authority on whether a request is authorized
//!
//! Do not use it to gate access to anything that matters.

use std::{
	collections::BTreeMap,
	fs,
	path::{Path, PathBuf},
	sync::Mutex,
};

use dashmap::DashMap;
use thiserror::Error;

/// Session key that holds the identity token issued by the hosted UI
pub const ID_TOKEN_KEY: &str = "id_token";

/// Suffix appended to endpoints served by the authenticated variant
pub const AUTH_SUFFIX: &str = "/auth";

/// Error types for session persistence
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("Session file error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Session file is not valid JSON: {0}")]
	Format(#[from] serde_json::Error),
}

/// Key/value session storage (the browser's `sessionStorage` analogue)
pub trait SessionStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;

	fn set(&self, key: &str, value: String) -> Result<(), SessionError>;

	fn remove(&self, key: &str) -> Result<(), SessionError>;

	/// Drop every key
	fn clear(&self) -> Result<(), SessionError>;

	/// Identity token, if one is stored and non-empty
	fn id_token(&self) -> Option<String> {
		self.get(ID_TOKEN_KEY).filter(|token| !token.is_empty())
	}
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
	values: DashMap<String, String>,
}

impl MemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store pre-populated with an identity token
	pub fn with_token(token: impl Into<String>) -> Self {
		let store = Self::new();
		store.values.insert(ID_TOKEN_KEY.to_string(), token.into());
		store
	}
}

impl SessionStore for MemorySessionStore {
	fn get(&self, key: &str) -> Option<String> {
		self.values.get(key).map(|value| value.clone())
	}

	fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
		self.values.insert(key.to_string(), value);
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), SessionError> {
		self.values.remove(key);
		Ok(())
	}

	fn clear(&self) -> Result<(), SessionError> {
		self.values.clear();
		Ok(())
	}
}

/// Session store persisted as a JSON object on disk
///
/// Used by the CLI so a token stored by one invocation is visible to the next.
#[derive(Debug)]
pub struct FileSessionStore {
	path: PathBuf,
	values: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
	/// Open the store, starting empty when the file does not exist yet
	pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
		let path = path.as_ref().to_path_buf();
		let values = match fs::read_to_string(&path) {
			Ok(content) if content.trim().is_empty() => BTreeMap::new(),
			Ok(content) => serde_json::from_str(&content)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(e.into()),
		};

		Ok(Self {
			path,
			values: Mutex::new(values),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn update<F>(&self, f: F) -> Result<(), SessionError>
	where
		F: FnOnce(&mut BTreeMap<String, String>),
	{
		let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
		let mut next = values.clone();
		f(&mut next);

		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(&next)?)?;

		// Memory only follows the disk once the write went through
		*values = next;
		Ok(())
	}
}

impl SessionStore for FileSessionStore {
	fn get(&self, key: &str) -> Option<String> {
		self.values
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.get(key)
			.cloned()
	}

	fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
		self.update(|values| {
			values.insert(key.to_string(), value);
		})
	}

	fn remove(&self, key: &str) -> Result<(), SessionError> {
		self.update(|values| {
			values.remove(key);
		})
	}

	fn clear(&self) -> Result<(), SessionError> {
		self.update(|values| values.clear())
	}
}

/// Advisory "looks signed in" signal used to choose endpoint variants
///
/// See the module documentation: this is not an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHint {
	signed_in: bool,
}

impl SessionHint {
	/// Derive the hint from the session store
	///
	/// `dev_mock_auth` forces the hint on for local testing.
	pub fn from_store(store: &dyn SessionStore, dev_mock_auth: bool) -> Self {
		Self {
			signed_in: dev_mock_auth || store.id_token().is_some(),
		}
	}

	pub fn anonymous() -> Self {
		Self { signed_in: false }
	}

	pub fn signed_in() -> Self {
		Self { signed_in: true }
	}

	pub fn is_signed_in(&self) -> bool {
		self.signed_in
	}

	/// Pick the endpoint variant: `/cart` becomes `/cart/auth` when signed in
	pub fn endpoint(&self, base: &str) -> String {
		if self.signed_in {
			format!("{}{}", base, AUTH_SUFFIX)
		} else {
			base.to_string()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_memory_store_roundtrip() {
		let store = MemorySessionStore::new();
		assert!(store.id_token().is_none());

		store.set(ID_TOKEN_KEY, "abc".to_string()).unwrap();
		assert_eq!(store.id_token().as_deref(), Some("abc"));

		store.clear().unwrap();
		assert!(store.get(ID_TOKEN_KEY).is_none());
	}

	#[test]
	fn test_empty_token_is_not_a_token() {
		let store = MemorySessionStore::with_token("");
		assert!(store.id_token().is_none());
		assert!(!SessionHint::from_store(&store, false).is_signed_in());
	}

	#[test]
	fn test_hint_from_store() {
		let store = MemorySessionStore::with_token("not-even-a-jwt");
		let hint = SessionHint::from_store(&store, false);
		assert!(hint.is_signed_in());
		assert_eq!(hint.endpoint("/cart"), "/cart/auth");
		assert_eq!(hint.endpoint("/cart/items/7"), "/cart/items/7/auth");
	}

	#[test]
	fn test_dev_mock_auth_forces_hint() {
		let store = MemorySessionStore::new();
		assert!(SessionHint::from_store(&store, true).is_signed_in());
		assert_eq!(SessionHint::anonymous().endpoint("/cart"), "/cart");
	}

	#[test]
	fn test_file_store_persists_between_opens() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("session.json");

		let store = FileSessionStore::open(&path).unwrap();
		store.set(ID_TOKEN_KEY, "abc".to_string()).unwrap();
		store.set("cart_id", "guest-1".to_string()).unwrap();

		let reopened = FileSessionStore::open(&path).unwrap();
		assert_eq!(reopened.id_token().as_deref(), Some("abc"));
		assert_eq!(reopened.get("cart_id").as_deref(), Some("guest-1"));

		reopened.remove("cart_id").unwrap();
		reopened.clear().unwrap();
		let cleared = FileSessionStore::open(&path).unwrap();
		assert!(cleared.get(ID_TOKEN_KEY).is_none());
	}

	#[test]
	fn test_failed_write_leaves_memory_untouched() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("session.json");

		let store = FileSessionStore::open(&path).unwrap();
		store.set(ID_TOKEN_KEY, "abc".to_string()).unwrap();

		// A directory in place of the file makes every write fail
		fs::remove_file(&path).unwrap();
		fs::create_dir(&path).unwrap();

		assert!(store.set(ID_TOKEN_KEY, "xyz".to_string()).is_err());
		assert!(store.clear().is_err());
		assert_eq!(store.id_token().as_deref(), Some("abc"));
	}

	#[test]
	fn test_file_store_rejects_garbage() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("session.json");
		fs::write(&path, "not json").unwrap();

		assert!(matches!(
			FileSessionStore::open(&path),
			Err(SessionError::Format(_))
		));
	}
}
