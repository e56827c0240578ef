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

//! User-facing notifications
//!
//! Page managers report the outcome of user actions through a [`Notifier`]
//! instead of touching any UI directly.

use std::{fmt, sync::Mutex};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
	Success,
	Warning,
	Error,
}

impl fmt::Display for NotificationLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NotificationLevel::Success => f.write_str("success"),
			NotificationLevel::Warning => f.write_str("warning"),
			NotificationLevel::Error => f.write_str("error"),
		}
	}
}

/// A single toast-style message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub level: NotificationLevel,
	pub message: String,
	/// Produced while serving fixtures
	pub mock: bool,
}

impl Notification {
	pub fn new(level: NotificationLevel, message: impl Into<String>, mock: bool) -> Self {
		Self {
			level,
			message: message.into(),
			mock,
		}
	}
}

impl fmt::Display for Notification {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.mock {
			write!(f, "{} (Mock)", self.message)
		} else {
			f.write_str(&self.message)
		}
	}
}

/// Notification sink
pub trait Notifier: Send + Sync {
	fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn notify(&self, notification: Notification) {
		match notification.level {
			NotificationLevel::Success => info!(target: "notify", "{}", notification),
			NotificationLevel::Warning => warn!(target: "notify", "{}", notification),
			NotificationLevel::Error => error!(target: "notify", "{}", notification),
		}
	}
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entries(&self) -> Vec<Notification> {
		self.entries
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	/// Most recent notification
	pub fn last(&self) -> Option<Notification> {
		self.entries
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.last()
			.cloned()
	}

	/// Drain everything recorded so far
	pub fn take(&self) -> Vec<Notification> {
		std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()))
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, notification: Notification) {
		self.entries
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.push(notification);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mock_marker_in_display() {
		let real = Notification::new(NotificationLevel::Success, "Cart cleared", false);
		let mock = Notification::new(NotificationLevel::Success, "Cart cleared", true);
		assert_eq!(real.to_string(), "Cart cleared");
		assert_eq!(mock.to_string(), "Cart cleared (Mock)");
	}

	#[test]
	fn test_recording_notifier() {
		let notifier = RecordingNotifier::new();
		notifier.notify(Notification::new(NotificationLevel::Warning, "No items to reorder", false));
		notifier.notify(Notification::new(NotificationLevel::Error, "Failed to clear cart", false));

		assert_eq!(notifier.entries().len(), 2);
		assert_eq!(notifier.last().unwrap().level, NotificationLevel::Error);
		assert_eq!(notifier.take().len(), 2);
		assert!(notifier.entries().is_empty());
	}
}
