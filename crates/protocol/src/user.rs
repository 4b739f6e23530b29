//! Current-user profile returned by `GET /auth/me/`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subscription tier. Unrecognised tiers are treated as [`Subscription::Free`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Subscription {
	#[default]
	Free,
	Pro,
	Enterprise,
}

impl Subscription {
	pub fn as_str(self) -> &'static str {
		match self {
			Subscription::Free => "free",
			Subscription::Pro => "pro",
			Subscription::Enterprise => "enterprise",
		}
	}
}

impl From<String> for Subscription {
	fn from(value: String) -> Self {
		match value.to_ascii_lowercase().as_str() {
			"pro" => Subscription::Pro,
			"enterprise" => Subscription::Enterprise,
			_ => Subscription::Free,
		}
	}
}

impl fmt::Display for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Usage counters tracked by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
	#[serde(default)]
	pub monthly_generations: u32,
	#[serde(default)]
	pub today_requests: u32,
	#[serde(default)]
	pub total_projects: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	#[serde(default)]
	pub id: Option<u64>,
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub first_name: String,
	#[serde(default)]
	pub subscription: Subscription,
	#[serde(default)]
	pub usage: Usage,
	#[serde(default)]
	pub github_connected: bool,
}
