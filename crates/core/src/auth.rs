//! Signed-in user state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use webforge_protocol::{Subscription, UserProfile};

use crate::api::ApiClient;

pub const DEFAULT_LOGIN_PROVIDER: &str = "github";

/// Per-tier usage ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimit {
	pub generations: u32,
	pub daily_requests: u32,
}

impl UsageLimit {
	pub fn for_subscription(subscription: Subscription) -> Self {
		match subscription {
			Subscription::Free => Self {
				generations: 3,
				daily_requests: 5,
			},
			Subscription::Pro => Self {
				generations: 10,
				daily_requests: 20,
			},
			Subscription::Enterprise => Self {
				generations: 20,
				daily_requests: 50,
			},
		}
	}
}

/// Counter checked by [`AuthState::check_usage_limit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UsageKind {
	#[default]
	Generations,
	DailyRequests,
}

impl fmt::Display for UsageKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			UsageKind::Generations => "generations",
			UsageKind::DailyRequests => "dailyRequests",
		})
	}
}

impl FromStr for UsageKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"generations" => Ok(UsageKind::Generations),
			"dailyRequests" | "daily-requests" | "daily_requests" => Ok(UsageKind::DailyRequests),
			other => Err(format!("unknown usage kind: {other}")),
		}
	}
}

/// The current user, as last reported by the backend.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
	user: Option<UserProfile>,
	initialized: bool,
	loading: bool,
}

impl AuthState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn user(&self) -> Option<&UserProfile> {
		self.user.as_ref()
	}

	/// `true` once `check_auth` has finished at least once.
	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	pub fn is_loading(&self) -> bool {
		self.loading
	}

	pub fn is_authenticated(&self) -> bool {
		self.user.is_some()
	}

	pub fn subscription(&self) -> Subscription {
		self.user.as_ref().map(|user| user.subscription).unwrap_or_default()
	}

	pub fn usage_limit(&self) -> UsageLimit {
		UsageLimit::for_subscription(self.subscription())
	}

	/// Whether the signed-in user is still below the limit for `kind`.
	/// Always `false` when nobody is signed in.
	pub fn check_usage_limit(&self, kind: UsageKind) -> bool {
		let Some(user) = self.user.as_ref() else {
			return false;
		};
		let limit = self.usage_limit();
		match kind {
			UsageKind::Generations => user.usage.monthly_generations < limit.generations,
			UsageKind::DailyRequests => user.usage.today_requests < limit.daily_requests,
		}
	}

	/// Refreshes the user from the backend. Any failure means "signed out".
	pub async fn check_auth(&mut self, api: &dyn ApiClient) {
		self.loading = true;
		self.user = match api.current_user().await {
			Ok(user) => {
				debug!(target = "webforge.auth", username = %user.username, subscription = %user.subscription, "user loaded");
				Some(user)
			}
			Err(err) => {
				debug!(target = "webforge.auth", error = %err, "no authenticated user");
				None
			}
		};
		self.initialized = true;
		self.loading = false;
	}

	/// Ends the server-side session. Failures are logged and leave the user in place.
	pub async fn logout(&mut self, api: &dyn ApiClient) -> bool {
		match api.logout().await {
			Ok(()) => {
				info!(target = "webforge.auth", "logged out");
				self.user = None;
				true
			}
			Err(err) => {
				warn!(target = "webforge.auth", error = %err, "logout failed");
				false
			}
		}
	}

	#[cfg(test)]
	pub(crate) fn with_user(user: UserProfile) -> Self {
		Self {
			user: Some(user),
			initialized: true,
			loading: false,
		}
	}
}

/// Browser URL that starts the OAuth flow for `provider`.
pub fn login_url(api_origin: &str, provider: &str) -> String {
	let provider = provider.trim();
	let provider = if provider.is_empty() { DEFAULT_LOGIN_PROVIDER } else { provider };
	format!("{}/auth/{provider}/login/", api_origin.trim_end_matches('/'))
}
