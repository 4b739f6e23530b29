//! Application routes and the access guard in front of them.

use tracing::debug;
use url::form_urlencoded;
use webforge_protocol::Subscription;

use crate::api::ApiClient;
use crate::auth::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
	Home,
	Generator,
	Results,
	Dashboard,
	DebugRepository,
	Pricing,
	AuthCallback,
}

impl Route {
	pub const ALL: [Route; 7] = [
		Route::Home,
		Route::Generator,
		Route::Results,
		Route::Dashboard,
		Route::DebugRepository,
		Route::Pricing,
		Route::AuthCallback,
	];

	/// Path pattern; `:projectId` marks the results parameter.
	pub fn pattern(self) -> &'static str {
		match self {
			Route::Home => "/",
			Route::Generator => "/generator",
			Route::Results => "/results/:projectId",
			Route::Dashboard => "/dashboard",
			Route::DebugRepository => "/debug",
			Route::Pricing => "/pricing",
			Route::AuthCallback => "/auth/callback",
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Route::Home => "Home",
			Route::Generator => "Generator",
			Route::Results => "Results",
			Route::Dashboard => "Dashboard",
			Route::DebugRepository => "DebugRepository",
			Route::Pricing => "Pricing",
			Route::AuthCallback => "AuthCallback",
		}
	}

	pub fn requires_auth(self) -> bool {
		matches!(self, Route::Generator | Route::Results | Route::Dashboard | Route::DebugRepository)
	}

	pub fn requires_enterprise(self) -> bool {
		matches!(self, Route::DebugRepository)
	}

	/// Resolves a full path (query and fragment allowed) to its route.
	pub fn resolve(full_path: &str) -> Option<Route> {
		let path = full_path.split(['?', '#']).next().unwrap_or_default();
		let path = match path.trim_end_matches('/') {
			"" => "/",
			trimmed => trimmed,
		};
		if let Some(project_id) = path.strip_prefix("/results/") {
			return (!project_id.is_empty() && !project_id.contains('/')).then_some(Route::Results);
		}
		Route::ALL.into_iter().find(|route| route.pattern() == path)
	}
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
	Allow,
	Redirect { to: Route, redirect: Option<String> },
}

impl Navigation {
	/// Location to navigate to for a redirect, including its query.
	pub fn location(&self) -> Option<String> {
		match self {
			Navigation::Allow => None,
			Navigation::Redirect { to, redirect: None } => Some(to.pattern().to_string()),
			Navigation::Redirect { to, redirect: Some(target) } => {
				let query = form_urlencoded::Serializer::new(String::new()).append_pair("redirect", target).finish();
				Some(format!("{}?{query}", to.pattern()))
			}
		}
	}
}

/// Decides access to `route` for the current auth state.
pub fn check_access(auth: &AuthState, route: Route, full_path: &str) -> Navigation {
	if route.requires_auth() && !auth.is_authenticated() {
		return Navigation::Redirect {
			to: Route::Home,
			redirect: Some(full_path.to_string()),
		};
	}
	if route.requires_enterprise() && auth.subscription() != Subscription::Enterprise {
		return Navigation::Redirect {
			to: Route::Pricing,
			redirect: None,
		};
	}
	Navigation::Allow
}

/// Guards navigation to `full_path`, loading the user on first use.
///
/// Unknown paths are allowed through; rendering a not-found view is the caller's concern.
pub async fn guard(auth: &mut AuthState, api: &dyn ApiClient, full_path: &str) -> Navigation {
	if !auth.is_initialized() {
		auth.check_auth(api).await;
	}
	let Some(route) = Route::resolve(full_path) else {
		debug!(target = "webforge.auth", path = %full_path, "no route for path");
		return Navigation::Allow;
	};
	let navigation = check_access(auth, route, full_path);
	debug!(target = "webforge.auth", route = route.name(), ?navigation, "route guard");
	navigation
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeApiClient;
	use webforge_protocol::UserProfile;

	fn signed_in(subscription: Subscription) -> AuthState {
		AuthState::with_user(UserProfile {
			subscription,
			..Default::default()
		})
	}

	#[test]
	fn resolves_paths_to_routes() {
		assert_eq!(Route::resolve("/"), Some(Route::Home));
		assert_eq!(Route::resolve("/generator?step=2"), Some(Route::Generator));
		assert_eq!(Route::resolve("/results/5b0c"), Some(Route::Results));
		assert_eq!(Route::resolve("/results/"), None);
		assert_eq!(Route::resolve("/dashboard/"), Some(Route::Dashboard));
		assert_eq!(Route::resolve("/auth/callback#token"), Some(Route::AuthCallback));
		assert_eq!(Route::resolve("/nowhere"), None);
	}

	#[test]
	fn route_metadata() {
		let protected: Vec<_> = Route::ALL.into_iter().filter(|route| route.requires_auth()).collect();
		assert_eq!(protected, vec![Route::Generator, Route::Results, Route::Dashboard, Route::DebugRepository]);
		let enterprise: Vec<_> = Route::ALL.into_iter().filter(|route| route.requires_enterprise()).collect();
		assert_eq!(enterprise, vec![Route::DebugRepository]);
	}

	#[test]
	fn anonymous_users_are_sent_home_with_redirect() {
		let navigation = check_access(&AuthState::new(), Route::Results, "/results/p-1?tab=files");
		assert_eq!(
			navigation,
			Navigation::Redirect {
				to: Route::Home,
				redirect: Some("/results/p-1?tab=files".into()),
			}
		);
		assert_eq!(navigation.location().as_deref(), Some("/?redirect=%2Fresults%2Fp-1%3Ftab%3Dfiles"));
	}

	#[test]
	fn enterprise_routes_need_enterprise() {
		let pro = signed_in(Subscription::Pro);
		let navigation = check_access(&pro, Route::DebugRepository, "/debug");
		assert_eq!(navigation.location().as_deref(), Some("/pricing"));
		assert_eq!(check_access(&pro, Route::Dashboard, "/dashboard"), Navigation::Allow);

		let enterprise = signed_in(Subscription::Enterprise);
		assert_eq!(check_access(&enterprise, Route::DebugRepository, "/debug"), Navigation::Allow);
	}

	#[test]
	fn public_routes_are_open() {
		for route in [Route::Home, Route::Pricing, Route::AuthCallback] {
			assert_eq!(check_access(&AuthState::new(), route, route.pattern()), Navigation::Allow);
		}
	}

	#[tokio::test]
	async fn guard_loads_user_once() {
		let api = FakeApiClient::new();
		api.set_user(Some(UserProfile::default()));
		let mut auth = AuthState::new();

		assert_eq!(guard(&mut auth, &api, "/generator").await, Navigation::Allow);
		assert!(auth.is_initialized());

		api.set_user(None);
		assert_eq!(guard(&mut auth, &api, "/generator").await, Navigation::Allow);
	}
}
