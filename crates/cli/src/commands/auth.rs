//! Account commands: `whoami`, `logout`, `login-url` and `route`.

use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use tracing::info;
use webforge::protocol::{Subscription, Usage};
use webforge::{ApiClient, AuthState, ClientConfig, Navigation, Route, UsageKind, UsageLimit, guard, login_url as build_login_url};

use super::{api_client, emit};
use crate::output::{CommandError, ErrorCode, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiData {
	username: String,
	email: String,
	subscription: Subscription,
	usage: Usage,
	limits: UsageLimit,
	can_generate: bool,
	can_request: bool,
	github_connected: bool,
}

pub async fn whoami(config: &ClientConfig, format: OutputFormat, start: Instant) -> Result<(), CommandError> {
	let api = api_client(config)?;
	let mut auth = AuthState::new();
	auth.check_auth(&api).await;

	let Some(user) = auth.user() else {
		return Err(CommandError::new(ErrorCode::AuthError, "not signed in; open `webforge login-url` in a browser"));
	};

	let data = WhoamiData {
		username: user.username.clone(),
		email: user.email.clone(),
		subscription: user.subscription,
		usage: user.usage,
		limits: auth.usage_limit(),
		can_generate: auth.check_usage_limit(UsageKind::Generations),
		can_request: auth.check_usage_limit(UsageKind::DailyRequests),
		github_connected: user.github_connected,
	};

	if format == OutputFormat::Text {
		println!("{} <{}>", data.username.bold(), data.email);
		println!("plan: {}", data.subscription.to_string().cyan());
		println!(
			"generations this month: {}/{}{}",
			data.usage.monthly_generations,
			data.limits.generations,
			if data.can_generate { String::new() } else { " (limit reached)".red().to_string() }
		);
		println!(
			"requests today: {}/{}{}",
			data.usage.today_requests,
			data.limits.daily_requests,
			if data.can_request { String::new() } else { " (limit reached)".red().to_string() }
		);
		if !data.github_connected {
			println!("{}", "GitHub account not connected".yellow());
		}
	}
	emit("whoami", data, format, start);
	Ok(())
}

pub async fn logout(config: &ClientConfig, format: OutputFormat, start: Instant) -> Result<(), CommandError> {
	let api = api_client(config)?;
	api.logout().await?;
	info!(target = "webforge.cli", "session ended");

	if format == OutputFormat::Text {
		println!("{}", "Logged out".green());
	}
	emit("logout", serde_json::json!({ "loggedOut": true }), format, start);
	Ok(())
}

pub fn login_url(config: &ClientConfig, provider: &str, format: OutputFormat, start: Instant) {
	let url = build_login_url(&config.api_origin(), provider);
	if format == OutputFormat::Text {
		println!("{url}");
	}
	emit("login-url", serde_json::json!({ "url": url }), format, start);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteData {
	path: String,
	route: Option<&'static str>,
	allowed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	location: Option<String>,
}

pub async fn route(config: &ClientConfig, path: &str, format: OutputFormat, start: Instant) -> Result<(), CommandError> {
	let api = api_client(config)?;
	let mut auth = AuthState::new();
	let navigation = guard(&mut auth, &api, path).await;

	let data = RouteData {
		path: path.to_string(),
		route: Route::resolve(path).map(Route::name),
		allowed: navigation == Navigation::Allow,
		location: navigation.location(),
	};

	if format == OutputFormat::Text {
		let name = data.route.unwrap_or("(no route)");
		match data.location.as_deref() {
			None => println!("{} {name}", "allow".green()),
			Some(location) => println!("{} {name} -> {location}", "redirect".yellow()),
		}
	}
	emit("route", data, format, start);
	Ok(())
}
