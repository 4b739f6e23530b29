//! `HttpApiClient` against a stub backend.

mod common;

use common::StubServer;
use serde_json::{Value, json};
use webforge::protocol::{Frontend, GenerateRequest, StylePreferences, Subscription, TechStack};
use webforge::{ApiClient, ClientConfig, Error, HttpApiClient};

fn client(server: &StubServer) -> HttpApiClient {
	let config = ClientConfig::from_sources(Default::default(), |key| (key == "WEBFORGE_API_URL").then(|| server.api_url())).unwrap();
	HttpApiClient::new(config).unwrap()
}

#[tokio::test]
async fn generate_posts_wizard_inputs() {
	let server = StubServer::start(|_| (201, json!({"id": 17, "name": "Recipes", "status": "pending"}).to_string(), vec![])).await;
	let api = client(&server);

	let request = GenerateRequest {
		description: "A recipe sharing site".into(),
		features: vec!["auth".into(), "search".into()],
		tech_stack: TechStack {
			frontend: Frontend::NextJs,
			..Default::default()
		},
		style_preferences: StylePreferences::default(),
	};
	let project = api.generate(&request).await.unwrap();
	assert_eq!(project.id, "17");
	assert_eq!(project.status(), Some("pending"));

	let seen = server.requests();
	assert_eq!(seen.len(), 1);
	assert_eq!((seen[0].method.as_str(), seen[0].path.as_str()), ("POST", "/api/generator/generate/"));
	let body: Value = serde_json::from_str(&seen[0].body).unwrap();
	assert_eq!(
		body,
		json!({
			"description": "A recipe sharing site",
			"features": ["auth", "search"],
			"tech_stack": {"frontend": "nextjs", "backend": "nodejs", "database": "postgresql"},
			"style_preferences": {"theme": "modern", "colorScheme": "blue", "layout": "dashboard"}
		})
	);
}

#[tokio::test]
async fn rate_limit_rejection_carries_server_message() {
	let server = StubServer::start(|_| (429, json!({"error": "Rate limit exceeded", "message": "Daily limit of 5 requests reached"}).to_string(), vec![])).await;
	let api = client(&server);

	let request = GenerateRequest {
		description: "x".into(),
		features: Vec::new(),
		tech_stack: TechStack::default(),
		style_preferences: StylePreferences::default(),
	};
	let err = api.generate(&request).await.unwrap_err();
	assert!(matches!(err, Error::Api { status: 429, ref message } if message == "Daily limit of 5 requests reached"));
}

#[tokio::test]
async fn session_cookie_is_replayed() {
	let server = StubServer::start(|request| {
		if request.header("cookie").is_some_and(|cookie| cookie.contains("sessionid=abc")) {
			let me = json!({
				"id": 1,
				"username": "ada",
				"email": "ada@example.com",
				"subscription": "enterprise",
				"usage": {"monthlyGenerations": 4, "todayRequests": 1, "totalProjects": 9},
				"github_connected": true
			});
			(200, me.to_string(), vec![])
		} else {
			(
				401,
				json!({"detail": "Authentication credentials were not provided."}).to_string(),
				vec![("Set-Cookie".to_string(), "sessionid=abc; Path=/".to_string())],
			)
		}
	})
	.await;
	let api = client(&server);

	let first = api.current_user().await.unwrap_err();
	assert_eq!(first.status(), Some(401));

	let user = api.current_user().await.unwrap();
	assert_eq!(user.username, "ada");
	assert_eq!(user.subscription, Subscription::Enterprise);
	assert_eq!(user.usage.total_projects, 9);
	assert!(user.github_connected);
}

#[tokio::test]
async fn logout_posts_and_reports_failure() {
	let server = StubServer::start(|request| match request.method.as_str() {
		"POST" => (200, "{}".to_string(), vec![]),
		_ => (405, String::new(), vec![]),
	})
	.await;
	let api = client(&server);
	api.logout().await.unwrap();

	let seen = server.requests();
	assert_eq!((seen[0].method.as_str(), seen[0].path.as_str()), ("POST", "/api/auth/logout/"));

	let failing = StubServer::start(|_| (500, String::new(), vec![])).await;
	assert!(matches!(client(&failing).logout().await, Err(Error::Api { status: 500, .. })));
}
