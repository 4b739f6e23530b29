use std::time::{Duration, Instant};

use serde_json::json;

use super::*;

#[test]
fn success_envelope_omits_error() {
	let result = ResultBuilder::new("login-url").data(json!({"url": "http://localhost:8000/auth/github/login/"})).build();
	let value = serde_json::to_value(&result).unwrap();

	assert_eq!(value["schemaVersion"], 1);
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "login-url");
	assert_eq!(value["data"]["url"], "http://localhost:8000/auth/github/login/");
	assert!(value.get("error").is_none());
}

#[test]
fn failure_envelope_carries_code() {
	let result = ResultBuilder::<()>::new("generate")
		.error(CommandError::new(ErrorCode::GenerationFailed, "quota exceeded"))
		.build();
	let value = serde_json::to_value(&result).unwrap();

	assert_eq!(value["ok"], false);
	assert_eq!(value["error"]["code"], "GENERATION_FAILED");
	assert_eq!(value["error"]["message"], "quota exceeded");
	assert!(value.get("data").is_none());
}

#[test]
fn started_at_measures_from_given_instant() {
	let start = Instant::now() - Duration::from_millis(250);
	let result = ResultBuilder::<()>::new("whoami").started_at(start).build();
	assert!(result.duration_ms.unwrap() >= 250);
}

#[test]
fn client_errors_map_to_codes() {
	let api = |status| webforge::Error::Api {
		status,
		message: "nope".into(),
	};
	assert_eq!(ErrorCode::for_error(&api(401)), ErrorCode::AuthError);
	assert_eq!(ErrorCode::for_error(&api(403)), ErrorCode::RateLimited);
	assert_eq!(ErrorCode::for_error(&api(429)), ErrorCode::RateLimited);
	assert_eq!(ErrorCode::for_error(&api(500)), ErrorCode::ApiError);
	assert_eq!(ErrorCode::for_error(&webforge::Error::Config("bad".into())), ErrorCode::ConfigError);
	assert_eq!(
		ErrorCode::for_error(&webforge::Error::Channel(webforge::runtime::Error::InvalidProjectId)),
		ErrorCode::ChannelError
	);

	let error = CommandError::from(api(429));
	assert_eq!(error.code, ErrorCode::RateLimited);
	assert!(error.message.contains("nope"));
}

#[test]
fn format_parses_case_insensitively() {
	assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!(OutputFormat::default().to_string(), "text");
	assert!("yaml".parse::<OutputFormat>().is_err());
}
