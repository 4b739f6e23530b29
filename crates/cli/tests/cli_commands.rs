use std::path::Path;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::TempDir;

const ENV_VARS: [&str; 5] = [
	"WEBFORGE_API_URL",
	"WEBFORGE_WS_URL",
	"WEBFORGE_TRANSPORTS",
	"WEBFORGE_POLL_INTERVAL_MS",
	"WEBFORGE_SESSION_COOKIE",
];

fn webforge(config: &Path, args: &[&str], env: &[(&str, &str)]) -> (bool, String, String) {
	let mut command = Command::new(env!("CARGO_BIN_EXE_webforge"));
	for key in ENV_VARS {
		command.env_remove(key);
	}
	command.env_remove("RUST_LOG").arg("--config").arg(config).args(args).envs(env.iter().copied());

	let output = command.output().expect("failed to execute webforge");
	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

fn write_config(dir: &TempDir, config: Value) -> std::path::PathBuf {
	let path = dir.path().join("config.json");
	std::fs::write(&path, config.to_string()).expect("config should be written");
	path
}

fn closed_port() -> u16 {
	std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap().local_addr().unwrap().port()
}

#[test]
fn login_url_prints_provider_url() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({"apiUrl": "https://forge.example/api"}));

	let (success, stdout, stderr) = webforge(&config, &["login-url"], &[]);
	assert!(success, "login-url failed: {stderr}");
	assert_eq!(stdout.trim(), "https://forge.example/auth/github/login/");

	let (success, stdout, _) = webforge(&config, &["-f", "json", "login-url", "--provider", "google"], &[]);
	assert!(success);
	let envelope: Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(envelope["ok"], true);
	assert_eq!(envelope["command"], "login-url");
	assert_eq!(envelope["data"]["url"], "https://forge.example/auth/google/login/");
}

#[test]
fn environment_overrides_config_file() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({"apiUrl": "https://forge.example/api"}));

	let (success, stdout, _) = webforge(&config, &["login-url"], &[("WEBFORGE_API_URL", "http://127.0.0.1:9000/api")]);
	assert!(success);
	assert_eq!(stdout.trim(), "http://127.0.0.1:9000/auth/github/login/");
}

#[test]
fn missing_config_file_is_a_config_error() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let missing = tmp.path().join("absent.json");

	let (success, stdout, _) = webforge(&missing, &["-f", "json", "login-url"], &[]);
	assert!(!success);
	let envelope: Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(envelope["ok"], false);
	assert_eq!(envelope["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn invalid_transport_list_is_rejected() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({}));

	let (success, _, stderr) = webforge(&config, &["whoami"], &[("WEBFORGE_TRANSPORTS", "carrier-pigeon")]);
	assert!(!success);
	assert!(stderr.contains("CONFIG_ERROR"), "unexpected stderr: {stderr}");
}

#[test]
fn unreachable_backend_fails_whoami() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({"apiUrl": format!("http://127.0.0.1:{}/api", closed_port())}));

	let (success, stdout, _) = webforge(&config, &["-f", "json", "whoami"], &[]);
	assert!(!success);
	let envelope: Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(envelope["command"], "whoami");
	assert_eq!(envelope["error"]["code"], "AUTH_ERROR");
}

#[test]
fn generate_needs_a_description() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({}));

	let (success, stdout, _) = webforge(&config, &["-f", "json", "generate", "-d", "   "], &[]);
	assert!(!success);
	let envelope: Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(envelope["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn anonymous_route_check_redirects_home() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let config = write_config(&tmp, json!({"apiUrl": format!("http://127.0.0.1:{}/api", closed_port())}));

	let (success, stdout, stderr) = webforge(&config, &["-f", "json", "route", "/dashboard"], &[]);
	assert!(success, "route failed: {stderr}");
	let envelope: Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(envelope["data"]["route"], "Dashboard");
	assert_eq!(envelope["data"]["allowed"], false);
	assert_eq!(envelope["data"]["location"], "/?redirect=%2Fdashboard");
}
