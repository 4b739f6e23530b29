//! Project descriptor returned by the generation API.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generated project as reported by the backend.
///
/// Only `id` is required; every other field is kept verbatim so that
/// completion payloads can be merged in without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
	#[serde(deserialize_with = "deserialize_id")]
	pub id: String,
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}

impl ProjectDescriptor {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			fields: Map::new(),
		}
	}

	/// Builds a descriptor from loose fields, taking the id from `id` or `project_id`.
	pub fn from_fields(mut fields: Map<String, Value>) -> Self {
		let id = fields
			.remove("id")
			.or_else(|| fields.get("project_id").cloned())
			.and_then(|value| id_string(&value))
			.unwrap_or_default();
		Self { id, fields }
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str)
	}

	pub fn name(&self) -> Option<&str> {
		self.get_str("name")
	}

	pub fn status(&self) -> Option<&str> {
		self.get_str("status")
	}

	/// Repository URL from either the detail (`github_repo_url`) or completion (`github_url`) shape.
	pub fn repository_url(&self) -> Option<&str> {
		self.get_str("github_url").or_else(|| self.get_str("github_repo_url"))
	}

	pub fn files_count(&self) -> Option<u64> {
		self.get("files_count").and_then(Value::as_u64)
	}

	/// Merges `fields` into this descriptor; incoming values win on key collision.
	pub fn merge(&mut self, fields: Map<String, Value>) {
		for (key, value) in fields {
			if key == "id" {
				if let Some(id) = id_string(&value) {
					self.id = id;
				}
				continue;
			}
			self.fields.insert(key, value);
		}
	}
}

fn id_string(value: &Value) -> Option<String> {
	match value {
		Value::String(id) => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;
	id_string(&value).ok_or_else(|| de::Error::custom(format!("project id must be a string or number, got {value}")))
}
