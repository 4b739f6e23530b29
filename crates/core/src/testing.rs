//! In-memory [`ApiClient`] for tests.
//!
//! Pairs with `webforge_runtime::FakeConnector` to drive a
//! [`GenerationSession`](crate::GenerationSession) without a backend.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use webforge_protocol::{GenerateRequest, ProjectDescriptor, UserProfile};

use crate::api::ApiClient;
use crate::error::{Error, Result};

/// Scripted API responses plus a record of the requests made.
#[derive(Default)]
pub struct FakeApiClient {
	projects: Mutex<VecDeque<Result<ProjectDescriptor>>>,
	user: Mutex<Option<UserProfile>>,
	logout_failure: Mutex<Option<String>>,
	requests: Mutex<Vec<GenerateRequest>>,
	logouts: Mutex<usize>,
}

impl FakeApiClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a successful generation response.
	pub fn push_project(&self, id: impl Into<String>) {
		self.projects.lock().push_back(Ok(ProjectDescriptor::new(id)));
	}

	/// Queues a rejected generation response.
	pub fn push_failure(&self, status: u16, message: impl Into<String>) {
		self.projects.lock().push_back(Err(Error::Api {
			status,
			message: message.into(),
		}));
	}

	/// Profile returned by `current_user`; `None` answers 401.
	pub fn set_user(&self, user: Option<UserProfile>) {
		*self.user.lock() = user;
	}

	pub fn fail_logout(&self, message: impl Into<String>) {
		*self.logout_failure.lock() = Some(message.into());
	}

	/// Generation requests received, in call order.
	pub fn requests(&self) -> Vec<GenerateRequest> {
		self.requests.lock().clone()
	}

	pub fn logout_calls(&self) -> usize {
		*self.logouts.lock()
	}
}

#[async_trait]
impl ApiClient for FakeApiClient {
	async fn generate(&self, request: &GenerateRequest) -> Result<ProjectDescriptor> {
		self.requests.lock().push(request.clone());
		self.projects.lock().pop_front().unwrap_or_else(|| {
			Err(Error::Api {
				status: 500,
				message: "no scripted project".to_string(),
			})
		})
	}

	async fn current_user(&self) -> Result<UserProfile> {
		self.user.lock().clone().ok_or_else(|| Error::Api {
			status: 401,
			message: "Authentication credentials were not provided.".to_string(),
		})
	}

	async fn logout(&self) -> Result<()> {
		*self.logouts.lock() += 1;
		match self.logout_failure.lock().take() {
			Some(message) => Err(Error::Api { status: 500, message }),
			None => Ok(()),
		}
	}
}
