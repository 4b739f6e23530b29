//! `webforge generate`: starts a run and follows it to a terminal status.

use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};
use webforge::{ClientConfig, GenerationSession, GenerationStatus, MessageKind, SessionSnapshot, StatusMessage};

use super::{api_client, emit};
use crate::cli::GenerateArgs;
use crate::output::{CommandError, ErrorCode, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSummary {
	project_id: String,
	status: GenerationStatus,
	progress: u8,
	#[serde(skip_serializing_if = "Option::is_none")]
	repository_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	files_count: Option<u64>,
	messages: Vec<StatusMessage>,
}

pub async fn execute(config: &ClientConfig, args: &GenerateArgs, format: OutputFormat, start: Instant) -> Result<(), CommandError> {
	if args.description.trim().is_empty() {
		return Err(CommandError::new(ErrorCode::ConfigError, "a description is required"));
	}

	let api = api_client(config)?;
	let connector = config.connector(api.http_client().clone());
	let mut session = GenerationSession::new(Arc::new(api), Arc::new(connector));
	args.apply_to(&mut session);

	let project = session.start_generation().await?;
	info!(target = "webforge.cli", project_id = %project.id, "generation started");
	if format == OutputFormat::Text {
		println!("{} project {}", "Generating".bold(), project.id.cyan());
	}

	let mut printer = ProgressPrinter::default();
	let interrupted = loop {
		if format == OutputFormat::Text {
			printer.print(&session.snapshot());
		}
		if session.status().is_terminal() {
			break false;
		}
		tokio::select! {
			more = session.next_update() => {
				if !more {
					break false;
				}
			}
			_ = tokio::signal::ctrl_c() => break true,
		}
	};
	if format == OutputFormat::Text {
		printer.print(&session.snapshot());
	}
	session.disconnect_channel();

	if interrupted {
		warn!(target = "webforge.cli", project_id = %project.id, "interrupted; generation continues server-side");
		return Err(CommandError::new(ErrorCode::Interrupted, format!("stopped following project {}", project.id)));
	}

	match session.status() {
		GenerationStatus::Completed => {}
		GenerationStatus::Failed => {
			let reason = session
				.messages()
				.iter()
				.rev()
				.find(|message| message.kind == MessageKind::Error)
				.map(|message| message.message.clone())
				.unwrap_or_else(|| "generation failed".to_string());
			return Err(CommandError::new(ErrorCode::GenerationFailed, reason));
		}
		status => {
			return Err(CommandError::new(
				ErrorCode::ChannelError,
				format!("progress channel closed while generation was {status}"),
			));
		}
	}

	let summary = summarize(&session, &project.id);
	if format == OutputFormat::Text {
		match summary.repository_url.as_deref() {
			Some(url) => println!("{} {}", "Done:".green().bold(), url),
			None => println!("{}", "Done".green().bold()),
		}
		if let Some(count) = summary.files_count {
			println!("{count} files generated");
		}
	}
	emit("generate", summary, format, start);
	Ok(())
}

fn summarize(session: &GenerationSession, fallback_id: &str) -> GenerateSummary {
	let project = session.project();
	GenerateSummary {
		project_id: project.map_or(fallback_id, |project| project.id.as_str()).to_string(),
		status: session.status(),
		progress: session.progress(),
		repository_url: project.and_then(|project| project.repository_url()).map(str::to_string),
		files_count: project.and_then(|project| project.files_count()),
		messages: session.messages().to_vec(),
	}
}

/// Something to show for a snapshot that has not been shown yet.
#[derive(Debug, Clone, PartialEq)]
enum Update {
	Progress { progress: u8, phase: Option<String> },
	Message(StatusMessage),
}

/// Turns successive snapshots into incremental terminal output.
#[derive(Debug, Default)]
struct ProgressPrinter {
	printed: usize,
	progress: Option<(u8, Option<String>)>,
}

impl ProgressPrinter {
	fn pending(&mut self, snapshot: &SessionSnapshot) -> Vec<Update> {
		let mut updates = Vec::new();
		let current = (snapshot.progress, snapshot.phase.clone());
		if snapshot.status != GenerationStatus::Idle && self.progress.as_ref() != Some(&current) {
			updates.push(Update::Progress {
				progress: current.0,
				phase: current.1.clone(),
			});
			self.progress = Some(current);
		}
		// A restart clears the log.
		if snapshot.messages.len() < self.printed {
			self.printed = 0;
		}
		updates.extend(snapshot.messages[self.printed..].iter().cloned().map(Update::Message));
		self.printed = snapshot.messages.len();
		updates
	}

	fn print(&mut self, snapshot: &SessionSnapshot) {
		for update in self.pending(snapshot) {
			match update {
				Update::Progress { progress, phase } => {
					let phase = phase.map(|phase| format!(" {phase}")).unwrap_or_default();
					println!("{}", format!("[{progress:>3}%]{phase}").dimmed());
				}
				Update::Message(message) => {
					let text = match message.kind {
						MessageKind::Success => message.message.green(),
						MessageKind::Warning => message.message.yellow(),
						MessageKind::Error => message.message.red().bold(),
						MessageKind::Info => message.message.normal(),
					};
					println!("{} {text}", message.timestamp.format("%H:%M:%S").to_string().dimmed());
				}
			}
		}
	}
}
