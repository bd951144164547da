use std::path::Path;
use std::time::Duration;

use draftsmith::model::{FormatStyle, GenerationRequest, HistoryQuery, TopicRequest};
use draftsmith::{ArtifactKind, DocumentService, JobStatus};
use serde::Serialize;

use crate::{Command, TemplateCommand};

const WAIT_POLL: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("No config path given and no platform config directory found")]
    NoConfigPath,

    #[error(transparent)]
    Draftsmith(#[from] draftsmith::DraftsmithError),

    #[error(transparent)]
    Config(#[from] draftsmith::error::ConfigError),

    #[error(transparent)]
    Logging(#[from] draftsmith::telemetry::TelemetryError),

    #[error(transparent)]
    Worker(#[from] draftsmith::error::WorkerError),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Unknown format style '{0}' (expected bullets, bullets-paragraph or paragraph)")]
    UnknownStyle(String),

    #[error("Got {styles} styles for {topics} topics; give one style or one per topic")]
    StyleCount { styles: usize, topics: usize },

    #[error("Job {id} failed: {error}")]
    JobFailed { id: String, error: String },
}

pub fn execute(service: &DocumentService, owner: &str, command: Command) -> Result<(), CliError> {
    match command {
        Command::Template { action } => template(service, owner, action),
        Command::Generate {
            template,
            topics,
            styles,
            pages,
            wait,
        } => generate(service, owner, template, topics, styles, pages, wait),
        Command::Job { id } => print_json(&service.job(owner, &id)?),
        Command::Artifact { id, primary } => {
            let kind = if primary {
                ArtifactKind::Primary
            } else {
                ArtifactKind::Converted
            };
            let path = service.artifact(owner, &id, kind)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::History { page, limit } => {
            let query = HistoryQuery::new(page, limit).map_err(draftsmith::DraftsmithError::from)?;
            print_json(&service.history(owner, query)?)
        }
        Command::Stats => print_json(&service.stats(owner)?),
    }
}

fn template(service: &DocumentService, owner: &str, action: TemplateCommand) -> Result<(), CliError> {
    match action {
        TemplateCommand::Add { file, name } => {
            let content = std::fs::read(&file).map_err(|e| CliError::ReadFile {
                path: file.display().to_string(),
                source: e,
            })?;
            let original_name = name.unwrap_or_else(|| file_name(&file));
            let template = service.ingest_template(owner, &original_name, &content)?;
            print_json(&template)
        }
        TemplateCommand::List => {
            let templates = service.list_templates(owner)?;
            if templates.is_empty() {
                println!("No templates.");
            }
            for t in templates {
                println!(
                    "{}  {:<30}  {:>2} section(s)  used {}x",
                    t.id,
                    t.original_name,
                    t.sections.len(),
                    t.usage.times_used
                );
            }
            Ok(())
        }
        TemplateCommand::Show { id } => print_json(&service.template(owner, &id)?),
        TemplateCommand::Remove { id } => {
            service.delete_template(owner, &id)?;
            println!("Deleted template {}", id);
            Ok(())
        }
    }
}

fn generate(
    service: &DocumentService,
    owner: &str,
    template_id: String,
    topics: Vec<String>,
    styles: Vec<String>,
    pages: u32,
    wait: bool,
) -> Result<(), CliError> {
    let styles = styles
        .iter()
        .map(|s| FormatStyle::parse(s).ok_or_else(|| CliError::UnknownStyle(s.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let topics = match styles.as_slice() {
        [style] => topics
            .into_iter()
            .map(|name| TopicRequest { name, style: *style })
            .collect(),
        many if many.len() == topics.len() => topics
            .into_iter()
            .zip(many.iter().copied())
            .map(|(name, style)| TopicRequest { name, style })
            .collect(),
        many => {
            return Err(CliError::StyleCount {
                styles: many.len(),
                topics: topics.len(),
            })
        }
    };

    let request = GenerationRequest {
        template_id,
        topics,
        requested_pages: pages,
    };
    let accepted = service.request_generation(owner, &request)?;
    print_json(&accepted)?;

    // The workers live in this process, so the job has to finish before exit.
    let handle = accepted.handle;
    let outcome = loop {
        match handle.wait_timeout(WAIT_POLL)? {
            Some(outcome) => break outcome,
            None => log::info!("Job {} still running...", handle.job_id()),
        }
    };

    if outcome.status == JobStatus::Failed {
        return Err(CliError::JobFailed {
            id: outcome.job_id,
            error: outcome.error.unwrap_or_default(),
        });
    }
    if wait {
        print_json(&service.job(owner, &outcome.job_id)?)?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
