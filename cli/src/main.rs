mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::CliError;

#[derive(Parser, Debug)]
#[command(name = "draftsmith", version, about = "Generate documents from section templates")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Owner all templates and jobs are scoped to
    #[arg(long, global = true, default_value = "local")]
    pub owner: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },

    /// Request a document
    Generate {
        /// Template ID
        #[arg(short, long)]
        template: String,

        /// Topic to write about; repeat for several topics
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,

        /// Format style: one for all topics, or one per topic
        #[arg(long = "style", default_value = "paragraph")]
        styles: Vec<String>,

        /// Target length in pages
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Print the finished job, not only the acknowledgment
        #[arg(long)]
        wait: bool,
    },

    /// Show a job with its generated sections
    Job {
        id: String,
    },

    /// Print the path of a completed job's document
    Artifact {
        id: String,

        /// Return the filled template instead of the converted document
        #[arg(long)]
        primary: bool,
    },

    /// List past jobs, newest first
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Job counts and word totals
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Upload a template file
    Add {
        file: PathBuf,

        /// Name to record instead of the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// List templates
    List,
    /// Show one template
    Show { id: String },
    /// Delete a template and its file
    Remove { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => draftsmith::config::default_config_path().ok_or(CliError::NoConfigPath)?,
    };
    let config = draftsmith::load_config(&config_path)?;
    draftsmith::init_logging(&config.logging)?;

    log::debug!("Loaded config from {}", config_path.display());

    let service = draftsmith::DocumentService::from_config(&config)?;
    let result = commands::execute(&service, &cli.owner, cli.command);
    service.shutdown();
    result
}
