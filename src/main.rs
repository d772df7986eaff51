//! # Cadence
//!
//! A terminal planner for recurring tasks. Templates describe what repeats and
//! how often; occurrences are computed on demand for whatever window you ask
//! for, and single occurrences can be edited, moved through their workflow or
//! skipped without touching the rest of the series.
//!
//! ## Usage
//!
//! ```bash
//! # Weekly review every Monday, three times
//! cadence template add "Weekly review" --recur weekly --start 2024-01-01 --after 3
//!
//! # What is due in the next two weeks
//! cadence agenda
//!
//! # Mark one occurrence as done
//! cadence instance move 1 2024-01-08 --status in_progress
//! cadence instance move 1_2024-01-08 --status completed
//!
//! # Skip one occurrence
//! cadence instance edit 1 2024-01-15 --skip
//! ```
//!
//! ## Data Storage
//!
//! Templates and occurrence edits are saved in your local data directory:
//! *   Linux: `~/.local/share/cadence/`
//! *   macOS: `~/Library/Application Support/cadence/`
//! *   Windows: `%APPDATA%\cadence\`
//!
//! You can override this by setting the `CADENCE_DATA_DIR` environment variable.
//! Log output is controlled by `CADENCE_LOG` (e.g. `CADENCE_LOG=debug`).

use std::io;
use std::process::ExitCode;

use cadence::commands::*;
use cadence::config::{Config, LOG_ENV};
use cadence::error::Result;
use cadence::models::{Frequency, Priority, TaskStatus};
use cadence::storage::Store;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Recurring task planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage task templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Show occurrences in a date window
    Agenda {
        /// First day, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD (default: end of the agenda window)
        #[arg(short, long)]
        to: Option<String>,
        /// Include skipped occurrences
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a single occurrence
    Instance {
        #[command(subcommand)]
        command: InstanceCommands,
    },
    /// Delete occurrence edits dated before a cutoff
    Prune {
        /// Cutoff date in YYYY-MM-DD
        #[arg(short, long)]
        before: String,
    },
    /// Reset the database (delete all templates and edits)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Args)]
struct TemplateArgs {
    /// Longer description
    #[arg(short, long)]
    description: Option<String>,
    /// low, medium, high or urgent
    #[arg(short, long)]
    priority: Option<Priority>,
    /// Initial status of each occurrence
    #[arg(short, long)]
    status: Option<TaskStatus>,
    /// Assignee (repeatable)
    #[arg(short = 'A', long = "assignee")]
    assignees: Vec<String>,
    /// Recurrence (daily, weekly, monthly, yearly)
    #[arg(short, long)]
    recur: Option<Frequency>,
    /// Repeat every N periods
    #[arg(short, long)]
    interval: Option<i64>,
    /// First occurrence in YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,
    /// Stop after N occurrences
    #[arg(long)]
    after: Option<i64>,
    /// Last possible occurrence in YYYY-MM-DD
    #[arg(long)]
    until: Option<String>,
}

impl TemplateArgs {
    fn into_fields(self, title: Option<String>, created_by: Option<String>, no_recur: bool) -> TemplateFields {
        TemplateFields {
            title,
            description: self.description,
            priority: self.priority,
            status: self.status,
            assignees: if self.assignees.is_empty() { None } else { Some(self.assignees) },
            created_by,
            recur: self.recur,
            interval: self.interval,
            start: self.start,
            after: self.after,
            until: self.until,
            no_recur,
        }
    }
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a new template
    Add {
        /// Template title (quoted if it has spaces)
        title: String,
        /// Owner of the template
        #[arg(long)]
        created_by: Option<String>,
        #[command(flatten)]
        fields: TemplateArgs,
    },
    /// List templates
    List,
    /// Edit a template
    Edit {
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Stop repeating
        #[arg(long, conflicts_with_all = ["recur", "interval", "start", "after", "until"])]
        no_recur: bool,
        #[command(flatten)]
        fields: TemplateArgs,
    },
    /// Remove a template and its occurrence edits
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum InstanceCommands {
    /// Change fields of one occurrence
    Edit {
        /// Template id, or an instance id such as 3_2024-01-08
        target: String,
        /// Occurrence date in YYYY-MM-DD (omit when TARGET is an instance id)
        date: Option<String>,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description from this occurrence
        #[arg(long)]
        clear_description: bool,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Assignee (repeatable, replaces the template's list)
        #[arg(short = 'A', long = "assignee")]
        assignees: Vec<String>,
        /// Hide this occurrence
        #[arg(long, conflicts_with = "unskip")]
        skip: bool,
        /// Show a previously skipped occurrence again
        #[arg(long)]
        unskip: bool,
    },
    /// Move one occurrence to a new status
    Move {
        /// Template id, or an instance id such as 3_2024-01-08
        target: String,
        /// Occurrence date in YYYY-MM-DD (omit when TARGET is an instance id)
        date: Option<String>,
        /// todo, in_progress, completed or cancelled
        #[arg(short, long)]
        status: TaskStatus,
    },
    /// Drop all edits for one occurrence
    Reset {
        /// Template id, or an instance id such as 3_2024-01-08
        target: String,
        /// Occurrence date in YYYY-MM-DD (omit when TARGET is an instance id)
        date: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let store = Store::new(&config.data_dir);

    match cli.command {
        Commands::Template { command } => match command {
            TemplateCommands::Add { title, created_by, fields } => {
                cmd_template_add(&store, fields.into_fields(Some(title), created_by, false), false).map(|_| ())
            }
            TemplateCommands::List => cmd_template_list(&store),
            TemplateCommands::Edit { id, title, no_recur, fields } => {
                cmd_template_edit(&store, &id, fields.into_fields(title, None, no_recur), false)
            }
            TemplateCommands::Remove { id } => cmd_template_remove(&store, &id, false),
        },
        Commands::Agenda { from, to, all } => cmd_agenda(&store, &config, from, to, all),
        Commands::Instance { command } => match command {
            InstanceCommands::Edit {
                target, date, title, description, clear_description, status, priority, assignees, skip, unskip,
            } => {
                let edit = InstanceEdit {
                    title,
                    description: if clear_description { Some(None) } else { description.map(Some) },
                    status,
                    priority,
                    assignees: if assignees.is_empty() { None } else { Some(assignees) },
                    skipped: if skip { Some(true) } else if unskip { Some(false) } else { None },
                };
                cmd_instance_edit(&store, &target, date.as_deref(), edit, false).map(|_| ())
            }
            InstanceCommands::Move { target, date, status } => {
                cmd_instance_move(&store, &target, date.as_deref(), status, false).map(|_| ())
            }
            InstanceCommands::Reset { target, date } => {
                cmd_instance_reset(&store, &target, date.as_deref(), false).map(|_| ())
            }
        },
        Commands::Prune { before } => cmd_prune(&store, &before, false).map(|_| ()),
        Commands::Reset { force } => cmd_reset(&store, force),
        Commands::Completions { shell } => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "cadence", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
