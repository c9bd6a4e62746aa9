//! # Planust
//!
//! A terminal front end for the planust scheduling engine: a task board with
//! a priority-ordered backlog, a "My Day" focus list, a 30-minute day planner
//! and recurring tasks.
//!
//! ## Usage
//!
//! ```bash
//! # Add a task; dates take ISO, shorthand or phrases
//! planust add "Write report" --project Work --due "next friday" --estimate 90
//!
//! # Free text, the date phrase becomes the due date
//! planust quick "call the bank tomorrow"
//!
//! # Put task 3 on today's grid at 9:30 and stretch it by an hour
//! planust schedule 3 930
//! planust resize 3 2
//!
//! # Recurring work
//! planust add "Team standup" --start T --recur daily
//! planust recur 4 --count 10
//! ```
//!
//! ## Configuration
//!
//! * `PLANUST_DB`: path of the JSON database (default: the XDG data directory).
//! * `PLANUST_DATE_ORDER`: `dmy` or `mdy` to override the locale probe.
//! * `PLANUST_LOG`: log filter, e.g. `debug` (default `warn`).

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::EnvFilter;

use planust::commands::*;
use planust::config::Config;

#[derive(Parser)]
#[command(name = "planust")]
#[command(about = "Task board with a day planner and recurring tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Project or category
        #[arg(short, long)]
        project: Option<String>,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
        /// Due date: YYYY-MM-DD, shorthand (T+3, W+1) or a phrase ("next friday")
        #[arg(short, long)]
        due: Option<String>,
        /// Start date, same formats as --due
        #[arg(short, long)]
        start: Option<String>,
        /// Mark as critical
        #[arg(short, long)]
        critical: bool,
        /// Energy level (low, medium, high)
        #[arg(short, long)]
        energy: Option<String>,
        /// Time estimate in minutes
        #[arg(short = 'm', long)]
        estimate: Option<u32>,
        /// Recurrence (daily, weekly, biweekly, monthly)
        #[arg(short, long)]
        recur: Option<String>,
        /// Ids of tasks this one waits for
        #[arg(long, value_delimiter = ',')]
        depends: Vec<u64>,
    },
    /// Add a task from free text, e.g. "dentist next tuesday"
    Quick {
        text: Vec<String>,
    },
    /// List tasks in priority order
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Only the backlog, tasks that cannot start yet last
        #[arg(short, long)]
        backlog: bool,
    },
    /// Show today's focus list
    Today,
    /// Add a task to My Day, or dismiss it
    Focus {
        id: u64,
        /// Hide from today's list instead
        #[arg(short, long)]
        dismiss: bool,
    },
    /// Mark a task as complete
    Complete {
        id: u64,
    },
    /// Move tasks to a status (backlog, todo, in_progress, done)
    Status {
        status: String,
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Remove a task
    Remove {
        id: u64,
        /// Also remove later occurrences of the same series
        #[arg(short, long)]
        series: bool,
    },
    /// Edit a task; pass an empty string to clear a field
    Edit {
        id: u64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        start: Option<String>,
        #[arg(short, long)]
        critical: Option<bool>,
        #[arg(short, long)]
        energy: Option<String>,
        #[arg(short = 'm', long)]
        estimate: Option<u32>,
        #[arg(short, long)]
        recur: Option<String>,
        #[arg(long, value_delimiter = ',')]
        depends: Option<Vec<u64>>,
    },
    /// Place a task on the day grid at a time (930, 2:30pm) or slot (@18)
    Schedule {
        id: u64,
        at: String,
        /// Day to schedule on (default today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Grow or shrink a task by half-hour slots
    Resize {
        id: u64,
        #[arg(allow_hyphen_values = true)]
        slots: i32,
    },
    /// Take a task off the grid
    Unschedule {
        id: u64,
    },
    /// Pre-generate occurrences of a recurring task
    Recur {
        id: u64,
        /// Number of occurrences (default depends on the pattern)
        #[arg(short, long)]
        count: Option<u32>,
        /// Generate up to and including this date
        #[arg(short, long)]
        until: Option<String>,
    },
    /// Show the day grid
    Day {
        date: Option<String>,
    },
    /// Show how text is read as a date or time
    Parse {
        text: Vec<String>,
    },
    /// Reset the database (delete all tasks)
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

fn init_logging() {
    let filter = EnvFilter::try_from_env("PLANUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let cfg = Config::from_env();

    let result = match cli.command {
        Some(Commands::Add { title, project, notes, due, start, critical, energy, estimate, recur, depends }) => {
            let args = AddArgs { title, project, notes, due, start, critical, energy, estimate, recur, depends };
            cmd_add(&cfg, args, false).map(|_| ())
        }
        Some(Commands::Quick { text }) => cmd_quick_add(&cfg, &text.join(" "), false).map(|_| ()),
        Some(Commands::List { all, backlog }) => cmd_list(&cfg, all, backlog),
        Some(Commands::Today) | None => cmd_my_day(&cfg),
        Some(Commands::Focus { id, dismiss }) => cmd_focus(&cfg, id, dismiss, false),
        Some(Commands::Complete { id }) => cmd_complete(&cfg, id, false),
        Some(Commands::Status { status, ids }) => cmd_status(&cfg, &ids, &status, false),
        Some(Commands::Remove { id, series }) => cmd_remove(&cfg, id, series, false),
        Some(Commands::Edit { id, title, project, notes, due, start, critical, energy, estimate, recur, depends }) => {
            let args = EditArgs { title, project, notes, due, start, critical, energy, estimate, recur, depends };
            cmd_edit(&cfg, id, args, false)
        }
        Some(Commands::Schedule { id, at, date }) => cmd_schedule(&cfg, id, &at, date.as_deref(), false),
        Some(Commands::Resize { id, slots }) => cmd_resize(&cfg, id, slots, false),
        Some(Commands::Unschedule { id }) => cmd_unschedule(&cfg, id, false),
        Some(Commands::Recur { id, count, until }) => cmd_recur(&cfg, id, count, until.as_deref(), false),
        Some(Commands::Day { date }) => cmd_day(&cfg, date.as_deref()),
        Some(Commands::Parse { text }) => cmd_parse(&cfg, &text.join(" ")),
        Some(Commands::Reset { force }) => cmd_reset(&cfg, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "planust", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
