use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Maintenance calendar and kanban board client", long_about = None)]
pub struct Cli {
    /// Base URL of the maintenance API (overrides config and GEARGUARD_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the TUI on the calendar
    Tui,
    /// Open the TUI on the calendar at a given month
    Calendar {
        /// Month to display, as YYYY-MM
        #[arg(short, long, value_name = "YYYY-MM")]
        month: Option<String>,
    },
    /// Open the TUI on the kanban board
    Kanban {
        /// Board payload file ({"tasks": [...]})
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,
    },
    /// Print a month grid with its scheduled tasks
    Month {
        #[arg(short, long, value_name = "YYYY-MM")]
        month: Option<String>,
    },
    /// List technicians
    Technicians,
    /// List requests
    Requests,
    /// Create a maintenance request
    Create {
        /// Scheduled date, YYYY-MM-DD
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: String,
        #[arg(short, long)]
        subject: Option<String>,
        /// Technician id
        #[arg(short, long, value_name = "ID")]
        technician: Option<i64>,
        /// CORRECTIVE or PREVENTIVE
        #[arg(long = "type", value_name = "TYPE", default_value = "CORRECTIVE")]
        request_type: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<String>,
    },
    /// Move a task to another status
    Move {
        #[arg(value_name = "TASK_ID")]
        task_id: i64,
        #[arg(value_name = "STATUS")]
        status: String,
    },
    /// Set a config value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get a config value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List all config values
    ConfigList,
    /// Delete a config value
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
