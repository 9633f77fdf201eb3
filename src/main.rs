mod api;
mod app;
mod calendar;
mod cli;
mod commands;
mod config;
mod database;
mod form;
mod input;
mod kanban;
mod logging;
mod models;
mod ui;

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser};

use api::ApiClient;
use app::App;
use calendar::{parse_month_arg, MonthCursor};
use cli::{Cli, Commands};
use commands::CreateArgs;
use config::{Overrides, Settings};
use database::{default_db_path, Database};
use models::View;
use ui::run_tui;

fn month_or_current(month: Option<&str>) -> Option<MonthCursor> {
    let today = Local::now().date_naive();
    match month {
        Some(raw) => parse_month_arg(raw),
        None => Some(MonthCursor::containing(today)),
    }
}

fn launch_tui(view: View, month: MonthCursor, settings: &Settings, db: &Database, api: ApiClient) -> Result<()> {
    let kanban_tasks = match &settings.kanban_data {
        Some(path) => kanban::load_payload(path).unwrap_or_else(|e| {
            log::warn!("Could not load kanban data: {:#}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    let configs = db.get_all_configs()?;
    let (app, effects) = App::new(
        view,
        month,
        Local::now().date_naive(),
        kanban_tasks,
        configs,
        settings.toast,
    );
    run_tui(app, effects, api)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        use clap_complete::{generate, Shell};
        let shell = shell.to_lowercase();
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "elvish" => Shell::Elvish,
            "powershell" => Shell::PowerShell,
            _ => {
                println!("Unsupported shell: {}", shell);
                return Ok(());
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "gear-guard", &mut std::io::stdout());
        return Ok(());
    }

    let db = Database::open(&default_db_path())?;
    // config commands must work even when a stored value is unusable
    if let Some(command) = &cli.command {
        if commands::run_config_command(&db, command)? {
            return Ok(());
        }
    }

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        kanban_data: match &cli.command {
            Some(Commands::Kanban { data }) => data.clone(),
            _ => None,
        },
    };
    let settings = Settings::load(&db, &overrides)?;
    let _log_guard = logging::init(&settings.log_file)?;
    log::info!("gear-guard starting against {}", settings.base_url);

    let api = ApiClient::new(settings.base_url.clone(), settings.request_timeout)?;
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Calendar { month }) => {
            let Some(cursor) = month_or_current(month.as_deref()) else {
                println!("Error: --month must be YYYY-MM");
                return Ok(());
            };
            launch_tui(View::Calendar, cursor, &settings, &db, api)?;
        }
        Some(Commands::Kanban { .. }) => {
            launch_tui(View::Kanban, MonthCursor::containing(today), &settings, &db, api)?;
        }
        Some(Commands::Month { month }) => {
            let Some(cursor) = month_or_current(month.as_deref()) else {
                println!("Error: --month must be YYYY-MM");
                return Ok(());
            };
            commands::print_month(&api, cursor, today)?;
        }
        Some(Commands::Technicians) => {
            commands::list_technicians(&api)?;
        }
        Some(Commands::Requests) => {
            commands::list_requests(&api)?;
        }
        Some(Commands::Create { date, subject, technician, request_type, description, due }) => {
            let args = CreateArgs { date, subject, technician, request_type, description, due };
            commands::create_request(&api, &args)?;
        }
        Some(Commands::Move { task_id, status }) => {
            commands::move_task(&api, task_id, &status)?;
        }
        Some(
            Commands::Set { .. }
            | Commands::Get { .. }
            | Commands::ConfigList
            | Commands::ConfigDelete { .. }
            | Commands::Completions { .. },
        ) => {}
        Some(Commands::Tui) | None => {
            launch_tui(View::Calendar, MonthCursor::containing(today), &settings, &db, api)?;
        }
    }

    Ok(())
}
