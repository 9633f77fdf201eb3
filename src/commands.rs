use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fmt::Write as _;

use crate::api::ApiClient;
use crate::app::{CREATED_MESSAGE, CREATE_FAILED_MESSAGE};
use crate::calendar::{build_grid, summarize_day, MonthCursor, WEEKDAY_NAMES};
use crate::cli::Commands;
use crate::database::Database;
use crate::form::RequestForm;
use crate::input::TextInput;
use crate::models::{MoveRequest, Task, TaskStatus, TaskType};

const CELL_WIDTH: usize = 14;

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

/// Text rendering of the month grid: day numbers, then each day's pills.
pub fn render_month_text(cursor: MonthCursor, tasks: &[Task], today: NaiveDate) -> String {
    let w = CELL_WIDTH;
    let cells = build_grid(cursor.year(), cursor.month0(), today);
    let mut out = String::new();
    let _ = writeln!(out, "{:^width$}", cursor.title(), width = CELL_WIDTH * 7);
    for name in WEEKDAY_NAMES {
        let _ = write!(out, "{name:<w$}");
    }
    out.push('\n');

    for row in cells.chunks(7) {
        for cell in row {
            let label = if cell.other_month {
                format!("({})", cell.day())
            } else if cell.today {
                format!("[{}]", cell.day())
            } else {
                cell.day().to_string()
            };
            let _ = write!(out, "{label:<w$}");
        }
        out.push('\n');
        // pill rows: up to three pills plus the overflow marker
        for line in 0..4 {
            let mut any = false;
            let mut text = String::new();
            for cell in row {
                let entry = if cell.is_interactive() {
                    let summary = summarize_day(tasks, cell.date);
                    match summary.pills.get(line) {
                        Some(task) => {
                            let marker = if task.task_type == TaskType::Corrective { '!' } else { '~' };
                            format!("{marker}{}", task.title)
                        }
                        None if line == summary.pills.len() => summary.overflow_label().unwrap_or_default(),
                        None => String::new(),
                    }
                } else {
                    String::new()
                };
                any |= !entry.is_empty();
                let entry: String = entry.chars().take(CELL_WIDTH - 1).collect();
                let _ = write!(text, "{entry:<w$}");
            }
            if any {
                out.push_str(text.trim_end());
                out.push('\n');
            }
        }
    }
    out
}

pub fn print_month(api: &ApiClient, cursor: MonthCursor, today: NaiveDate) -> Result<()> {
    let tasks = runtime()?.block_on(api.list_requests()).unwrap_or_else(|e| {
        log::warn!("Error loading tasks: {}", e);
        println!("Could not load tasks: {e}");
        Vec::new()
    });
    print!("{}", render_month_text(cursor, &tasks, today));
    Ok(())
}

pub fn list_technicians(api: &ApiClient) -> Result<()> {
    let technicians = runtime()?
        .block_on(api.list_technicians())
        .context("Failed to load technicians")?;
    if technicians.is_empty() {
        println!("No technicians found.");
        return Ok(());
    }
    println!("{:<6} NAME", "ID");
    for tech in technicians {
        println!("{:<6} {}", tech.id, tech.name);
    }
    Ok(())
}

pub fn list_requests(api: &ApiClient) -> Result<()> {
    let tasks = runtime()?
        .block_on(api.list_requests())
        .context("Failed to load requests")?;
    if tasks.is_empty() {
        println!("No requests found.");
        return Ok(());
    }
    println!("{:<6} {:<12} {:<14} {:<12} TITLE", "ID", "TYPE", "STATUS", "DATE");
    for task in tasks {
        let date = task
            .placement_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<6} {:<12} {:<14} {:<12} {}", task.id, task.task_type, task.status, date, task.title);
    }
    Ok(())
}

pub struct CreateArgs {
    pub date: String,
    pub subject: Option<String>,
    pub technician: Option<i64>,
    pub request_type: String,
    pub description: Option<String>,
    pub due: Option<String>,
}

/// Fill a request form from command-line values, using the same validation as the TUI.
pub fn form_from_args(args: &CreateArgs) -> Result<RequestForm> {
    let date = NaiveDate::parse_from_str(args.date.trim(), "%Y-%m-%d")
        .with_context(|| format!("--date must be YYYY-MM-DD, got '{}'", args.date))?;
    let request_type = match TaskType::from(args.request_type.trim().to_uppercase()) {
        t @ (TaskType::Corrective | TaskType::Preventive) => t,
        TaskType::Other(other) => bail!("unknown request type '{other}', expected CORRECTIVE or PREVENTIVE"),
    };

    let mut form = RequestForm::new(date);
    form.subject = TextInput::new(args.subject.clone().unwrap_or_default());
    form.description = TextInput::new(args.description.clone().unwrap_or_default());
    form.due_date = TextInput::new(args.due.clone().unwrap_or_default());
    form.request_type = request_type;
    form.select_technician(args.technician);
    Ok(form)
}

pub fn create_request(api: &ApiClient, args: &CreateArgs) -> Result<()> {
    let mut form = form_from_args(args)?;
    let Some(request) = form.submit() else {
        for message in [form.errors.subject, form.errors.technician, form.errors.due_date]
            .into_iter()
            .flatten()
        {
            println!("Error: {message}");
        }
        return Ok(());
    };

    match runtime()?.block_on(api.create_request(&request)) {
        Ok(response) if response.success => println!("{CREATED_MESSAGE}"),
        Ok(response) => println!(
            "Error: {}",
            response.message.unwrap_or_else(|| "Failed to create request".to_string())
        ),
        Err(e) => {
            log::error!("Error creating request: {}", e);
            println!("{CREATE_FAILED_MESSAGE}");
        }
    }
    Ok(())
}

pub fn move_task(api: &ApiClient, task_id: i64, status: &str) -> Result<()> {
    let new_status = TaskStatus::from(status.trim().to_uppercase());
    if let TaskStatus::Other(s) = &new_status {
        log::warn!("moving task {} to unrecognized status '{}'", task_id, s);
    }
    let request = MoveRequest { task_id, new_status };
    runtime()?
        .block_on(api.move_task(&request))
        .with_context(|| format!("Failed to move task {task_id}"))?;
    println!("Task {} moved to {}", task_id, request.new_status);
    Ok(())
}

pub fn set_config(db: &Database, key: &str, value: &str) -> Result<()> {
    db.set_config(key, value)?;
    println!("Config '{}' set to '{}'", key, value);
    Ok(())
}

pub fn get_config(db: &Database, key: &str) -> Result<()> {
    match db.get_config(key)? {
        Some(value) => println!("{}", value),
        None => println!("Config '{}' not found", key),
    }
    Ok(())
}

pub fn list_configs(db: &Database) -> Result<()> {
    let configs = db.get_all_configs()?;
    if configs.is_empty() {
        println!("No configs stored.");
        return Ok(());
    }
    for config in configs {
        match config.description {
            Some(desc) => println!("{} = {}    # {}", config.key_name, config.value, desc),
            None => println!("{} = {}", config.key_name, config.value),
        }
    }
    Ok(())
}

pub fn delete_config(db: &Database, key: &str) -> Result<()> {
    if db.delete_config(key)? {
        println!("Config '{}' deleted", key);
    } else {
        println!("Config '{}' not found", key);
    }
    Ok(())
}

/// Run a config-store command. Returns false for commands that need the API or the TUI.
pub fn run_config_command(db: &Database, command: &Commands) -> Result<bool> {
    match command {
        Commands::Set { key, value } => set_config(db, key, value)?,
        Commands::Get { key } => get_config(db, key)?,
        Commands::ConfigList => list_configs(db)?,
        Commands::ConfigDelete { key } => delete_config(db, key)?,
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, task_type: TaskType, day: &str) -> Task {
        Task {
            id,
            title: format!("Job{id}"),
            task_type,
            status: TaskStatus::New,
            scheduled_date: Some(day.to_string()),
            due_date: None,
            description: None,
        }
    }

    fn args() -> CreateArgs {
        CreateArgs {
            date: "2026-10-21".into(),
            subject: Some("Belt".into()),
            technician: Some(2),
            request_type: "preventive".into(),
            description: None,
            due: None,
        }
    }

    #[test]
    fn month_text_lists_pills_and_overflow() {
        let tasks: Vec<Task> = vec![
            task(1, TaskType::Preventive, "2026-10-06"),
            task(2, TaskType::Corrective, "2026-10-06"),
            task(3, TaskType::Corrective, "2026-10-06"),
            task(4, TaskType::Corrective, "2026-10-06"),
            task(5, TaskType::Corrective, "2026-09-29"),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let text = render_month_text(MonthCursor::new(2026, 9).unwrap(), &tasks, today);
        assert!(text.contains("October 2026"));
        assert!(text.contains("[19]"));
        assert!(text.contains("(30)"));
        assert!(text.contains("!Job2"));
        assert!(text.contains("+1 more"));
        assert!(!text.contains("~Job1"));
        // other-month days show no tasks
        assert!(!text.contains("Job5"));
    }

    #[test]
    fn cli_values_fill_the_form() {
        let mut form = form_from_args(&args()).unwrap();
        let request = form.submit().unwrap();
        assert_eq!(request.task_type, TaskType::Preventive);
        assert_eq!(request.status, TaskStatus::NewRequest);
        assert_eq!(request.technician_id, 2);
        assert_eq!(request.scheduled_date, "2026-10-21");
    }

    #[test]
    fn cli_create_reports_missing_fields() {
        let mut a = args();
        a.subject = None;
        a.technician = None;
        let mut form = form_from_args(&a).unwrap();
        assert!(form.submit().is_none());
        assert!(form.errors.subject.is_some());
        assert!(form.errors.technician.is_some());
    }

    #[test]
    fn config_commands_repair_a_bad_stored_value() {
        let db = Database::in_memory().unwrap();
        db.raw_set("toast_secs", "soon");

        let set = Commands::Set { key: "toast_secs".into(), value: "3".into() };
        assert!(run_config_command(&db, &set).unwrap());
        assert_eq!(db.get_config("toast_secs").unwrap().as_deref(), Some("3"));

        db.raw_set("toast_secs", "soon");
        let delete = Commands::ConfigDelete { key: "toast_secs".into() };
        assert!(run_config_command(&db, &delete).unwrap());
        assert_eq!(db.get_config("toast_secs").unwrap(), None);

        let bad = Commands::Set { key: "toast_secs".into(), value: "soon".into() };
        assert!(run_config_command(&db, &bad).is_err());
        assert!(!run_config_command(&db, &Commands::Requests).unwrap());
    }

    #[test]
    fn cli_rejects_bad_date_and_type() {
        let mut a = args();
        a.date = "21/10/2026".into();
        assert!(form_from_args(&a).is_err());
        let mut a = args();
        a.request_type = "urgent".into();
        assert!(form_from_args(&a).is_err());
    }
}
