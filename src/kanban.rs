use chrono::{DateTime, Local};
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{KanbanPayload, Task, TaskStatus, TaskType};

/// Read the board seed document (`{ "tasks": [...] }`).
pub fn load_payload(path: &Path) -> Result<Vec<Task>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read kanban payload {}", path.display()))?;
    let payload: KanbanPayload = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse kanban payload {}", path.display()))?;
    Ok(payload.tasks)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskState {
    pub is_overdue: bool,
    pub show_warning: bool,
}

pub fn task_state(task: &Task, now: DateTime<Local>) -> TaskState {
    let is_overdue = task.due_instant().is_some_and(|due| now > due);
    TaskState {
        is_overdue,
        show_warning: is_overdue && !task.status.is_finished(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardColor {
    Orange,
    Purple,
    Gray,
}

pub fn card_color(task_type: &TaskType) -> CardColor {
    match task_type {
        TaskType::Corrective => CardColor::Orange,
        TaskType::Preventive => CardColor::Purple,
        TaskType::Other(_) => CardColor::Gray,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub cards: Vec<&'a Task>,
}

/// Partition tasks into the six fixed columns plus one column per unknown status.
pub fn group_by_status(tasks: &[Task]) -> Vec<Column<'_>> {
    let mut columns: Vec<Column> = TaskStatus::COLUMNS
        .iter()
        .map(|status| Column { status: status.clone(), cards: Vec::new() })
        .collect();
    for task in tasks {
        match columns.iter_mut().find(|c| c.status == task.status) {
            Some(column) => column.cards.push(task),
            None => columns.push(Column { status: task.status.clone(), cards: vec![task] }),
        }
    }
    columns
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveState {
    Pending,
    Confirmed,
    Failed(String),
}

/// An optimistic status change; `from` is the status before the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCommand {
    pub id: u64,
    pub task_id: i64,
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub state: MoveState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(i64),
    /// Hovering a column; `None` when the pointer is over no column.
    Over(Option<TaskStatus>),
    Drop(Option<TaskStatus>),
    End,
}

#[derive(Debug, Default)]
pub struct Board {
    tasks: Vec<Task>,
    dragging: Option<i64>,
    hover: Option<TaskStatus>,
    commands: Vec<MoveCommand>,
    next_command: u64,
}

impl Board {
    pub fn new(tasks: Vec<Task>) -> Self {
        Board { tasks, ..Board::default() }
    }

    #[cfg(test)]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn columns(&self) -> Vec<Column<'_>> {
        group_by_status(&self.tasks)
    }

    pub fn dragging(&self) -> Option<i64> {
        self.dragging
    }

    pub fn hover(&self) -> Option<&TaskStatus> {
        self.hover.as_ref()
    }

    pub fn commands(&self) -> &[MoveCommand] {
        &self.commands
    }

    /// Feed one drag event; a drop on a column yields the move to persist.
    pub fn handle_drag(&mut self, event: DragEvent) -> Option<MoveCommand> {
        match event {
            DragEvent::Start(task_id) => {
                // last write wins
                self.dragging = Some(task_id);
                self.hover = None;
                None
            }
            DragEvent::Over(status) => {
                if self.dragging.is_some() {
                    self.hover = status;
                }
                None
            }
            DragEvent::Drop(status) => {
                let status = status?;
                let task_id = self.dragging.take()?;
                self.move_task(task_id, status)
            }
            DragEvent::End => {
                self.dragging = None;
                self.hover = None;
                None
            }
        }
    }

    /// Apply a status change locally right away. Unknown ids are a no-op.
    pub fn move_task(&mut self, task_id: i64, new_status: TaskStatus) -> Option<MoveCommand> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        let from = std::mem::replace(&mut task.status, new_status.clone());

        self.next_command += 1;
        let command = MoveCommand {
            id: self.next_command,
            task_id,
            from,
            to: new_status,
            state: MoveState::Pending,
        };
        log::debug!("moving task {} from {} to {}", task_id, command.from, command.to);
        self.commands.push(command.clone());
        Some(command)
    }

    /// Record the server outcome of a move. Failures are logged only; the
    /// local change stays in place.
    pub fn settle(&mut self, command_id: u64, outcome: Result<(), String>) {
        let Some(command) = self.commands.iter_mut().find(|c| c.id == command_id) else {
            return;
        };
        command.state = match outcome {
            Ok(()) => MoveState::Confirmed,
            Err(reason) => {
                log::warn!(
                    "failed to persist move of task {} to {}: {}",
                    command.task_id, command.to, reason
                );
                MoveState::Failed(reason)
            }
        };
    }
}
