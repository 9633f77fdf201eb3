use chrono::{Datelike, Duration as DateDuration, NaiveDate};
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::calendar::MonthCursor;
use crate::form::{FormField, RequestForm};
use crate::kanban::{Board, DragEvent, MoveCommand};
use crate::models::{ConfigItem, CreateRequest, CreateResponse, Task, TaskStatus, Technician, View};

pub const CREATED_MESSAGE: &str = "Request Created Successfully!";
pub const CREATE_FAILED_MESSAGE: &str = "Error creating request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        now.duration_since(self.shown_at) >= lifetime
    }
}

/// Work the runner performs outside the update step.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchTechnicians,
    FetchTasks,
    CreateRequest(CreateRequest),
    PersistMove(MoveCommand),
}

/// Everything that can change application state.
#[derive(Debug)]
pub enum AppEvent {
    SwitchView(View),
    NextView,
    PreviousView,
    Reload,
    Quit,
    Tick(Instant),

    PreviousMonth,
    NextMonth,
    /// Move the day cursor by a number of days, staying in the displayed month.
    MoveDayCursor(i64),
    /// Click on a grid cell (the cursor cell when `None`).
    ActivateDay(Option<NaiveDate>),

    FormInput(char),
    FormBackspace,
    FormDelete,
    FormCursorLeft,
    FormCursorRight,
    FormHome,
    FormEnd,
    FormNextField,
    FormPreviousField,
    FormPickerUp,
    FormPickerDown,
    FormSubmit,
    CloseForm,

    FocusColumn(i64),
    FocusCard(i64),
    /// Keyboard drag: pick up the focused card, or drop it on the hovered column.
    GrabOrDrop,
    Drag(DragEvent),

    ConfigNext,
    ConfigPrevious,

    TechniciansLoaded(Result<Vec<Technician>, ApiError>),
    TasksLoaded(Result<Vec<Task>, ApiError>),
    RequestCreated(Result<CreateResponse, ApiError>),
    MoveSettled { command_id: u64, outcome: Result<(), String> },
}

#[derive(Debug)]
pub struct CalendarState {
    pub month: MonthCursor,
    pub tasks: Vec<Task>,
    pub technicians: Vec<Technician>,
    pub cursor: NaiveDate,
    pub today: NaiveDate,
}

impl CalendarState {
    pub fn new(month: MonthCursor, today: NaiveDate) -> Self {
        let cursor = if month.contains(today) { today } else { month.first_day() };
        CalendarState { month, tasks: Vec::new(), technicians: Vec::new(), cursor, today }
    }

    fn show_month(&mut self, month: MonthCursor) {
        self.month = month;
        // keep the same day number where the month allows it
        let day = self.cursor.day();
        self.cursor = (0..4)
            .find_map(|back| month.first_day().with_day(day.saturating_sub(back)))
            .unwrap_or(month.first_day());
    }
}

#[derive(Debug, Default)]
pub struct KanbanFocus {
    pub column: usize,
    pub card: usize,
}

pub struct App {
    pub view: View,
    pub calendar: CalendarState,
    pub form: Option<RequestForm>,
    pub board: Board,
    pub kanban_focus: KanbanFocus,
    pub configs: Vec<ConfigItem>,
    pub config_selected: usize,
    pub toast: Option<Toast>,
    pub toast_lifetime: Duration,
    pub should_quit: bool,
    // bumped each time a form opens; identifies the open form
    form_opened: u64,
    /// The form whose create call is in flight.
    pub submitting: Option<u64>,
}

impl App {
    /// Build the controller and the effects that load its initial data.
    pub fn new(
        view: View,
        month: MonthCursor,
        today: NaiveDate,
        kanban_tasks: Vec<Task>,
        configs: Vec<ConfigItem>,
        toast_lifetime: Duration,
    ) -> (Self, Vec<Effect>) {
        let app = App {
            view,
            calendar: CalendarState::new(month, today),
            form: None,
            board: Board::new(kanban_tasks),
            kanban_focus: KanbanFocus::default(),
            configs,
            config_selected: 0,
            toast: None,
            toast_lifetime,
            should_quit: false,
            form_opened: 0,
            submitting: None,
        };
        (app, vec![Effect::FetchTechnicians, Effect::FetchTasks])
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast { message: message.into(), kind, shown_at: Instant::now() });
    }

    pub fn update(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::SwitchView(view) => self.view = view,
            AppEvent::NextView => self.view = self.view.next(),
            AppEvent::PreviousView => self.view = self.view.previous(),
            AppEvent::Reload => return vec![Effect::FetchTechnicians, Effect::FetchTasks],
            AppEvent::Quit => self.should_quit = true,
            AppEvent::Tick(now) => {
                if self.toast.as_ref().is_some_and(|t| t.is_expired(now, self.toast_lifetime)) {
                    self.toast = None;
                }
            }

            AppEvent::PreviousMonth => {
                let month = self.calendar.month.previous();
                self.calendar.show_month(month);
            }
            AppEvent::NextMonth => {
                let month = self.calendar.month.next();
                self.calendar.show_month(month);
            }
            AppEvent::MoveDayCursor(days) => {
                let target = self.calendar.cursor + DateDuration::days(days);
                if self.calendar.month.contains(target) {
                    self.calendar.cursor = target;
                }
            }
            AppEvent::ActivateDay(date) => {
                let date = date.unwrap_or(self.calendar.cursor);
                // other-month cells are not clickable
                if self.calendar.month.contains(date) {
                    self.calendar.cursor = date;
                    self.form_opened += 1;
                    self.form = Some(RequestForm::new(date));
                }
            }

            AppEvent::FormSubmit => return self.submit_form(),
            AppEvent::CloseForm => self.form = None,
            AppEvent::FormInput(_)
            | AppEvent::FormBackspace
            | AppEvent::FormDelete
            | AppEvent::FormCursorLeft
            | AppEvent::FormCursorRight
            | AppEvent::FormHome
            | AppEvent::FormEnd
            | AppEvent::FormNextField
            | AppEvent::FormPreviousField
            | AppEvent::FormPickerUp
            | AppEvent::FormPickerDown => self.edit_form(event),

            AppEvent::FocusColumn(delta) => self.focus_column(delta),
            AppEvent::FocusCard(delta) => self.focus_card(delta),
            AppEvent::GrabOrDrop => return self.grab_or_drop(),
            AppEvent::Drag(drag) => {
                if let Some(command) = self.board.handle_drag(drag) {
                    return vec![Effect::PersistMove(command)];
                }
            }

            AppEvent::ConfigNext => {
                if !self.configs.is_empty() {
                    self.config_selected = (self.config_selected + 1) % self.configs.len();
                }
            }
            AppEvent::ConfigPrevious => {
                if !self.configs.is_empty() {
                    self.config_selected = (self.config_selected + self.configs.len() - 1) % self.configs.len();
                }
            }

            AppEvent::TechniciansLoaded(result) => {
                self.calendar.technicians = result.unwrap_or_else(|e| {
                    log::warn!("Error loading technicians: {}", e);
                    Vec::new()
                });
            }
            AppEvent::TasksLoaded(result) => {
                self.calendar.tasks = result.unwrap_or_else(|e| {
                    log::warn!("Error loading tasks: {}", e);
                    Vec::new()
                });
            }
            AppEvent::RequestCreated(result) => return self.request_created(result),
            AppEvent::MoveSettled { command_id, outcome } => self.board.settle(command_id, outcome),
        }
        Vec::new()
    }

    fn edit_form(&mut self, event: AppEvent) {
        let technicians = &self.calendar.technicians;
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let picker = form.focus == FormField::Technician;
        match event {
            AppEvent::FormNextField => form.focus = form.focus.next(),
            AppEvent::FormPreviousField => form.focus = form.focus.previous(),
            AppEvent::FormPickerUp if picker => form.move_highlight(false, technicians),
            AppEvent::FormPickerDown if picker => form.move_highlight(true, technicians),
            AppEvent::FormInput(' ') if form.focus == FormField::RequestType => form.toggle_request_type(),
            AppEvent::FormCursorLeft | AppEvent::FormCursorRight if form.focus == FormField::RequestType => {
                form.toggle_request_type()
            }
            other => {
                let Some(input) = form.focused_input() else {
                    return;
                };
                match other {
                    AppEvent::FormInput(c) => input.insert_char(c),
                    AppEvent::FormBackspace => input.delete_char(),
                    AppEvent::FormDelete => input.delete_forward(),
                    AppEvent::FormCursorLeft => input.move_cursor_left(),
                    AppEvent::FormCursorRight => input.move_cursor_right(),
                    AppEvent::FormHome => input.move_to_start(),
                    AppEvent::FormEnd => input.move_to_end(),
                    _ => return,
                }
                if picker {
                    form.query_changed(technicians);
                }
            }
        }
    }

    fn submit_form(&mut self) -> Vec<Effect> {
        if self.submitting.is_some() {
            return Vec::new();
        }
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        match form.submit() {
            Some(request) => {
                log::info!("submitting request '{}' for {}", request.title, request.scheduled_date);
                self.submitting = Some(self.form_opened);
                vec![Effect::CreateRequest(request)]
            }
            None => Vec::new(),
        }
    }

    fn request_created(&mut self, result: Result<CreateResponse, ApiError>) -> Vec<Effect> {
        let submitted = self.submitting.take();
        match result {
            Ok(response) if response.success => {
                self.show_toast(CREATED_MESSAGE, ToastKind::Success);
                // a form opened after the submit stays open
                if submitted == Some(self.form_opened) {
                    self.form = None;
                }
                vec![Effect::FetchTasks]
            }
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| "Failed to create request".to_string());
                self.show_toast(format!("Error: {message}"), ToastKind::Error);
                Vec::new()
            }
            Err(e) => {
                log::error!("Error creating request: {}", e);
                self.show_toast(CREATE_FAILED_MESSAGE, ToastKind::Error);
                Vec::new()
            }
        }
    }

    /// Status of the column at `index` in the current board layout.
    pub fn column_status(&self, index: usize) -> Option<TaskStatus> {
        self.board.columns().get(index).map(|c| c.status.clone())
    }

    pub fn focused_task_id(&self) -> Option<i64> {
        let columns = self.board.columns();
        let column = columns.get(self.kanban_focus.column)?;
        column.cards.get(self.kanban_focus.card).map(|t| t.id)
    }

    fn focus_column(&mut self, delta: i64) {
        let count = self.board.columns().len() as i64;
        if count == 0 {
            return;
        }
        let column = (self.kanban_focus.column as i64 + delta).clamp(0, count - 1) as usize;
        self.kanban_focus.column = column;
        if self.board.dragging().is_some() {
            let status = self.column_status(column);
            self.board.handle_drag(DragEvent::Over(status));
        } else {
            self.clamp_card_focus();
        }
    }

    fn focus_card(&mut self, delta: i64) {
        if self.board.dragging().is_some() {
            return;
        }
        let len = self
            .board
            .columns()
            .get(self.kanban_focus.column)
            .map_or(0, |c| c.cards.len()) as i64;
        if len > 0 {
            self.kanban_focus.card = (self.kanban_focus.card as i64 + delta).clamp(0, len - 1) as usize;
        }
    }

    fn clamp_card_focus(&mut self) {
        let len = self
            .board
            .columns()
            .get(self.kanban_focus.column)
            .map_or(0, |c| c.cards.len());
        self.kanban_focus.card = self.kanban_focus.card.min(len.saturating_sub(1));
    }

    fn grab_or_drop(&mut self) -> Vec<Effect> {
        if self.board.dragging().is_none() {
            if let Some(task_id) = self.focused_task_id() {
                self.board.handle_drag(DragEvent::Start(task_id));
                let status = self.column_status(self.kanban_focus.column);
                self.board.handle_drag(DragEvent::Over(status));
            }
            return Vec::new();
        }

        let status = self.column_status(self.kanban_focus.column);
        let moved = self.board.handle_drag(DragEvent::Drop(status));
        self.board.handle_drag(DragEvent::End);
        match moved {
            Some(command) => {
                // follow the card into its new column
                if let Some(pos) = self.board.columns().iter().position(|c| c.status == command.to) {
                    self.kanban_focus.column = pos;
                    self.kanban_focus.card = self.board.columns()[pos]
                        .cards
                        .iter()
                        .position(|t| t.id == command.task_id)
                        .unwrap_or(0);
                }
                vec![Effect::PersistMove(command)]
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{SUBJECT_REQUIRED, TECHNICIAN_REQUIRED};
    use crate::kanban::MoveState;
    use crate::models::TaskType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: i64, status: &str) -> Task {
        Task {
            id,
            title: format!("t{id}"),
            task_type: TaskType::Corrective,
            status: TaskStatus::from(status),
            scheduled_date: None,
            due_date: None,
            description: None,
        }
    }

    fn app() -> App {
        let today = date(2026, 10, 19);
        let (mut app, effects) = App::new(
            View::Calendar,
            MonthCursor::containing(today),
            today,
            vec![task(1, "NEW"), task(2, "NEW"), task(3, "IN_PROGRESS")],
            Vec::new(),
            Duration::from_secs(3),
        );
        assert_eq!(effects, vec![Effect::FetchTechnicians, Effect::FetchTasks]);
        app.update(AppEvent::TechniciansLoaded(Ok(vec![Technician { id: 8, name: "Dana".into() }])));
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.update(AppEvent::FormInput(c));
        }
    }

    #[test]
    fn read_failures_degrade_to_empty_lists() {
        let mut app = app();
        app.update(AppEvent::TasksLoaded(Ok(vec![task(9, "NEW")])));
        assert_eq!(app.calendar.tasks.len(), 1);
        app.update(AppEvent::TasksLoaded(Err(ApiError::Status(500))));
        assert!(app.calendar.tasks.is_empty());
        app.update(AppEvent::TechniciansLoaded(Err(ApiError::Decode("eof".into()))));
        assert!(app.calendar.technicians.is_empty());
    }

    #[test]
    fn month_navigation_keeps_cursor_inside_month() {
        let mut app = app();
        app.calendar.cursor = date(2026, 10, 31);
        app.update(AppEvent::NextMonth);
        assert_eq!(app.calendar.month.title(), "November 2026");
        assert_eq!(app.calendar.cursor, date(2026, 11, 30));
        app.update(AppEvent::PreviousMonth);
        app.update(AppEvent::PreviousMonth);
        assert_eq!(app.calendar.month.title(), "September 2026");
    }

    #[test]
    fn day_cursor_does_not_leave_the_month() {
        let mut app = app();
        app.calendar.cursor = date(2026, 10, 30);
        app.update(AppEvent::MoveDayCursor(7));
        assert_eq!(app.calendar.cursor, date(2026, 10, 30));
        app.update(AppEvent::MoveDayCursor(1));
        assert_eq!(app.calendar.cursor, date(2026, 10, 31));
    }

    #[test]
    fn clicking_other_month_day_does_nothing() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(Some(date(2026, 11, 2))));
        assert!(app.form.is_none());
        app.update(AppEvent::ActivateDay(Some(date(2026, 10, 21))));
        assert_eq!(app.form.as_ref().unwrap().scheduled_date(), date(2026, 10, 21));
    }

    #[test]
    fn invalid_submit_shows_both_errors_and_no_effect() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(None));
        assert!(app.update(AppEvent::FormSubmit).is_empty());
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.errors.subject, Some(SUBJECT_REQUIRED));
        assert_eq!(form.errors.technician, Some(TECHNICIAN_REQUIRED));
        assert!(app.toast.is_none());
    }

    #[test]
    fn full_create_flow_reloads_tasks_and_closes_form() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(Some(date(2026, 10, 22))));
        type_text(&mut app, "Grease rollers");
        app.update(AppEvent::FormNextField);
        app.update(AppEvent::FormPickerDown);
        app.update(AppEvent::FormNextField);
        app.update(AppEvent::FormInput(' '));

        let effects = app.update(AppEvent::FormSubmit);
        let Some(Effect::CreateRequest(request)) = effects.first() else {
            panic!("expected a create effect, got {effects:?}");
        };
        assert_eq!(request.title, "Grease rollers");
        assert_eq!(request.technician_id, 8);
        assert_eq!(request.task_type, TaskType::Preventive);
        assert_eq!(request.status, TaskStatus::NewRequest);
        assert_eq!(request.scheduled_date, "2026-10-22");
        assert!(app.submitting.is_some());

        let effects = app.update(AppEvent::RequestCreated(Ok(CreateResponse { success: true, message: None })));
        assert_eq!(effects, vec![Effect::FetchTasks]);
        assert!(app.form.is_none());
        let toast = app.toast.as_ref().unwrap();
        assert_eq!((toast.message.as_str(), toast.kind), (CREATED_MESSAGE, ToastKind::Success));
    }

    #[test]
    fn late_success_leaves_a_newer_form_open() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(Some(date(2026, 10, 22))));
        type_text(&mut app, "Grease rollers");
        app.update(AppEvent::FormNextField);
        app.update(AppEvent::FormPickerDown);
        assert_eq!(app.update(AppEvent::FormSubmit).len(), 1);

        app.update(AppEvent::CloseForm);
        app.update(AppEvent::ActivateDay(Some(date(2026, 10, 23))));
        type_text(&mut app, "Second job");

        let effects = app.update(AppEvent::RequestCreated(Ok(CreateResponse { success: true, message: None })));
        assert_eq!(effects, vec![Effect::FetchTasks]);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.scheduled_date(), date(2026, 10, 23));
        assert_eq!(form.subject.value(), "Second job");
        assert!(app.submitting.is_none());
        assert_eq!(app.toast.as_ref().unwrap().message, CREATED_MESSAGE);
    }

    #[test]
    fn rejected_create_keeps_form_open() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(None));
        type_text(&mut app, "Valve");
        app.update(AppEvent::FormNextField);
        app.update(AppEvent::FormPickerDown);
        app.update(AppEvent::FormSubmit);

        let response = CreateResponse { success: false, message: Some("Duplicate".into()) };
        assert!(app.update(AppEvent::RequestCreated(Ok(response))).is_empty());
        assert_eq!(app.toast.as_ref().unwrap().message, "Error: Duplicate");
        assert_eq!(app.form.as_ref().unwrap().subject.value(), "Valve");

        app.update(AppEvent::RequestCreated(Ok(CreateResponse::default())));
        assert_eq!(app.toast.as_ref().unwrap().message, "Error: Failed to create request");

        app.update(AppEvent::RequestCreated(Err(ApiError::Decode("html".into()))));
        let toast = app.toast.as_ref().unwrap();
        assert_eq!((toast.message.as_str(), toast.kind), (CREATE_FAILED_MESSAGE, ToastKind::Error));
        assert!(app.form.is_some());
        assert!(app.submitting.is_none());
    }

    #[test]
    fn close_form_discards_input() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(None));
        type_text(&mut app, "draft");
        app.update(AppEvent::CloseForm);
        assert!(app.form.is_none());
        app.update(AppEvent::ActivateDay(None));
        assert!(app.form.as_ref().unwrap().subject.is_blank());
    }

    #[test]
    fn toast_expires_after_lifetime() {
        let mut app = app();
        app.show_toast("hi", ToastKind::Success);
        app.update(AppEvent::Tick(Instant::now()));
        assert!(app.toast.is_some());
        app.update(AppEvent::Tick(Instant::now() + Duration::from_secs(4)));
        assert!(app.toast.is_none());
    }

    #[test]
    fn keyboard_drag_moves_card_and_persists() {
        let mut app = app();
        app.update(AppEvent::SwitchView(View::Kanban));
        app.update(AppEvent::FocusCard(1));
        assert_eq!(app.focused_task_id(), Some(2));

        assert!(app.update(AppEvent::GrabOrDrop).is_empty());
        assert_eq!(app.board.dragging(), Some(2));
        app.update(AppEvent::FocusColumn(2));
        assert_eq!(app.board.hover(), Some(&TaskStatus::InProgress));

        let effects = app.update(AppEvent::GrabOrDrop);
        let Some(Effect::PersistMove(command)) = effects.first() else {
            panic!("expected a move effect, got {effects:?}");
        };
        assert_eq!((command.task_id, command.to.clone()), (2, TaskStatus::InProgress));
        assert_eq!(app.board.dragging(), None);
        assert_eq!(app.kanban_focus.column, 2);
        assert_eq!(app.focused_task_id(), Some(2));

        let id = command.id;
        app.update(AppEvent::MoveSettled { command_id: id, outcome: Err("timeout".into()) });
        assert_eq!(app.board.commands()[0].state, MoveState::Failed("timeout".into()));
        assert!(app.toast.is_none());
        assert_eq!(app.board.tasks()[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn cancelled_drag_changes_nothing() {
        let mut app = app();
        app.update(AppEvent::GrabOrDrop);
        app.update(AppEvent::FocusColumn(3));
        app.update(AppEvent::Drag(DragEvent::End));
        assert_eq!(app.board.dragging(), None);
        assert_eq!(app.board.tasks()[0].status, TaskStatus::New);
    }

    #[test]
    fn reload_refetches_everything() {
        let mut app = app();
        assert_eq!(app.update(AppEvent::Reload), vec![Effect::FetchTechnicians, Effect::FetchTasks]);
    }
}
