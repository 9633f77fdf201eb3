use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::ApiClient;
use crate::app::{App, AppEvent, Effect, ToastKind};
use crate::calendar::{self, build_grid, summarize_day, WEEKDAY_NAMES};
use crate::form::{FormField, RequestForm};
use crate::input::TextInput;
use crate::kanban::{card_color, task_state, CardColor, DragEvent, MoveState};
use crate::models::{Task, TaskStatus, TaskType, View};

const ORANGE: Color = Color::Rgb(249, 115, 22);
const PURPLE: Color = Color::Rgb(168, 85, 247);
const NEUTRAL: Color = Color::Rgb(229, 231, 235);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Screen regions from the last draw, used to resolve mouse events.
#[derive(Debug, Default)]
struct HitMap {
    days: Vec<(Rect, NaiveDate)>,
    columns: Vec<(Rect, TaskStatus)>,
    cards: Vec<(Rect, i64)>,
    form: Option<Rect>,
}

fn hit(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

impl HitMap {
    fn column_at(&self, x: u16, y: u16) -> Option<TaskStatus> {
        self.columns.iter().find(|(r, _)| hit(*r, x, y)).map(|(_, s)| s.clone())
    }
}

fn type_color(task_type: &TaskType) -> Color {
    match card_color(task_type) {
        CardColor::Orange => ORANGE,
        CardColor::Purple => PURPLE,
        CardColor::Gray => NEUTRAL,
    }
}

pub fn run_tui(mut app: App, initial: Vec<Effect>, api: ApiClient) -> Result<()> {
    let runtime = Runtime::new()?;
    let (tx, rx) = mpsc::unbounded_channel();
    for effect in initial {
        run_effect(&runtime, &api, &tx, effect);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &runtime, &api, &tx, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("terminal loop failed: {err:?}");
        println!("{err:?}");
    }

    Ok(())
}

/// Execute one effect in the background; its completion comes back as an event.
fn run_effect(runtime: &Runtime, api: &ApiClient, tx: &UnboundedSender<AppEvent>, effect: Effect) {
    let api = api.clone();
    let tx = tx.clone();
    match effect {
        Effect::FetchTechnicians => {
            runtime.spawn(async move {
                let _ = tx.send(AppEvent::TechniciansLoaded(api.list_technicians().await));
            });
        }
        Effect::FetchTasks => {
            runtime.spawn(async move {
                let _ = tx.send(AppEvent::TasksLoaded(api.list_requests().await));
            });
        }
        Effect::CreateRequest(request) => {
            runtime.spawn(async move {
                let _ = tx.send(AppEvent::RequestCreated(api.create_request(&request).await));
            });
        }
        Effect::PersistMove(command) => {
            let request = crate::models::MoveRequest { task_id: command.task_id, new_status: command.to.clone() };
            runtime.spawn(async move {
                let outcome = api.move_task(&request).await.map_err(|e| e.to_string());
                let _ = tx.send(AppEvent::MoveSettled { command_id: command.id, outcome });
            });
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &Runtime,
    api: &ApiClient,
    tx: &UnboundedSender<AppEvent>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut hits = HitMap::default();
    let mut pressed_card = None;
    loop {
        terminal.draw(|f| ui(f, app, &mut hits))?;

        let mut events = Vec::new();
        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => events.extend(map_key(app, key)),
                Event::Mouse(mouse) => events.extend(map_mouse(app, &hits, &mut pressed_card, mouse)),
                _ => {}
            }
        }
        while let Ok(completed) = rx.try_recv() {
            events.push(completed);
        }
        events.push(AppEvent::Tick(Instant::now()));

        for event in events {
            for effect in app.update(event) {
                run_effect(runtime, api, tx, effect);
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn map_key(app: &App, key: KeyEvent) -> Vec<AppEvent> {
    if app.form.is_some() {
        let event = match key.code {
            KeyCode::Esc => AppEvent::CloseForm,
            KeyCode::Enter => AppEvent::FormSubmit,
            KeyCode::Tab => AppEvent::FormNextField,
            KeyCode::BackTab => AppEvent::FormPreviousField,
            KeyCode::Up => AppEvent::FormPickerUp,
            KeyCode::Down => AppEvent::FormPickerDown,
            KeyCode::Left => AppEvent::FormCursorLeft,
            KeyCode::Right => AppEvent::FormCursorRight,
            KeyCode::Home => AppEvent::FormHome,
            KeyCode::End => AppEvent::FormEnd,
            KeyCode::Backspace => AppEvent::FormBackspace,
            KeyCode::Delete => AppEvent::FormDelete,
            KeyCode::Char(c) => AppEvent::FormInput(c),
            _ => return Vec::new(),
        };
        return vec![event];
    }

    // Global keys
    let global = match key.code {
        KeyCode::Char('q') => Some(AppEvent::Quit),
        KeyCode::Tab => Some(AppEvent::NextView),
        KeyCode::BackTab => Some(AppEvent::PreviousView),
        KeyCode::Char('r') => Some(AppEvent::Reload),
        KeyCode::Char('1') => Some(AppEvent::SwitchView(View::Calendar)),
        KeyCode::Char('2') => Some(AppEvent::SwitchView(View::Kanban)),
        KeyCode::Char('3') => Some(AppEvent::SwitchView(View::Configs)),
        _ => None,
    };
    if let Some(event) = global {
        return vec![event];
    }

    let event = match app.view {
        View::Calendar => match key.code {
            KeyCode::Left => AppEvent::MoveDayCursor(-1),
            KeyCode::Right => AppEvent::MoveDayCursor(1),
            KeyCode::Up => AppEvent::MoveDayCursor(-7),
            KeyCode::Down => AppEvent::MoveDayCursor(7),
            KeyCode::Char('[') | KeyCode::PageUp => AppEvent::PreviousMonth,
            KeyCode::Char(']') | KeyCode::PageDown => AppEvent::NextMonth,
            KeyCode::Enter => AppEvent::ActivateDay(None),
            _ => return Vec::new(),
        },
        View::Kanban => match key.code {
            KeyCode::Left => AppEvent::FocusColumn(-1),
            KeyCode::Right => AppEvent::FocusColumn(1),
            KeyCode::Up => AppEvent::FocusCard(-1),
            KeyCode::Down => AppEvent::FocusCard(1),
            KeyCode::Char(' ') => AppEvent::GrabOrDrop,
            KeyCode::Enter if app.board.dragging().is_some() => AppEvent::GrabOrDrop,
            KeyCode::Esc => AppEvent::Drag(DragEvent::End),
            _ => return Vec::new(),
        },
        View::Configs => match key.code {
            KeyCode::Down => AppEvent::ConfigNext,
            KeyCode::Up => AppEvent::ConfigPrevious,
            _ => return Vec::new(),
        },
    };
    vec![event]
}

/// `pressed_card` holds the card under a button press; the drag starts on the
/// first pointer movement after it.
fn map_mouse(app: &App, hits: &HitMap, pressed_card: &mut Option<i64>, mouse: MouseEvent) -> Vec<AppEvent> {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            *pressed_card = None;
            if app.form.is_some() {
                // backdrop click closes without saving
                return match hits.form {
                    Some(area) if !hit(area, x, y) => vec![AppEvent::CloseForm],
                    _ => Vec::new(),
                };
            }
            match app.view {
                View::Calendar => hits
                    .days
                    .iter()
                    .find(|(r, _)| hit(*r, x, y))
                    .map(|(_, date)| vec![AppEvent::ActivateDay(Some(*date))])
                    .unwrap_or_default(),
                View::Kanban => {
                    *pressed_card = hits.cards.iter().find(|(r, _)| hit(*r, x, y)).map(|(_, id)| *id);
                    Vec::new()
                }
                View::Configs => Vec::new(),
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if app.view == View::Kanban => {
            let over = AppEvent::Drag(DragEvent::Over(hits.column_at(x, y)));
            if app.board.dragging().is_some() {
                return vec![over];
            }
            match pressed_card.take() {
                Some(id) => vec![AppEvent::Drag(DragEvent::Start(id)), over],
                None => Vec::new(),
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            *pressed_card = None;
            if app.view == View::Kanban && app.board.dragging().is_some() {
                vec![
                    AppEvent::Drag(DragEvent::Drop(hits.column_at(x, y))),
                    AppEvent::Drag(DragEvent::End),
                ]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn ui(f: &mut Frame, app: &mut App, hits: &mut HitMap) {
    *hits = HitMap::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(f.area());

    let titles: Vec<Line> = View::ALL.iter().map(|v| Line::from(v.title())).collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Gear Guard"))
        .select(app.view.index())
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Black),
        );

    f.render_widget(tabs, chunks[0]);

    match app.view {
        View::Calendar => render_calendar(f, app, chunks[1], hits),
        View::Kanban => render_kanban(f, app, chunks[1], hits),
        View::Configs => render_configs(f, app, chunks[1]),
    }

    if let Some(form) = &app.form {
        let area = centered_rect(60, 80, f.area());
        hits.form = Some(area);
        render_form(f, form, app, area);
    }

    if let Some(toast) = &app.toast {
        let area = f.area();
        let width = (toast.message.chars().count() as u16 + 4).min(area.width);
        let toast_area = Rect {
            x: area.x + area.width - width,
            y: area.y + area.height.saturating_sub(3),
            width,
            height: 3.min(area.height),
        };
        let bg = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        f.render_widget(Clear, toast_area);
        f.render_widget(
            Paragraph::new(toast.message.as_str())
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().bg(bg).fg(Color::White)),
            toast_area,
        );
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn render_calendar(f: &mut Frame, app: &App, area: Rect, hits: &mut HitMap) {
    let state = &app.calendar;
    let cells = build_grid(state.month.year(), state.month.month0(), state.today);
    let rows = cells.len().div_ceil(7).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("◀ [ ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.month.title(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(" ] ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let seven = [Constraint::Ratio(1, 7); 7];
    let weekday_cols = Layout::default().direction(Direction::Horizontal).constraints(seven).split(chunks[1]);
    for (i, name) in WEEKDAY_NAMES.iter().enumerate() {
        f.render_widget(
            Paragraph::new(*name).alignment(Alignment::Center).style(Style::default().fg(Color::Cyan)),
            weekday_cols[i],
        );
    }

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(chunks[2]);

    for (row_idx, row) in cells.chunks(7).enumerate() {
        let col_areas = Layout::default().direction(Direction::Horizontal).constraints(seven).split(row_areas[row_idx]);
        for (col_idx, cell) in row.iter().enumerate() {
            let cell_area = col_areas[col_idx];
            let selected = cell.is_interactive() && cell.date == state.cursor;

            let border_style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if cell.today {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let number_style = if cell.other_month {
                Style::default().fg(Color::DarkGray)
            } else if cell.today {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(cell.day().to_string(), number_style));
            let inner = block.inner(cell_area);
            f.render_widget(block, cell_area);

            // other-month cells render no tasks and take no clicks
            if !cell.is_interactive() {
                continue;
            }
            hits.days.push((cell_area, cell.date));

            let summary = summarize_day(&state.tasks, cell.date);
            let width = inner.width as usize;
            let mut lines: Vec<Line> = summary
                .pills
                .iter()
                .map(|task| {
                    Line::from(Span::styled(
                        truncate(&task.title, width),
                        Style::default().fg(Color::Black).bg(type_color(&task.task_type)),
                    ))
                })
                .collect();
            if let Some(label) = summary.overflow_label() {
                lines.push(Line::from(Span::styled(label, Style::default().fg(Color::Black).bg(Color::Gray))));
            }
            f.render_widget(Paragraph::new(lines), inner);
        }
    }

    // Details of the cursor day stand in for pill tooltips
    let summary = summarize_day(&state.tasks, state.cursor);
    let mut detail: Vec<Line> = vec![Line::from(Span::styled(
        format!("{}  ", calendar::format_date(state.cursor)),
        Style::default().fg(Color::Cyan),
    ))];
    for task in &summary.pills {
        detail.push(Line::from(Span::styled(
            calendar::pill_tooltip(task),
            Style::default().fg(type_color(&task.task_type)),
        )));
    }
    if summary.pills.is_empty() {
        detail.push(Line::from("No tasks scheduled"));
    }
    let controls = "←↑↓→: Day • Enter/click: New request • [ ]: Month • r: Reload • q: Quit";
    let footer = Paragraph::new(detail)
        .block(Block::default().borders(Borders::TOP).title(controls))
        .wrap(Wrap { trim: true });
    f.render_widget(footer, chunks[3]);
}

fn input_line<'a>(label: &'a str, input: &'a TextInput, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![Span::styled(format!("{label:<14}"), label_style)];
    if focused {
        let (before, after) = input.split_at_cursor();
        let mut rest = after.chars();
        let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
        spans.push(Span::raw(before));
        spans.push(Span::styled(under, Style::default().bg(Color::Cyan).fg(Color::Black)));
        spans.push(Span::raw(rest.as_str()));
    } else {
        spans.push(Span::raw(input.value()));
    }
    Line::from(spans)
}

fn error_line(error: Option<&'static str>) -> Option<Line<'static>> {
    error.map(|msg| Line::from(Span::styled(format!("{:14}{msg}", ""), Style::default().fg(Color::Red))))
}

fn render_form(f: &mut Frame, form: &RequestForm, app: &App, area: Rect) {
    let technicians = &app.calendar.technicians;
    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled(format!("{:<14}", "Date"), Style::default().fg(Color::White)),
            Span::styled(calendar::format_date(form.scheduled_date()), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        input_line("Subject *", &form.subject, form.focus == FormField::Subject),
    ];
    lines.extend(error_line(form.errors.subject));

    lines.push(input_line("Technician *", &form.technician_query, form.focus == FormField::Technician));
    let candidates = form.candidates(technicians);
    let placeholder = std::iter::once("Select a technician".to_string());
    let options = placeholder.chain(candidates.iter().map(|t| t.name.clone()));
    for (i, name) in options.enumerate().take(6) {
        let chosen = i == form.highlight();
        let style = if chosen {
            Style::default().fg(Color::Black).bg(Color::LightGreen)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![Span::raw(format!("{:14}", "")), Span::styled(name, style)]));
    }
    lines.extend(error_line(form.errors.technician));

    let radio = |t: TaskType, label: &'static str| {
        let mark = if form.request_type == t { "(•)" } else { "( )" };
        Span::raw(format!("{mark} {label}  "))
    };
    let type_style = if form.focus == FormField::RequestType {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{:<14}", "Type"), type_style),
        radio(TaskType::Corrective, "Corrective"),
        radio(TaskType::Preventive, "Preventive"),
    ]));

    lines.push(input_line("Description", &form.description, form.focus == FormField::Description));
    lines.push(input_line("Due date", &form.due_date, form.focus == FormField::DueDate));
    lines.extend(error_line(form.errors.due_date));

    lines.push(Line::from(""));
    let status = if app.submitting.is_some() { "Submitting…" } else { "Enter: Create • Tab: Next field • ↑/↓: Pick technician • Esc: Cancel" };
    lines.push(Line::from(Span::styled(status, Style::default().fg(Color::DarkGray))));

    let block = Block::default()
        .title("New Maintenance Request")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn card_lines(task: &Task, width: usize, now: chrono::DateTime<Local>) -> Vec<Line<'static>> {
    let color = type_color(&task.task_type);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", task.task_type), Style::default().fg(Color::Black).bg(color)),
            Span::styled(
                truncate(&task.title, width.saturating_sub(task.task_type.as_str().len() + 1)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("Due: {}", task.due_date.as_deref().filter(|d| !d.is_empty()).unwrap_or("-")),
            Style::default().fg(Color::Gray),
        )),
    ];
    if task_state(task, now).show_warning {
        lines.push(Line::from(Span::styled("⚠ Overdue", Style::default().fg(Color::Red))));
    }
    lines
}

fn render_kanban(f: &mut Frame, app: &App, area: Rect, hits: &mut HitMap) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let columns = app.board.columns();
    let count = columns.len().max(1) as u32;
    let column_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, count); columns.len()])
        .split(chunks[0]);
    let now = Local::now();
    let dragging = app.board.dragging();

    for (idx, column) in columns.iter().enumerate() {
        let col_area = column_areas[idx];
        let focused = idx == app.kanban_focus.column;
        let hovered = dragging.is_some() && app.board.hover() == Some(&column.status);
        let border_style = if hovered {
            Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD)
        } else if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!("{} ({})", column.status, column.cards.len()));
        let body = block.inner(col_area);
        f.render_widget(block, col_area);
        hits.columns.push((col_area, column.status.clone()));

        // Every card is rebuilt on each draw
        let mut y = body.y;
        for (card_idx, task) in column.cards.iter().enumerate() {
            let lines = card_lines(task, body.width.saturating_sub(2) as usize, now);
            let height = lines.len() as u16;
            if y + height > body.y + body.height {
                break;
            }
            let card_area = Rect { x: body.x, y, width: body.width, height };
            let is_dragged = dragging == Some(task.id);
            let is_focused = focused && card_idx == app.kanban_focus.card && dragging.is_none();
            let mut style = Style::default();
            if is_dragged {
                style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
            }
            if is_focused {
                style = style.bg(Color::Rgb(40, 40, 40));
            }
            let card = Paragraph::new(lines)
                .style(style)
                .block(
                    Block::default()
                        .borders(Borders::LEFT)
                        .border_style(Style::default().fg(type_color(&task.task_type))),
                );
            f.render_widget(card, card_area);
            hits.cards.push((card_area, task.id));
            y += height + 1;
        }
    }

    let help = if dragging.is_some() {
        "←/→: Choose column • Space/Enter: Drop • Esc: Cancel"
    } else {
        "←/→: Column • ↑/↓: Card • Space or mouse drag: Move card • q: Quit"
    };
    let saving = app
        .board
        .commands()
        .iter()
        .filter(|c| c.state == MoveState::Pending)
        .count();
    let footer = if saving > 0 { format!("{help} • saving {saving}…") } else { help.to_string() };
    f.render_widget(Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)), chunks[1]);
}

fn render_configs(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let configs: Vec<ListItem> = app
        .configs
        .iter()
        .map(|config| {
            ListItem::new(vec![Line::from(vec![
                Span::styled(
                    format!("{} ", config.key_name),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("={}", config.value),
                    Style::default().fg(Color::Cyan),
                ),
            ])])
        })
        .collect();

    let configs_list = List::new(configs)
        .block(Block::default().borders(Borders::ALL).title("Configs"))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !app.configs.is_empty() {
        state.select(Some(app.config_selected));
    }
    f.render_stateful_widget(configs_list, chunks[0], &mut state);

    let info_text = match app.configs.get(app.config_selected) {
        Some(config) => format!(
            "Config: {}\nValue: {}\nDescription: {}\nCreated: {}\nUpdated: {}\n\nChange with: gear-guard set {} <value>\nValues are read at startup.",
            config.key_name,
            config.value,
            config.description.as_deref().unwrap_or("-"),
            config.created_at,
            config.updated_at,
            config.key_name
        ),
        None => "No config stored\n\nSet one with: gear-guard set base_url http://host:5000".to_string(),
    };

    let info_paragraph = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Config Info"))
        .style(Style::default().fg(Color::White));

    f.render_widget(info_paragraph, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MonthCursor;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tasks = vec![Task {
            id: 1,
            title: "Hydraulic leak".into(),
            task_type: TaskType::Corrective,
            status: TaskStatus::New,
            scheduled_date: None,
            due_date: Some("2020-01-01".into()),
            description: None,
        }];
        App::new(View::Calendar, MonthCursor::containing(today), today, tasks, Vec::new(), Duration::from_secs(3)).0
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent { code, modifiers: KeyModifiers::NONE, kind: KeyEventKind::Press, state: KeyEventState::NONE }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    fn draw(app: &mut App) -> (HitMap, String) {
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).unwrap();
        let mut hits = HitMap::default();
        terminal.draw(|f| ui(f, app, &mut hits)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        (hits, text)
    }

    #[test]
    fn calendar_draw_registers_only_current_month_days() {
        let mut app = app();
        let (hits, text) = draw(&mut app);
        assert!(text.contains("October 2026"));
        assert_eq!(hits.days.len(), 31);
        assert!(hits.days.iter().all(|(_, d)| app.calendar.month.contains(*d)));
    }

    #[test]
    fn clicking_a_day_opens_the_form_and_backdrop_closes_it() {
        let mut app = app();
        let (hits, _) = draw(&mut app);
        let (rect, date) = hits.days[4];
        let events = map_mouse(&app, &hits, &mut None, mouse(MouseEventKind::Down(MouseButton::Left), rect.x + 1, rect.y + 1));
        for e in events {
            app.update(e);
        }
        assert_eq!(app.form.as_ref().map(|f| f.scheduled_date()), Some(date));

        let (hits, text) = draw(&mut app);
        assert!(text.contains("New Maintenance Request"));
        let inside = hits.form.unwrap();
        let down_inside = mouse(MouseEventKind::Down(MouseButton::Left), inside.x + 1, inside.y + 1);
        assert!(map_mouse(&app, &hits, &mut None, down_inside).is_empty());
        let outside = map_mouse(&app, &hits, &mut None, mouse(MouseEventKind::Down(MouseButton::Left), 0, 0));
        assert!(matches!(outside.as_slice(), [AppEvent::CloseForm]));
    }

    #[test]
    fn mouse_drag_between_columns_moves_the_card() {
        let mut app = app();
        app.update(AppEvent::SwitchView(View::Kanban));
        let (hits, text) = draw(&mut app);
        assert!(text.contains("⚠ Overdue") || text.contains("Overdue"));
        let (card, id) = hits.cards[0];
        assert_eq!(id, 1);
        let (target, status) = hits.columns[4].clone();
        assert_eq!(status, TaskStatus::Scrap);

        let mut effects = Vec::new();
        let mut pressed = None;
        let down = map_mouse(&app, &hits, &mut pressed, mouse(MouseEventKind::Down(MouseButton::Left), card.x + 1, card.y));
        assert!(down.is_empty());
        assert_eq!(pressed, Some(1));
        for kind in [MouseEventKind::Drag(MouseButton::Left), MouseEventKind::Up(MouseButton::Left)] {
            for e in map_mouse(&app, &hits, &mut pressed, mouse(kind, target.x + 2, target.y + 2)) {
                effects.extend(app.update(e));
            }
        }
        assert!(matches!(effects.as_slice(), [Effect::PersistMove(c)] if c.to == TaskStatus::Scrap));
        assert_eq!(app.board.dragging(), None);
        assert_eq!(app.board.tasks()[0].status, TaskStatus::Scrap);
    }

    #[test]
    fn plain_click_on_a_card_sends_nothing() {
        let mut app = app();
        app.update(AppEvent::SwitchView(View::Kanban));
        let (hits, _) = draw(&mut app);
        let (card, _) = hits.cards[0];

        let mut pressed = None;
        let mut effects = Vec::new();
        for kind in [MouseEventKind::Down(MouseButton::Left), MouseEventKind::Up(MouseButton::Left)] {
            for e in map_mouse(&app, &hits, &mut pressed, mouse(kind, card.x + 1, card.y)) {
                effects.extend(app.update(e));
            }
        }
        assert!(effects.is_empty());
        assert!(app.board.commands().is_empty());
        assert_eq!(app.board.dragging(), None);
        assert_eq!(pressed, None);
        // a later move without a press does not start a drag
        let stray = mouse(MouseEventKind::Drag(MouseButton::Left), card.x + 1, card.y + 1);
        assert!(map_mouse(&app, &hits, &mut pressed, stray).is_empty());
    }

    #[test]
    fn release_outside_columns_only_ends_the_drag() {
        let mut app = app();
        app.update(AppEvent::SwitchView(View::Kanban));
        let (hits, _) = draw(&mut app);
        app.update(AppEvent::Drag(DragEvent::Start(1)));
        // the tab bar is not a column
        let events = map_mouse(&app, &hits, &mut None, mouse(MouseEventKind::Up(MouseButton::Left), 1, 1));
        let mut effects = Vec::new();
        for e in events {
            effects.extend(app.update(e));
        }
        assert!(effects.is_empty());
        assert_eq!(app.board.dragging(), None);
        assert_eq!(app.board.tasks()[0].status, TaskStatus::New);
    }

    #[test]
    fn keys_route_to_the_open_form_first() {
        let mut app = app();
        app.update(AppEvent::ActivateDay(None));
        assert!(matches!(map_key(&app, key(KeyCode::Char('q'))).as_slice(), [AppEvent::FormInput('q')]));
        assert!(matches!(map_key(&app, key(KeyCode::Esc)).as_slice(), [AppEvent::CloseForm]));
        app.update(AppEvent::CloseForm);
        assert!(matches!(map_key(&app, key(KeyCode::Char('q'))).as_slice(), [AppEvent::Quit]));
        assert!(matches!(map_key(&app, key(KeyCode::Char(']'))).as_slice(), [AppEvent::NextMonth]));
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
