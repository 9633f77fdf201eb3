use chrono::NaiveDate;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::calendar::format_date;
use crate::input::TextInput;
use crate::models::{CreateRequest, TaskStatus, TaskType, Technician};

pub const SUBJECT_REQUIRED: &str = "Subject is required";
pub const TECHNICIAN_REQUIRED: &str = "Please select a technician";
pub const DUE_DATE_FORMAT: &str = "Due date must be YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Subject,
    Technician,
    RequestType,
    Description,
    DueDate,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Subject,
        FormField::Technician,
        FormField::RequestType,
        FormField::Description,
        FormField::DueDate,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> FormField {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> FormField {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Inline, field-scoped validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub subject: Option<&'static str>,
    pub technician: Option<&'static str>,
    pub due_date: Option<&'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.technician.is_none() && self.due_date.is_none()
    }
}

/// The "create request" modal, opened for one calendar day.
#[derive(Debug, Clone)]
pub struct RequestForm {
    scheduled_date: NaiveDate,
    pub subject: TextInput,
    pub technician_query: TextInput,
    pub description: TextInput,
    pub due_date: TextInput,
    pub request_type: TaskType,
    pub focus: FormField,
    pub errors: FormErrors,
    technician: Option<i64>,
    // 0 is the "Select a technician" placeholder
    highlight: usize,
}

impl RequestForm {
    pub fn new(scheduled_date: NaiveDate) -> Self {
        RequestForm {
            scheduled_date,
            subject: TextInput::default(),
            technician_query: TextInput::default(),
            description: TextInput::default(),
            due_date: TextInput::default(),
            request_type: TaskType::Corrective,
            focus: FormField::Subject,
            errors: FormErrors::default(),
            technician: None,
            highlight: 0,
        }
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    #[cfg(test)]
    pub fn technician(&self) -> Option<i64> {
        self.technician
    }

    pub fn highlight(&self) -> usize {
        self.highlight
    }

    pub fn select_technician(&mut self, id: Option<i64>) {
        self.technician = id;
    }

    /// Technicians matching the picker query, best match first.
    pub fn candidates<'a>(&self, technicians: &'a [Technician]) -> Vec<&'a Technician> {
        let query = self.technician_query.value().trim();
        if query.is_empty() {
            return technicians.iter().collect();
        }
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, usize, &Technician)> = technicians
            .iter()
            .enumerate()
            .filter_map(|(i, t)| matcher.fuzzy_match(&t.name, query).map(|score| (score, i, t)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, _, t)| t).collect()
    }

    fn sync_selection(&mut self, technicians: &[Technician]) {
        self.technician = match self.highlight {
            0 => None,
            n => self.candidates(technicians).get(n - 1).map(|t| t.id),
        };
    }

    /// Move the picker highlight; wraps through the placeholder entry.
    pub fn move_highlight(&mut self, forward: bool, technicians: &[Technician]) {
        let slots = self.candidates(technicians).len() + 1;
        self.highlight = if forward {
            (self.highlight + 1) % slots
        } else {
            (self.highlight + slots - 1) % slots
        };
        self.sync_selection(technicians);
    }

    /// Re-run the picker after the query changed: the best match becomes the selection.
    pub fn query_changed(&mut self, technicians: &[Technician]) {
        let has_match = !self.technician_query.is_blank() && !self.candidates(technicians).is_empty();
        self.highlight = usize::from(has_match);
        self.sync_selection(technicians);
    }

    pub fn toggle_request_type(&mut self) {
        self.request_type = match self.request_type {
            TaskType::Corrective => TaskType::Preventive,
            _ => TaskType::Corrective,
        };
    }

    /// The text field that currently receives typed characters.
    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            FormField::Subject => Some(&mut self.subject),
            FormField::Technician => Some(&mut self.technician_query),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::RequestType => None,
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors = FormErrors::default();
    }

    /// Validate all fields independently and build the payload when they pass.
    pub fn submit(&mut self) -> Option<CreateRequest> {
        self.clear_errors();

        if self.subject.is_blank() {
            self.errors.subject = Some(SUBJECT_REQUIRED);
        }
        if self.technician.is_none() {
            self.errors.technician = Some(TECHNICIAN_REQUIRED);
        }
        let due = self.due_date.value().trim();
        let due_date = if due.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
                Ok(d) => Some(format_date(d)),
                Err(_) => {
                    self.errors.due_date = Some(DUE_DATE_FORMAT);
                    None
                }
            }
        };

        if !self.errors.is_empty() {
            return None;
        }
        let technician_id = self.technician?;

        Some(CreateRequest {
            title: self.subject.value().trim().to_string(),
            description: self.description.value().trim().to_string(),
            technician_id,
            task_type: self.request_type.clone(),
            status: TaskStatus::NewRequest,
            scheduled_date: format_date(self.scheduled_date),
            due_date,
        })
    }
}
