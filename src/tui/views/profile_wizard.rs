//! Profile wizard view.
//!
//! Renders the form of the current step and maps keys onto the form and the
//! controller. Remote work goes through [`Services`]; results come back as
//! events routed to [`ProfileWizardState::on_geo_loaded`] and
//! [`ProfileWizardState::on_submit_finished`].

use std::path::Path;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::core::geo::{GeoLevel, GeoResponse, LevelState};
use crate::core::profile::{
    ActiveForm, Field, FieldErrors, Plan, PreferencesForm, Profession, StepForm,
    WizardController, WizardError, WizardStep,
};
use crate::core::submission::{SubmissionReceipt, SubmitError};
use crate::tui::events::{AppEvent, Notification, NotificationLevel};
use crate::tui::services::Services;
use crate::tui::widgets::InputBuffer;
use super::super::theme;

// ============================================================================
// Focus slots
// ============================================================================

/// One focusable control of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    PhotoPath,
    Username,
    CurrentPassword,
    NewPassword,
    Profession,
    CompanyName,
    Address1,
    Country,
    State,
    City,
    Plan,
    Newsletter,
}

impl Slot {
    fn field(self) -> Option<Field> {
        match self {
            Slot::PhotoPath => Some(Field::Photo),
            Slot::Username => Some(Field::Username),
            Slot::CurrentPassword => Some(Field::CurrentPassword),
            Slot::NewPassword => Some(Field::NewPassword),
            Slot::Profession => Some(Field::Profession),
            Slot::CompanyName => Some(Field::CompanyName),
            Slot::Address1 => Some(Field::Address1),
            Slot::Country => Some(Field::Country),
            Slot::State => Some(Field::State),
            Slot::City => Some(Field::City),
            Slot::Plan | Slot::Newsletter => None,
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Slot::PhotoPath
                | Slot::Username
                | Slot::CurrentPassword
                | Slot::NewPassword
                | Slot::CompanyName
                | Slot::Address1
        )
    }

    fn level(self) -> Option<GeoLevel> {
        match self {
            Slot::Country => Some(GeoLevel::Country),
            Slot::State => Some(GeoLevel::State),
            Slot::City => Some(GeoLevel::City),
            _ => None,
        }
    }
}

fn level_index(level: GeoLevel) -> usize {
    match level {
        GeoLevel::Country => 0,
        GeoLevel::State => 1,
        GeoLevel::City => 2,
    }
}

/// Text buffers behind the text slots.
#[derive(Debug, Clone, Default)]
struct TextInputs {
    photo_path: InputBuffer,
    username: InputBuffer,
    current_password: InputBuffer,
    new_password: InputBuffer,
    company_name: InputBuffer,
    address1: InputBuffer,
}

impl TextInputs {
    fn from_form(form: &ActiveForm) -> Self {
        match form {
            ActiveForm::Personal(f) => Self {
                username: InputBuffer::with_text(&f.username),
                current_password: InputBuffer::with_text(&f.current_password),
                new_password: InputBuffer::with_text(&f.new_password),
                ..Self::default()
            },
            ActiveForm::Professional(f) => Self {
                company_name: InputBuffer::with_text(&f.company_name),
                address1: InputBuffer::with_text(&f.address1),
                ..Self::default()
            },
            ActiveForm::Preferences(_) | ActiveForm::Review => Self::default(),
        }
    }

    fn get(&self, slot: Slot) -> Option<&InputBuffer> {
        match slot {
            Slot::PhotoPath => Some(&self.photo_path),
            Slot::Username => Some(&self.username),
            Slot::CurrentPassword => Some(&self.current_password),
            Slot::NewPassword => Some(&self.new_password),
            Slot::CompanyName => Some(&self.company_name),
            Slot::Address1 => Some(&self.address1),
            _ => None,
        }
    }

    fn get_mut(&mut self, slot: Slot) -> Option<&mut InputBuffer> {
        match slot {
            Slot::PhotoPath => Some(&mut self.photo_path),
            Slot::Username => Some(&mut self.username),
            Slot::CurrentPassword => Some(&mut self.current_password),
            Slot::NewPassword => Some(&mut self.new_password),
            Slot::CompanyName => Some(&mut self.company_name),
            Slot::Address1 => Some(&mut self.address1),
            _ => None,
        }
    }
}

// ============================================================================
// View state
// ============================================================================

pub struct ProfileWizardState {
    controller: WizardController,
    form: ActiveForm,
    focus: usize,
    inputs: TextInputs,
    /// Highlighted row of the country, state and city lists.
    cursors: [usize; 3],
    /// Last availability answer as (username, available).
    username_status: Option<(String, bool)>,
}

impl Default for ProfileWizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileWizardState {
    pub fn new() -> Self {
        let controller = WizardController::new();
        let form = controller.open_form();
        let inputs = TextInputs::from_form(&form);
        Self {
            controller,
            form,
            focus: 0,
            inputs,
            cursors: [0; 3],
            username_status: None,
        }
    }

    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    pub fn form(&self) -> &ActiveForm {
        &self.form
    }

    pub fn focused_slot(&self) -> Option<Slot> {
        self.slots().get(self.focus).copied()
    }

    /// Short state label for the status bar.
    pub fn status_label(&self) -> String {
        if self.controller.is_submitted() {
            "submitted".to_string()
        } else if self.controller.is_submitting() {
            "submitting".to_string()
        } else {
            format!(
                "Step {}/{}",
                self.controller.step().number(),
                WizardStep::ALL.len()
            )
        }
    }

    fn slots(&self) -> Vec<Slot> {
        match &self.form {
            ActiveForm::Personal(_) => vec![
                Slot::PhotoPath,
                Slot::Username,
                Slot::CurrentPassword,
                Slot::NewPassword,
            ],
            ActiveForm::Professional(f) => {
                let mut slots = vec![Slot::Profession];
                if f.shows_company() {
                    slots.push(Slot::CompanyName);
                }
                slots.push(Slot::Address1);
                slots
            }
            ActiveForm::Preferences(_) => vec![
                Slot::Country,
                Slot::State,
                Slot::City,
                Slot::Plan,
                Slot::Newsletter,
            ],
            ActiveForm::Review => Vec::new(),
        }
    }

    /// Rebuild the form for the controller's current step.
    fn enter_step(&mut self, services: &Services) {
        self.form = self.controller.open_form();
        self.inputs = TextInputs::from_form(&self.form);
        self.focus = 0;
        self.cursors = [0; 3];
        if let ActiveForm::Preferences(form) = &mut self.form {
            services.spawn_geo(form.open());
        }
    }

    // ── Wizard actions ──────────────────────────────────────────────────

    /// Advance, or submit when on the review step.
    pub fn next_step(&mut self, services: &Services) {
        if self.controller.step() == WizardStep::Review {
            self.submit(services);
            return;
        }
        self.blur();
        match self.controller.advance_form(&mut self.form) {
            Ok(_) => self.enter_step(services),
            Err(WizardError::Validation(errors)) => {
                notify(
                    services,
                    format!("Please fix {} field(s) before continuing", errors.len()),
                    NotificationLevel::Warning,
                );
            }
            Err(e) => notify(services, e.to_string(), NotificationLevel::Error),
        }
    }

    pub fn previous_step(&mut self, services: &Services) {
        if !self.controller.can_go_back() {
            return;
        }
        match self.controller.retreat() {
            Ok(_) => self.enter_step(services),
            Err(e) => notify(services, e.to_string(), NotificationLevel::Warning),
        }
    }

    pub fn submit(&mut self, services: &Services) {
        match self.controller.begin_submit() {
            Ok(payload) => services.spawn_submit(payload),
            Err(WizardError::SubmitInFlight) => {}
            Err(e) => notify(services, e.to_string(), NotificationLevel::Warning),
        }
    }

    pub fn on_submit_finished(
        &mut self,
        result: Result<SubmissionReceipt, SubmitError>,
        services: &Services,
    ) {
        match self.controller.finish_submit(result) {
            Ok(_) => notify(services, "Profile submitted", NotificationLevel::Success),
            Err(WizardError::Submission(message)) => {
                notify(services, message, NotificationLevel::Error)
            }
            Err(e) => tracing::warn!(error = %e, "Unexpected submission result"),
        }
    }

    /// Apply a cascade fetch. Responses arriving after the user left the
    /// preferences step are dropped.
    pub fn on_geo_loaded(&mut self, response: GeoResponse) {
        let level = response.request.level();
        let ActiveForm::Preferences(form) = &mut self.form else {
            tracing::debug!(?level, "Dropping geo response outside preferences step");
            return;
        };
        if form.apply_geo(response) {
            self.cursors[level_index(level)] = selected_index(form, level).unwrap_or(0);
        }
    }

    /// Ask the backend whether the typed username is free.
    pub fn check_username(&mut self, services: &Services) {
        let ActiveForm::Personal(form) = &self.form else {
            return;
        };
        if form.username.is_empty() {
            return;
        }
        self.username_status = None;
        services.spawn_username_check(form.username.clone());
    }

    pub fn on_username_checked(
        &mut self,
        username: String,
        result: Result<bool, SubmitError>,
        services: &Services,
    ) {
        match result {
            Ok(available) => {
                if self.inputs.username.text() == username {
                    self.username_status = Some((username, available));
                }
            }
            Err(e) => notify(
                services,
                format!("Username check failed: {e}"),
                NotificationLevel::Warning,
            ),
        }
    }

    // ── Input ───────────────────────────────────────────────────────────

    /// Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let key = match event {
            Event::Key(k) if k.kind == KeyEventKind::Press => *k,
            _ => return false,
        };

        if self.controller.is_submitted() {
            return false;
        }

        if self.controller.step() == WizardStep::Review {
            return match key.code {
                KeyCode::Enter => {
                    self.submit(services);
                    true
                }
                _ => false,
            };
        }

        match key.code {
            KeyCode::Tab => {
                self.move_focus(1);
                return true;
            }
            KeyCode::BackTab => {
                self.move_focus(-1);
                return true;
            }
            _ => {}
        }

        let Some(slot) = self.focused_slot() else {
            return false;
        };
        if slot.is_text() {
            self.handle_text_key(slot, key)
        } else {
            self.handle_choice_key(slot, key, services)
        }
    }

    fn handle_text_key(&mut self, slot: Slot, key: KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        match key.code {
            KeyCode::Enter if slot == Slot::PhotoPath => self.load_photo(),
            KeyCode::Enter | KeyCode::Down => self.move_focus(1),
            KeyCode::Up => self.move_focus(-1),
            KeyCode::Char(_)
            | KeyCode::Backspace
            | KeyCode::Delete
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End => {
                let changed = self
                    .inputs
                    .get_mut(slot)
                    .is_some_and(|buffer| buffer.handle_key(key));
                if changed {
                    self.push_text(slot);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_choice_key(&mut self, slot: Slot, key: KeyEvent, services: &Services) -> bool {
        if let Some(level) = slot.level() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_cursor(level, -1);
                    return true;
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_cursor(level, 1);
                    return true;
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.pick(level, services);
                    return true;
                }
                _ => return false,
            }
        }

        match (slot, key.code) {
            (Slot::Profession, KeyCode::Left | KeyCode::Char('h')) => self.cycle_profession(-1),
            (Slot::Profession, KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ')) => {
                self.cycle_profession(1)
            }
            (Slot::Plan, KeyCode::Left | KeyCode::Char('h')) => self.cycle_plan(-1),
            (Slot::Plan, KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ')) => {
                self.cycle_plan(1)
            }
            (Slot::Newsletter, KeyCode::Enter | KeyCode::Char(' ')) => self.toggle_newsletter(),
            (_, KeyCode::Enter | KeyCode::Down) => self.move_focus(1),
            (_, KeyCode::Up) => self.move_focus(-1),
            _ => return false,
        }
        true
    }

    fn move_focus(&mut self, delta: isize) {
        let count = self.slots().len();
        if count == 0 {
            return;
        }
        self.blur();
        self.focus = (self.focus as isize + delta).rem_euclid(count as isize) as usize;
    }

    /// The focused field loses focus and counts as touched.
    fn blur(&mut self) {
        if let Some(field) = self.focused_slot().and_then(Slot::field) {
            self.form.touch(field);
        }
    }

    fn push_text(&mut self, slot: Slot) {
        let Some(text) = self.inputs.get(slot).map(InputBuffer::text) else {
            return;
        };
        match (&mut self.form, slot) {
            (ActiveForm::Personal(f), Slot::Username) => {
                f.set_username(text);
                self.username_status = None;
            }
            (ActiveForm::Personal(f), Slot::CurrentPassword) => f.set_current_password(text),
            (ActiveForm::Personal(f), Slot::NewPassword) => f.set_new_password(text),
            (ActiveForm::Professional(f), Slot::CompanyName) => f.set_company_name(text),
            (ActiveForm::Professional(f), Slot::Address1) => f.set_address1(text),
            _ => {}
        }
    }

    /// Read the typed path as the photo. An empty path removes the photo.
    fn load_photo(&mut self) {
        let ActiveForm::Personal(form) = &mut self.form else {
            return;
        };
        let path = self.inputs.photo_path.text().trim();
        if path.is_empty() {
            form.clear_photo();
        } else {
            form.select_photo_path(Path::new(path));
        }
        form.touch(Field::Photo);
    }

    fn cycle_profession(&mut self, delta: isize) {
        let ActiveForm::Professional(form) = &mut self.form else {
            return;
        };
        let len = Profession::ALL.len() as isize;
        let next = match form
            .profession
            .and_then(|p| Profession::ALL.iter().position(|&q| q == p))
        {
            Some(i) => (i as isize + delta).rem_euclid(len),
            None if delta > 0 => 0,
            None => len - 1,
        };
        form.set_profession(Some(Profession::ALL[next as usize]));
        // Leaving Entrepreneur clears the company value
        self.inputs.company_name = InputBuffer::with_text(&form.company_name);
    }

    fn cycle_plan(&mut self, delta: isize) {
        let ActiveForm::Preferences(form) = &mut self.form else {
            return;
        };
        let len = Plan::ALL.len() as isize;
        let current = Plan::ALL
            .iter()
            .position(|&p| p == form.plan)
            .unwrap_or(0) as isize;
        form.set_plan(Plan::ALL[(current + delta).rem_euclid(len) as usize]);
    }

    fn toggle_newsletter(&mut self) {
        if let ActiveForm::Preferences(form) = &mut self.form {
            let value = !form.newsletter;
            form.set_newsletter(value);
        }
    }

    fn move_cursor(&mut self, level: GeoLevel, delta: isize) {
        let ActiveForm::Preferences(form) = &self.form else {
            return;
        };
        let len = form.level(level).options().len();
        if len == 0 {
            return;
        }
        let cursor = &mut self.cursors[level_index(level)];
        *cursor = (*cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Select the highlighted option and start the dependent fetch.
    fn pick(&mut self, level: GeoLevel, services: &Services) {
        let ActiveForm::Preferences(form) = &mut self.form else {
            return;
        };
        let Some(option) = form
            .level(level)
            .options()
            .get(self.cursors[level_index(level)])
            .cloned()
        else {
            return;
        };

        let request = match level {
            GeoLevel::Country => {
                self.cursors[1] = 0;
                self.cursors[2] = 0;
                form.select_country_option(&option)
            }
            GeoLevel::State => {
                self.cursors[2] = 0;
                form.select_state_option(&option)
            }
            GeoLevel::City => {
                form.select_city_option(&option);
                None
            }
        };
        services.spawn_geo(request);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let step = self.controller.step();
        let title = if self.controller.is_submitted() {
            " Profile Wizard ".to_string()
        } else {
            format!(
                " Profile Wizard - Step {} of {}: {} ",
                step.number(),
                WizardStep::ALL.len(),
                step.title()
            )
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::TEXT_MUTED));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.controller.is_submitted() {
            self.render_submitted(frame, inner);
            return;
        }

        let chunks = Layout::vertical([
            Constraint::Length(2), // Progress
            Constraint::Min(5),    // Step body
            Constraint::Length(1), // Help
        ])
        .split(inner);

        self.render_progress(frame, chunks[0]);
        match &self.form {
            ActiveForm::Personal(_) => self.render_personal(frame, chunks[1]),
            ActiveForm::Professional(_) => self.render_professional(frame, chunks[1]),
            ActiveForm::Preferences(form) => self.render_preferences(frame, chunks[1], form),
            ActiveForm::Review => self.render_review(frame, chunks[1]),
        }
        self.render_help(frame, chunks[2]);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);
        let current = self.controller.step();

        let spans: Vec<Span> = WizardStep::ALL
            .iter()
            .map(|&step| {
                let (marker, style) = if step == current {
                    ("▸", theme::highlight())
                } else if self.controller.is_step_completed(step) {
                    ("✓", Style::default().fg(theme::SUCCESS))
                } else {
                    (" ", theme::dim())
                };
                Span::styled(
                    format!(" {marker} {}. {} ", step.number(), step.title()),
                    style,
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

        let percent = self.controller.progress_percent();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme::PRIMARY).bg(theme::BG_BASE))
            .percent(u16::from(percent))
            .label(format!("{percent}% complete"));
        frame.render_widget(gauge, rows[1]);
    }

    fn is_focused(&self, slot: Slot) -> bool {
        self.focused_slot() == Some(slot)
    }

    fn render_personal(&self, frame: &mut Frame, area: Rect) {
        let ActiveForm::Personal(form) = &self.form else {
            return;
        };
        let errors = self.form.visible_errors();
        let chunks = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

        let photo_line = if let Some(error) = &form.photo_error {
            error_line(error)
        } else if let Some(photo) = &form.photo {
            Line::from(vec![
                Span::styled("✓ ", Style::default().fg(theme::SUCCESS)),
                Span::raw(format!("{} ({} bytes) ", photo.file_name, photo.size())),
                Span::styled(
                    form.photo_preview.clone().unwrap_or_default(),
                    theme::dim(),
                ),
            ])
        } else {
            Line::from(Span::styled(
                "Optional. Enter a JPG/PNG path and press Enter",
                theme::dim(),
            ))
        };
        self.render_text_field(frame, chunks[0], Slot::PhotoPath, "Profile Photo (path)", false, photo_line, form.photo_error.is_some());

        let username_line = match (errors.get(Field::Username), &self.username_status) {
            (Some(error), _) => error_line(error),
            (None, Some((_, true))) => {
                Line::from(Span::styled("Username is available", Style::default().fg(theme::SUCCESS)))
            }
            (None, Some((_, false))) => error_line("Username is taken"),
            (None, None) => Line::raw(""),
        };
        self.render_text_field(frame, chunks[1], Slot::Username, Field::Username.label(), false, username_line, errors.contains(Field::Username));

        self.render_text_field(
            frame,
            chunks[2],
            Slot::CurrentPassword,
            Field::CurrentPassword.label(),
            true,
            message_line(&errors, Field::CurrentPassword),
            errors.contains(Field::CurrentPassword),
        );

        let mut strength_spans = Vec::new();
        if let Some(strength) = form.password_strength() {
            strength_spans.push(Span::raw("Strength: "));
            strength_spans.push(Span::styled(
                strength.label(),
                Style::default()
                    .fg(theme::strength_color(strength))
                    .add_modifier(Modifier::BOLD),
            ));
            strength_spans.push(Span::raw("  "));
        }
        if let Some(error) = errors.get(Field::NewPassword) {
            strength_spans.push(Span::styled(error.to_string(), theme::error_text()));
        }
        self.render_text_field(
            frame,
            chunks[3],
            Slot::NewPassword,
            Field::NewPassword.label(),
            true,
            Line::from(strength_spans),
            errors.contains(Field::NewPassword),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn render_text_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        slot: Slot,
        title: &str,
        masked: bool,
        message: Line<'_>,
        has_error: bool,
    ) {
        let Some(buffer) = self.inputs.get(slot) else {
            return;
        };
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).split(area);
        let focused = self.is_focused(slot);

        let block = theme::block_field(title, focused, has_error);
        let inner = block.inner(rows[0]);
        frame.render_widget(
            Paragraph::new(buffer.display(masked)).block(block),
            rows[0],
        );
        frame.render_widget(Paragraph::new(message), rows[1]);

        if focused {
            let column = buffer.cursor_column().min(usize::from(inner.width.saturating_sub(1)));
            frame.set_cursor_position((inner.x + column as u16, inner.y));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_choice(
        &self,
        frame: &mut Frame,
        area: Rect,
        slot: Slot,
        title: &str,
        value: Option<&str>,
        message: Line<'_>,
        has_error: bool,
    ) {
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).split(area);
        let focused = self.is_focused(slot);
        let content = match value {
            Some(v) => Line::from(vec![
                Span::styled("◂ ", theme::muted()),
                Span::styled(v.to_string(), theme::highlight()),
                Span::styled(" ▸", theme::muted()),
            ]),
            None => Line::from(Span::styled("◂ Select ▸", theme::dim())),
        };
        frame.render_widget(
            Paragraph::new(content).block(theme::block_field(title, focused, has_error)),
            rows[0],
        );
        frame.render_widget(Paragraph::new(message), rows[1]);
    }

    fn render_professional(&self, frame: &mut Frame, area: Rect) {
        let ActiveForm::Professional(form) = &self.form else {
            return;
        };
        let errors = self.form.visible_errors();
        let chunks = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

        self.render_choice(
            frame,
            chunks[0],
            Slot::Profession,
            Field::Profession.label(),
            form.profession.map(Profession::as_str),
            message_line(&errors, Field::Profession),
            errors.contains(Field::Profession),
        );

        let mut next = 1;
        if form.shows_company() {
            self.render_text_field(
                frame,
                chunks[next],
                Slot::CompanyName,
                Field::CompanyName.label(),
                false,
                message_line(&errors, Field::CompanyName),
                errors.contains(Field::CompanyName),
            );
            next += 1;
        }

        self.render_text_field(
            frame,
            chunks[next],
            Slot::Address1,
            Field::Address1.label(),
            false,
            message_line(&errors, Field::Address1),
            errors.contains(Field::Address1),
        );
    }

    fn render_preferences(&self, frame: &mut Frame, area: Rect, form: &PreferencesForm) {
        let errors = self.form.visible_errors();
        let rows = Layout::vertical([
            Constraint::Min(6),    // Location lists
            Constraint::Length(1), // Location errors
            Constraint::Length(3), // Plan
            Constraint::Length(3), // Newsletter
        ])
        .split(area);

        let columns = Layout::horizontal([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);
        let messages = Layout::horizontal([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);

        for (i, (slot, field, waiting_on)) in [
            (Slot::Country, Field::Country, ""),
            (Slot::State, Field::State, "Select a country first"),
            (Slot::City, Field::City, "Select a state first"),
        ]
        .into_iter()
        .enumerate()
        {
            self.render_geo_list(frame, columns[i], form, slot, field, waiting_on, errors.contains(field));
            frame.render_widget(Paragraph::new(message_line(&errors, field)), messages[i]);
        }

        self.render_choice(
            frame,
            rows[2],
            Slot::Plan,
            "Subscription Plan",
            Some(form.plan.as_str()),
            Line::raw(""),
            false,
        );

        let checkbox = if form.newsletter { "[x]" } else { "[ ]" };
        let focused = self.is_focused(Slot::Newsletter);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(checkbox, theme::highlight()),
                Span::raw(" Subscribe to newsletter"),
            ]))
            .block(theme::block_field("Newsletter", focused, false)),
            rows[3],
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn render_geo_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        form: &PreferencesForm,
        slot: Slot,
        field: Field,
        waiting_on: &str,
        has_error: bool,
    ) {
        let Some(level) = slot.level() else {
            return;
        };
        let block = theme::block_field(field.label(), self.is_focused(slot), has_error);

        let placeholder = match form.level(level) {
            LevelState::NotRequested => Some(waiting_on),
            LevelState::Loading { .. } => Some("Loading…"),
            LevelState::Loaded(options) if options.is_empty() => Some("No options"),
            LevelState::Loaded(_) => None,
        };
        if let Some(text) = placeholder {
            frame.render_widget(
                Paragraph::new(Span::styled(text, theme::dim()))
                    .block(block)
                    .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }

        let chosen = selected_index(form, level);
        let items: Vec<ListItem> = form
            .level(level)
            .options()
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let marker = if chosen == Some(i) { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme::SUCCESS)),
                    Span::raw(option.name.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme::highlight())
            .highlight_symbol("▸ ");

        let mut state = ListState::default();
        state.select(Some(self.cursors[level_index(level)]));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_review(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        for section in self.controller.review().sections() {
            lines.push(Line::from(Span::styled(format!("  {}", section.title), theme::heading())));
            for (label, value) in section.rows {
                lines.push(Line::from(vec![
                    Span::styled(format!("    {label:<20}"), theme::muted()),
                    Span::styled(value, Style::default().fg(theme::TEXT)),
                ]));
            }
            lines.push(Line::raw(""));
        }

        if self.controller.is_submitting() {
            lines.push(Line::from(Span::styled("  Submitting…", Style::default().fg(theme::INFO))));
        } else if let Some(error) = self.controller.submit_error() {
            lines.push(Line::from(vec![
                Span::styled("  ✗ ", theme::error_text().add_modifier(Modifier::BOLD)),
                Span::styled(error.to_string(), theme::error_text()),
            ]));
        }

        let submit_style = if self.controller.can_submit() {
            Style::default().fg(theme::SUCCESS).add_modifier(Modifier::BOLD)
        } else {
            theme::dim()
        };
        lines.push(Line::from(vec![
            Span::styled("  Enter", submit_style),
            Span::raw(" to submit"),
        ]));

        frame.render_widget(
            Paragraph::new(lines)
                .block(theme::block_default("Review & Submit"))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_submitted(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled("Thank you for submitting!", theme::title())),
            Line::raw(""),
        ];
        if let Some(user_id) = self.controller.user_id() {
            lines.push(Line::from(vec![
                Span::styled("Profile id: ", theme::muted()),
                Span::raw(user_id.to_string()),
            ]));
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(vec![
            Span::raw("Press "),
            Span::styled("q", Style::default().fg(theme::PRIMARY_LIGHT).add_modifier(Modifier::BOLD)),
            Span::raw(" to quit"),
        ]));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("Tab", theme::key_hint()),
            Span::raw(":field  "),
        ];
        match self.controller.step() {
            WizardStep::Review => {
                spans = vec![Span::styled("Enter", theme::key_hint()), Span::raw(":submit  ")];
            }
            WizardStep::Preferences => {
                spans.push(Span::styled("j/k", theme::key_hint()));
                spans.push(Span::raw(":move  "));
                spans.push(Span::styled("Enter", theme::key_hint()));
                spans.push(Span::raw(":select  "));
            }
            WizardStep::Professional => {
                spans.push(Span::styled("←/→", theme::key_hint()));
                spans.push(Span::raw(":choose  "));
            }
            WizardStep::Personal => {
                spans.push(Span::styled("Ctrl+U", theme::key_hint()));
                spans.push(Span::raw(":check username  "));
            }
        }
        if self.controller.step() != WizardStep::Review {
            spans.push(Span::styled("Ctrl+N", theme::key_hint()));
            spans.push(Span::raw(":next  "));
        }
        if self.controller.can_go_back() {
            spans.push(Span::styled("Esc", theme::key_hint()));
            spans.push(Span::raw(":back"));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Index of the current selection within a loaded level.
fn selected_index(form: &PreferencesForm, level: GeoLevel) -> Option<usize> {
    let options = form.level(level).options();
    match level {
        GeoLevel::Country => options.iter().position(|o| o.code == form.location.country()),
        GeoLevel::State => options.iter().position(|o| o.code == form.location.state()),
        GeoLevel::City => options.iter().position(|o| o.name == form.location.city()),
    }
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(message.to_string(), theme::error_text()))
}

fn message_line(errors: &FieldErrors, field: Field) -> Line<'static> {
    errors.get(field).map(error_line).unwrap_or_default()
}

fn notify(services: &Services, message: impl Into<String>, level: NotificationLevel) {
    let _ = services
        .event_tx
        .send(AppEvent::Notification(Notification::new(message, level)));
}
