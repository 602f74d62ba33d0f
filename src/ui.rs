use crate::config::Config;
use crate::editor::{Committed, EditorDraft};
use crate::model::{EntryId, JournalEntry};
use crate::session::{Notice, Session, TimerStatus};
use crate::timer::format_mm_ss;
use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::HashSet;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn run(config: &Config) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(config, today());
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    session: Session,
    form: EntryForm,
    mode: Mode,
    list_state: ListState,
    expanded: HashSet<EntryId>,
    timer_status: TimerStatus,
    refresh: Duration,
    status: String,
    status_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Form,
    ConfirmDelete { index: usize },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FormField {
    Date,
    Title,
    Content,
}

/// Text state of the sidebar form. The same form serves both new entries and
/// edits; the draft's editing target decides which one a submit performs.
struct EntryForm {
    date: FieldValue,
    title: FieldValue,
    content: FieldValue,
    field: FormField,
    target: Option<EntryId>,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn set(&mut self, value: String) {
        self.cursor = value.len();
        self.value = value;
    }

    fn move_left(&mut self) {
        self.cursor = prev_boundary(&self.value, self.cursor);
    }

    fn move_right(&mut self) {
        self.cursor = next_boundary(&self.value, self.cursor);
    }

    fn move_up(&mut self) {
        let (row, col) = row_col(&self.value, self.cursor);
        if row > 0 {
            self.cursor = index_at(&self.value, row - 1, col);
        }
    }

    fn move_down(&mut self) {
        let (row, col) = row_col(&self.value, self.cursor);
        if row + 1 < self.value.split('\n').count() {
            self.cursor = index_at(&self.value, row + 1, col);
        }
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_boundary(&self.value, self.cursor);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.cursor, '▌');
        text
    }
}

impl EntryForm {
    fn from_draft(draft: &EditorDraft) -> Self {
        EntryForm {
            date: FieldValue::new(&draft.date.format(DATE_FORMAT).to_string()),
            title: FieldValue::new(&draft.title),
            content: FieldValue::new(&draft.content),
            field: FormField::Title,
            target: draft.editing().map(str::to_string),
        }
    }

    fn is_editing(&self) -> bool {
        self.target.is_some()
    }

    fn parsed_date(&self) -> Result<NaiveDate> {
        let raw = self.date.value.trim();
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
    }

    /// Copies the form text into the draft; nothing is written when the date
    /// does not parse.
    fn apply_to(&self, draft: &mut EditorDraft) -> Result<()> {
        let date = self.parsed_date()?;
        draft.date = date;
        draft.title = self.title.value.clone();
        draft.content = self.content.value.clone();
        Ok(())
    }

    fn shift_date(&mut self, days: i64) {
        let shifted = self
            .parsed_date()
            .ok()
            .and_then(|d| d.checked_add_signed(ChronoDuration::days(days)));
        if let Some(date) = shifted {
            self.date.set(date.format(DATE_FORMAT).to_string());
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Date => FormField::Title,
            FormField::Title => FormField::Content,
            FormField::Content => FormField::Date,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Date => FormField::Content,
            FormField::Title => FormField::Date,
            FormField::Content => FormField::Title,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Date => &mut self.date,
            FormField::Title => &mut self.title,
            FormField::Content => &mut self.content,
        }
    }
}

impl App {
    fn new(config: &Config, today: NaiveDate) -> Self {
        let session = Session::new(config.timer_minutes, today);
        let form = EntryForm::from_draft(session.draft());
        App {
            session,
            form,
            mode: Mode::Normal,
            list_state: ListState::default(),
            expanded: HashSet::new(),
            timer_status: TimerStatus::Idle,
            refresh: Duration::from_millis(config.refresh_ms),
            status: "Press n to write a new entry".into(),
            status_color: Color::Gray,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.poll_timer();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(self.refresh)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn poll_timer(&mut self) {
        self.timer_status = self.session.poll_timer(Utc::now());
        if self.timer_status == TimerStatus::Expired {
            self.set_status("Time's up!", Color::LightGreen);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Form => {
                self.handle_form_key(key);
                Ok(false)
            }
            Mode::ConfirmDelete { index } => {
                self.handle_confirm_key(index, key);
                Ok(false)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('n') => {
                self.session.cancel_edit(today());
                self.form = EntryForm::from_draft(self.session.draft());
                self.mode = Mode::Form;
                self.set_status(
                    "New entry (Tab/Shift-Tab move, Ctrl+S save, Esc leave form)",
                    Color::Gray,
                );
            }
            KeyCode::Tab | KeyCode::Char('i') => {
                self.mode = Mode::Form;
                self.set_status("Back to the form", Color::Gray);
            }
            KeyCode::Char('e') => match self.selected() {
                Some(index) => {
                    if self.session.begin_edit(index).is_ok() {
                        self.form = EntryForm::from_draft(self.session.draft());
                        self.mode = Mode::Form;
                        let title = self.session.draft().title.clone();
                        self.set_status(
                            format!("Editing \"{}\" (Ctrl+S update, Esc cancel)", title),
                            Color::LightYellow,
                        );
                    } else {
                        self.show_notice();
                        self.clamp_selection();
                    }
                }
                None => self.set_status("No entry selected to edit", Color::Gray),
            },
            KeyCode::Char('d') => match self.selected() {
                Some(index) => {
                    self.mode = Mode::ConfirmDelete { index };
                    self.set_status(
                        "Delete entry? (y to confirm, n/Esc to cancel)",
                        Color::LightRed,
                    );
                }
                None => self.set_status("No entry selected to delete", Color::Gray),
            },
            KeyCode::Char('s') => {
                self.session.start_timer(Utc::now());
                self.poll_timer();
                let minutes = self.session.timer().duration_minutes();
                self.set_status(format!("Timer started for {} min", minutes), Color::Cyan);
            }
            KeyCode::Char('x') => {
                if self.session.timer().is_running() {
                    self.session.stop_timer();
                    self.poll_timer();
                    self.set_status("Timer stopped", Color::Gray);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_minutes(1),
            KeyCode::Char('-') => self.adjust_minutes(-1),
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                if self.form.is_editing() {
                    self.session.cancel_edit(today());
                    self.form = EntryForm::from_draft(self.session.draft());
                    self.set_status("Edit canceled", Color::Gray);
                } else {
                    self.set_status("Draft kept, press Tab to resume", Color::Gray);
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('s') if control => self.submit(),
            KeyCode::Tab => self.form.next_field(),
            KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Left => self.form.active_field_mut().move_left(),
            KeyCode::Right => self.form.active_field_mut().move_right(),
            KeyCode::Up => match self.form.field {
                FormField::Date => self.form.shift_date(1),
                _ => self.form.active_field_mut().move_up(),
            },
            KeyCode::Down => match self.form.field {
                FormField::Date => self.form.shift_date(-1),
                _ => self.form.active_field_mut().move_down(),
            },
            KeyCode::Enter => {
                if self.form.field == FormField::Content && !control {
                    self.form.content.insert_char('\n');
                } else {
                    self.submit();
                }
            }
            KeyCode::Backspace => self.form.active_field_mut().backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, index: usize, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Ok(entry) = self.session.delete(index, today()) {
                    self.expanded.remove(&entry.id);
                    if self.form.target.as_deref() == Some(entry.id.as_str()) {
                        self.form = EntryForm::from_draft(self.session.draft());
                    }
                }
                self.show_notice();
                self.clamp_selection();
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.set_status("Delete canceled", Color::Gray);
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        if let Err(err) = self.form.apply_to(self.session.draft_mut()) {
            self.set_status(format!("Could not save: {}", err), Color::LightRed);
            return;
        }
        match self.session.submit(today()) {
            Ok(committed) => {
                debug!(?committed, "form submitted");
                self.form = EntryForm::from_draft(self.session.draft());
                self.mode = Mode::Normal;
                let id = match &committed {
                    Committed::Added(id) | Committed::Updated(id) => id,
                };
                if let Some(pos) = self.session.store().position_of(id) {
                    self.list_state.select(Some(pos));
                }
            }
            Err(_) => self.clamp_selection(),
        }
        self.show_notice();
    }

    fn adjust_minutes(&mut self, delta: i64) {
        let current = i64::from(self.session.timer().duration_minutes());
        let minutes = self.session.set_timer_minutes(current + delta);
        let suffix = if self.session.timer().is_running() {
            " (applies on next start)"
        } else {
            ""
        };
        self.set_status(format!("Timer set to {} min{}", minutes, suffix), Color::Cyan);
    }

    fn show_notice(&mut self) {
        let (text, color) = match self.session.notice() {
            Some(Notice::Success(text)) => (text.clone(), Color::LightGreen),
            Some(Notice::Failure(text)) => (text.clone(), Color::LightRed),
            None => return,
        };
        self.set_status(text, color);
        self.session.clear_notice();
    }

    fn set_status(&mut self, text: impl Into<String>, color: Color) {
        self.status = text.into();
        self.status_color = color;
    }

    fn selected(&self) -> Option<usize> {
        self.list_state
            .selected()
            .filter(|idx| *idx < self.session.entries().len())
    }

    fn select_prev(&mut self) {
        let idx = self.selected().unwrap_or(0);
        if !self.session.entries().is_empty() {
            self.list_state.select(Some(idx.saturating_sub(1)));
        }
    }

    fn select_next(&mut self) {
        let len = self.session.entries().len();
        if len == 0 {
            return;
        }
        let next = self.selected().map(|idx| idx + 1).unwrap_or(0);
        self.list_state.select(Some(next.min(len - 1)));
    }

    fn clamp_selection(&mut self) {
        let len = self.session.entries().len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            let idx = self.list_state.selected().unwrap_or(0).min(len - 1);
            self.list_state.select(Some(idx));
        }
    }

    fn toggle_selected(&mut self) {
        let id = match self.selected().and_then(|idx| self.session.store().get(idx)) {
            Some(entry) => entry.id.clone(),
            None => return,
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);
        self.draw_entries(f, body[0]);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(6)])
            .split(body[1]);
        self.draw_form(f, sidebar[0]);
        self.draw_timer(f, sidebar[1]);

        self.draw_footer(f, layout[2]);

        if let Mode::ConfirmDelete { index } = self.mode {
            self.draw_confirm(f, index);
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let count = self.session.entries().len();
        let mut spans = vec![
            Span::styled(
                "ThoughtStream Journal",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} entr{}", count, if count == 1 { "y" } else { "ies" }),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("timer {} min", self.session.timer().duration_minutes()),
                Style::default().fg(Color::Magenta),
            ),
        ];
        if let TimerStatus::Running(countdown) = self.timer_status {
            spans.push(Span::raw("  •  "));
            spans.push(Span::styled(
                countdown.label(),
                Style::default().fg(Color::LightYellow),
            ));
        }
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_entries(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                "Journal Entries",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if self.mode == Mode::Normal {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        if self.session.store().is_empty() {
            let msg = Paragraph::new("No entries yet. Press n to write one.")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(msg, area);
            return;
        }

        self.clamp_selection();
        let width = area.width.saturating_sub(4) as usize;
        let selected = self.selected();
        let items = self
            .session
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry_item(
                    entry,
                    self.expanded.contains(&entry.id),
                    selected == Some(idx),
                    width,
                )
            })
            .collect::<Vec<_>>();
        let list = List::new(items).block(block);
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.mode == Mode::Form;
        let (title, accent) = if self.form.is_editing() {
            ("Edit Entry", Color::LightYellow)
        } else {
            ("New Entry", Color::Cyan)
        };
        let mut lines = Vec::new();
        lines.extend(field_lines(
            "Date",
            &self.form.date,
            focused && self.form.field == FormField::Date,
        ));
        lines.extend(field_lines(
            "Title",
            &self.form.title,
            focused && self.form.field == FormField::Title,
        ));
        lines.extend(field_lines(
            "Content",
            &self.form.content,
            focused && self.form.field == FormField::Content,
        ));
        lines.push(Line::from(""));
        let hint = match (focused, self.form.is_editing()) {
            (false, _) => "n new • e edit selected • Tab resume",
            (true, false) => "Ctrl+S add • Esc leave • ↑↓ on date shifts a day",
            (true, true) => "Ctrl+S update • Esc cancel edit • ↑↓ on date shifts a day",
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::Gray),
        )));
        let form = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default().fg(accent).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(if focused {
                        accent
                    } else {
                        Color::DarkGray
                    })),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(form, area);
    }

    fn draw_timer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let minutes = self.session.timer().duration_minutes();
        let block = Block::default()
            .title(Span::styled(
                format!("Timer ({} min)", minutes),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let (ratio, text, color) = match self.timer_status {
            TimerStatus::Running(countdown) => (
                countdown.progress(),
                format!("Time remaining: {}", countdown.label()),
                Color::LightYellow,
            ),
            _ if self.session.times_up() => (1.0, "Time's up!".to_string(), Color::LightGreen),
            _ => (
                0.0,
                format!("Ready: {}", format_mm_ss(i64::from(minutes) * 60)),
                Color::Gray,
            ),
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Rgb(22, 24, 30)))
            .ratio(ratio)
            .label(format!("{:.0}%", ratio * 100.0));
        f.render_widget(gauge, rows[0]);
        f.render_widget(
            Paragraph::new(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            rows[1],
        );
        f.render_widget(
            Paragraph::new(Span::styled(
                "s start • x stop • +/- minutes",
                Style::default().fg(Color::DarkGray),
            )),
            rows[2],
        );
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(Span::styled(
            self.status.clone(),
            Style::default().fg(self.status_color),
        ))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let spans = match self.mode {
            Mode::Normal => vec![
                key("↑↓ / j k", Color::LightCyan),
                Span::raw(" select  "),
                key("Enter", Color::LightCyan),
                Span::raw(" expand  "),
                key("n", Color::LightMagenta),
                Span::raw(" new  "),
                key("e", Color::LightYellow),
                Span::raw(" edit  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
                key("s/x", Color::LightGreen),
                Span::raw(" timer  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ],
            Mode::Form => vec![
                key("Tab/Shift-Tab", Color::LightCyan),
                Span::raw(" field  "),
                key("Enter", Color::LightCyan),
                Span::raw(" newline in content  "),
                key("Ctrl+S", Color::LightGreen),
                Span::raw(" save  "),
                key("Esc", Color::LightRed),
                Span::raw(" leave"),
            ],
            Mode::ConfirmDelete { .. } => vec![
                key("y", Color::LightRed),
                Span::raw(" delete  "),
                key("n/Esc", Color::LightCyan),
                Span::raw(" keep"),
            ],
        };
        Line::from(spans)
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, index: usize) {
        let area = centered_rect(50, 30, f.size());
        let heading = self
            .session
            .store()
            .get(index)
            .map(JournalEntry::heading)
            .unwrap_or_else(|| format!("entry #{}", index + 1));
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", heading),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled(
                        "Confirm Delete",
                        Style::default()
                            .fg(Color::LightRed)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightRed)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let rows = Layout::default()
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
        .split(rows[1])[1]
}

fn prev_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(cursor)
}

/// Row and column (in chars) of a byte cursor in multi-line text.
fn row_col(text: &str, cursor: usize) -> (usize, usize) {
    let before = &text[..cursor];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (row, before[line_start..].chars().count())
}

fn index_at(text: &str, row: usize, col: usize) -> usize {
    let mut start = 0;
    for (i, line) in text.split('\n').enumerate() {
        if i == row {
            return start
                + line
                    .char_indices()
                    .nth(col)
                    .map(|(idx, _)| idx)
                    .unwrap_or(line.len());
        }
        start += line.len() + 1;
    }
    text.len()
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn entry_item(
    entry: &JournalEntry,
    expanded: bool,
    selected: bool,
    width: usize,
) -> ListItem<'static> {
    let marker = if expanded { "▾ " } else { "▸ " };
    let mut lines = vec![Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::DarkGray)),
        Span::styled(
            entry.date.format(DATE_FORMAT).to_string(),
            Style::default().fg(Color::LightYellow),
        ),
        Span::raw(" - "),
        Span::styled(
            truncate_text(&entry.title, width.saturating_sub(15).max(8)),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ])];
    if expanded {
        if entry.content.is_empty() {
            lines.push(Line::from(Span::styled(
                "  (no content)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for line in entry.content.lines() {
            lines.push(Line::from(Span::styled(
                format!("  {}", line),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    let mut item = ListItem::new(lines);
    if selected {
        item = item.style(Style::default().bg(Color::Rgb(40, 44, 56)));
    }
    item
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            let lead = if idx == 0 { prefix.clone() } else { spacer.clone() };
            Line::from(vec![
                Span::styled(lead, label_style),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(&Config::default(), today())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn ctrl(app: &mut App, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
            .unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn clear_field(app: &mut App) {
        for _ in 0..64 {
            press(app, KeyCode::Backspace);
        }
    }

    fn add_entry(app: &mut App, title: &str, content: &str) {
        press(app, KeyCode::Char('n'));
        type_text(app, title);
        press(app, KeyCode::Tab);
        type_text(app, content);
        ctrl(app, 's');
    }

    #[test]
    fn new_entry_is_added_from_form() {
        let mut app = app();
        add_entry(&mut app, "Morning", "quiet\nstart");

        let entries = app.session.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Morning");
        assert_eq!(entries[0].content, "quiet\nstart");
        assert_eq!(entries[0].date, today());
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.status, "Entry added successfully!");
        assert_eq!(app.selected(), Some(0));
        assert!(app.form.title.value.is_empty());
    }

    #[test]
    fn edit_replaces_form_in_place() {
        let mut app = app();
        add_entry(&mut app, "A", "hello");
        add_entry(&mut app, "B", "world");
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected(), Some(0));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode, Mode::Form);
        assert!(app.form.is_editing());
        assert_eq!(app.form.title.value, "A");
        clear_field(&mut app);
        type_text(&mut app, "A2");
        ctrl(&mut app, 's');

        let titles: Vec<&str> = app.session.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A2", "B"]);
        assert_eq!(app.session.entries()[0].content, "hello");
        assert_eq!(app.status, "Entry updated successfully!");
        assert!(!app.form.is_editing());
    }

    #[test]
    fn escape_cancels_edit() {
        let mut app = app();
        add_entry(&mut app, "A", "hello");
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " changed");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.form.is_editing());
        assert!(!app.session.draft().is_editing());
        assert_eq!(app.session.entries()[0].title, "A");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        add_entry(&mut app, "A", "hello");
        add_entry(&mut app, "B", "world");
        press(&mut app, KeyCode::Char('k'));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, Mode::ConfirmDelete { index: 0 });
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session.entries().len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.session.entries().len(), 1);
        assert_eq!(app.session.entries()[0].title, "B");
        assert_eq!(app.status, "Entry deleted successfully!");
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn invalid_date_is_not_committed() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::BackTab);
        clear_field(&mut app);
        type_text(&mut app, "2024-13-01");
        ctrl(&mut app, 's');

        assert!(app.session.entries().is_empty());
        assert_eq!(app.mode, Mode::Form);
        assert!(app.status.contains("invalid date"));
    }

    #[test]
    fn arrows_on_date_field_shift_days() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::BackTab);
        clear_field(&mut app);
        type_text(&mut app, "2024-02-28");
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.form.date.value, "2024-03-01");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.form.date.value, "2024-02-29");
    }

    #[test]
    fn expand_toggles_selected_entry() {
        let mut app = app();
        add_entry(&mut app, "A", "hello");
        let id = app.session.entries()[0].id.clone();
        press(&mut app, KeyCode::Enter);
        assert!(app.expanded.contains(&id));
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.expanded.contains(&id));
    }

    #[test]
    fn timer_keys_drive_the_session() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.session.timer().duration_minutes(), 6);
        for _ in 0..10 {
            press(&mut app, KeyCode::Char('-'));
        }
        assert_eq!(app.session.timer().duration_minutes(), 1);

        press(&mut app, KeyCode::Char('s'));
        assert!(app.session.timer().is_running());
        assert!(matches!(app.timer_status, TimerStatus::Running(_)));

        press(&mut app, KeyCode::Char('x'));
        assert!(!app.session.timer().is_running());
        assert_eq!(app.timer_status, TimerStatus::Idle);
    }

    #[test]
    fn quit_only_from_normal_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form.title.value, "q");
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn cursor_moves_between_content_lines() {
        let mut field = FieldValue::new("abc\nde");
        field.move_up();
        assert_eq!(field.cursor, 2);
        field.move_down();
        assert_eq!(field.cursor, 6);
        field.move_left();
        field.backspace();
        assert_eq!(field.value, "abc\ne");
    }
}
