use crate::feed::{self, FeedError, Source};
use crate::kanban_board::KanbanBoard;
use crate::sync::StatusSink;
use crate::task::{toggled_status, Priority, Record};
use crate::view::{self, ViewOptions};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(200);

/// Board state for one terminal session.
pub struct App {
    pub board: KanbanBoard,
    pub view: ViewOptions,
    pub selected_column: usize,
    pub selected_task: usize,
    pub loading: bool,
    pub message: Option<String>,
}

impl App {
    pub fn new(view: ViewOptions) -> Self {
        Self {
            board: KanbanBoard::new(),
            view,
            selected_column: 0,
            selected_task: 0,
            loading: false,
            message: None,
        }
    }

    pub fn column_tasks(&self, column: Priority) -> Vec<&Record> {
        view::column(self.board.tasks(), &self.view, column)
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.selected_column]
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.column_tasks(self.selected_priority())
            .get(self.selected_task)
            .copied()
    }

    /// Applies a finished load. On failure the previous rows stay on screen.
    pub fn finish_load(&mut self, result: Result<Vec<Record>, FeedError>) {
        self.loading = false;
        match result {
            Ok(records) => {
                self.message = Some(format!("Loaded {} rows", records.len()));
                self.board.replace(records);
            }
            Err(err) => self.message = Some(err.to_string()),
        }
        self.clamp_selection();
    }

    /// Flips the selected card between Pending and Complete, then queues the
    /// remote update.
    pub fn toggle_selected(&mut self, sink: &dyn StatusSink) {
        let Some(record) = self.selected_record() else {
            return;
        };
        let id = record.id().to_string();
        let status = toggled_status(record.status());
        if self.board.set_status(&id, status) {
            tracing::info!("toggled {} to {}", id, status);
            self.message = Some(format!("{} marked {}", id, status));
            sink.notify(&id, status);
        }
        self.clamp_selection();
    }

    pub fn toggle_show_complete(&mut self) {
        self.view.show_complete = !self.view.show_complete;
        self.clamp_selection();
    }

    pub fn toggle_sort(&mut self) {
        self.view.sort = self.view.sort.toggle();
        self.selected_task = 0;
    }

    pub fn move_column(&mut self, direction: isize) {
        let last = Priority::ALL.len() as isize - 1;
        self.selected_column = (self.selected_column as isize + direction).clamp(0, last) as usize;
        self.clamp_selection();
    }

    pub fn move_task(&mut self, direction: isize) {
        let count = self.column_tasks(self.selected_priority()).len() as isize;
        if count == 0 {
            self.selected_task = 0;
            return;
        }
        self.selected_task = (self.selected_task as isize + direction).clamp(0, count - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let count = self.column_tasks(self.selected_priority()).len();
        if self.selected_task >= count {
            self.selected_task = count.saturating_sub(1);
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    source: &Source,
    sink: &dyn StatusSink,
) -> io::Result<()> {
    let mut pending = Some(start_load(app, source));
    loop {
        if let Some(rx) = &pending {
            match rx.try_recv() {
                Ok(result) => {
                    app.finish_load(result);
                    pending = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    app.loading = false;
                    app.message = Some("Loader stopped without a result".to_string());
                    pending = None;
                }
            }
        }

        terminal.draw(|f| draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Left => app.move_column(-1),
                KeyCode::Right => app.move_column(1),
                KeyCode::Up => app.move_task(-1),
                KeyCode::Down => app.move_task(1),
                KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(sink),
                KeyCode::Char('c') => app.toggle_show_complete(),
                KeyCode::Char('p') => app.toggle_sort(),
                KeyCode::Char('r') => {
                    if pending.is_none() {
                        pending = Some(start_load(app, source));
                    }
                }
                _ => {}
            }
        }
    }
}

fn start_load(app: &mut App, source: &Source) -> Receiver<Result<Vec<Record>, FeedError>> {
    app.loading = true;
    app.message = None;
    feed::spawn_load(source.clone())
}

fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = format!(
        " Task Board | sort: {} | completed: {}{}",
        app.view.sort.label(),
        if app.view.show_complete { "shown" } else { "hidden" },
        if app.loading { " | Loading…" } else { "" },
    );
    f.render_widget(
        Paragraph::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[1]);

    for (i, priority) in Priority::ALL.iter().enumerate() {
        let tasks = app.column_tasks(*priority);
        let items: Vec<ListItem> = tasks.iter().map(|t| card(t, app.loading)).collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("{} ({})", priority.label(), tasks.len()))
                    .borders(Borders::ALL)
                    .border_style(if app.selected_column == i {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if app.selected_column == i && !tasks.is_empty() {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }

    let footer = match &app.message {
        Some(msg) => msg.clone(),
        None => "←/→ column  ↑/↓ card  Enter toggle  c completed  p sort  r refresh  q quit"
            .to_string(),
    };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}

fn card(t: &Record, dimmed: bool) -> ListItem<'static> {
    let base = if t.is_complete() || dimmed {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let client = if t.client().is_empty() { "No Client" } else { t.client() };

    let mut lines = vec![
        Line::from(Span::styled(client.to_string(), base.add_modifier(Modifier::ITALIC))),
        Line::from(Span::styled(t.task().to_string(), base.add_modifier(Modifier::BOLD))),
    ];
    if let Some(date) = view::display_date(t.date()) {
        lines.push(Line::from(Span::styled(format!("Due {}", date), base)));
    }
    if !t.notes().is_empty() {
        lines.push(Line::from(Span::styled(t.notes().to_string(), base)));
    }
    let action = if t.is_complete() { "[↩ Undo]" } else { "[✔ Finish]" };
    lines.push(Line::from(Span::styled(action, base.fg(Color::Green))));
    lines.push(Line::default());
    ListItem::new(Text::from(lines))
}
