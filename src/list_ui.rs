use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::{DefaultTerminal, Frame};
use tracing::warn;

use crate::database::ListStore;
use crate::duration::{format_duration, parse_duration};
use crate::entry::{Entry, ListKind, Task, TodoEntry, midnight_utc};
use crate::error::Error;
use crate::list_manager::ListManager;
use crate::rules::{self, MAX_URGENCY};

pub struct ListView {
    tasks: ListManager<Task>,
    todos: ListManager<TodoEntry>,
    screen: ListKind,
    showing_history: bool,
    list_state: ListState,
    message: String,
    /// Text typed after pressing `a`, until Enter or Esc.
    input: Option<String>,
    default_urgency: u8,
    exit: bool,
}

/// Redraw interval, so effective urgency stays current while idle.
const TICK: Duration = Duration::from_millis(500);

pub async fn run(
    store: &ListStore,
    tasks: ListManager<Task>,
    todos: ListManager<TodoEntry>,
    default_urgency: u8,
) -> Result<()> {
    let mut terminal = ratatui::init();
    let mut view = ListView::new(tasks, todos, default_urgency);
    let res = view.event_loop(&mut terminal, store).await;
    ratatui::restore();
    res
}

impl ListView {
    pub fn new(tasks: ListManager<Task>, todos: ListManager<TodoEntry>, default_urgency: u8) -> Self {
        let mut list_state = ListState::default();
        list_state.select_first();
        ListView {
            tasks,
            todos,
            screen: ListKind::Tasks,
            showing_history: false,
            list_state,
            message: String::new(),
            input: None,
            default_urgency,
            exit: false,
        }
    }

    async fn event_loop(&mut self, terminal: &mut DefaultTerminal, store: &ListStore) -> Result<()> {
        while !self.exit {
            terminal.draw(|frame| self.render(frame, Utc::now()))?;
            let next = tokio::task::spawn_blocking(|| -> std::io::Result<Option<Event>> {
                if event::poll(TICK)? {
                    event::read().map(Some)
                } else {
                    Ok(None)
                }
            })
            .await??;
            let Some(Event::Key(key)) = next else {
                continue;
            };
            match self.handle_key(key) {
                Ok(Some(ListKind::Tasks)) => store.save_list(&self.tasks).await?,
                Ok(Some(ListKind::Todos)) => store.save_list(&self.todos).await?,
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "action rejected");
                    self.message = e.to_string();
                }
            }
        }
        Ok(())
    }

    /// Applies one key press. Returns the list kind that changed and needs saving.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ListKind>, Error> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        self.message.clear();
        if let Some(buf) = self.input.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let line = self.input.take().unwrap_or_default();
                    return self.submit(&line, Utc::now());
                }
                KeyCode::Esc => self.input = None,
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char(c) => buf.push(c),
                _ => {}
            }
            return Ok(None);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.exit = true,
            KeyCode::Tab => {
                self.screen = match self.screen {
                    ListKind::Tasks => ListKind::Todos,
                    ListKind::Todos => ListKind::Tasks,
                };
                self.list_state.select_first();
            }
            KeyCode::Char('a') if !self.showing_history => self.input = Some(String::new()),
            KeyCode::Char('h') => {
                self.showing_history = !self.showing_history;
                self.list_state.select_first();
            }
            KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
            KeyCode::Char('s') => {
                match self.screen {
                    ListKind::Tasks => self.tasks.set_sort(self.tasks.sort().next(ListKind::Tasks))?,
                    ListKind::Todos => self.todos.set_sort(self.todos.sort().next(ListKind::Todos))?,
                }
                return Ok(Some(self.screen));
            }
            KeyCode::Char(' ') if !self.showing_history => {
                if let Some(id) = self.selected_id() {
                    match self.screen {
                        ListKind::Tasks => self.tasks.complete(&id).map(|_| ())?,
                        ListKind::Todos => self.todos.toggle(&id).map(|_| ())?,
                    }
                    return Ok(Some(self.screen));
                }
            }
            KeyCode::Char('r') if self.showing_history => {
                if let Some(id) = self.selected_id() {
                    match self.screen {
                        ListKind::Tasks => self.tasks.restore(&id).map(|_| ())?,
                        ListKind::Todos => self.todos.restore(&id).map(|_| ())?,
                    }
                    return Ok(Some(self.screen));
                }
            }
            KeyCode::Char('d') if self.showing_history => {
                if let Some(id) = self.selected_id() {
                    match self.screen {
                        ListKind::Tasks => self.tasks.delete(&id).map(|_| ())?,
                        ListKind::Todos => self.todos.delete(&id).map(|_| ())?,
                    }
                    return Ok(Some(self.screen));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    /// Adds the typed line to the current list. Empty input adds nothing.
    fn submit(&mut self, line: &str, now: DateTime<Utc>) -> Result<Option<ListKind>, Error> {
        match self.screen {
            ListKind::Todos => Ok(self.todos.add_todo(line, now).map(|_| ListKind::Todos)),
            ListKind::Tasks => {
                let form = TaskLine::parse(line);
                let added = self.tasks.add_task(
                    &form.title,
                    form.duration,
                    form.urgency.unwrap_or(self.default_urgency),
                    form.due.map(midnight_utc),
                    now,
                )?;
                Ok(added.map(|_| ListKind::Tasks))
            }
        }
    }

    fn visible_ids(&self) -> Vec<String> {
        match (self.screen, self.showing_history) {
            (ListKind::Tasks, false) => ids(self.tasks.active()),
            (ListKind::Tasks, true) => ids(self.tasks.history()),
            (ListKind::Todos, false) => ids(self.todos.active()),
            (ListKind::Todos, true) => ids(self.todos.history()),
        }
    }

    fn selected_id(&self) -> Option<String> {
        let ids = self.visible_ids();
        let i = self.list_state.selected()?.min(ids.len().checked_sub(1)?);
        ids.into_iter().nth(i)
    }

    fn render(&mut self, frame: &mut Frame, now: DateTime<Utc>) {
        let [tabs_area, list_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let selected_tab = match self.screen {
            ListKind::Tasks => 0,
            ListKind::Todos => 1,
        };
        let tabs = Tabs::new(vec!["Tasks", "Todo"])
            .block(Block::default().borders(Borders::ALL).title("Task Rabbit"))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .select(selected_tab);
        frame.render_widget(tabs, tabs_area);

        let (items, sort): (Vec<ListItem>, _) = match (self.screen, self.showing_history) {
            (ListKind::Tasks, false) => (
                self.tasks.active().into_iter().map(|t| task_item(t, now)).collect(),
                self.tasks.sort(),
            ),
            (ListKind::Tasks, true) => (
                self.tasks.history().into_iter().map(|t| task_item(t, now)).collect(),
                self.tasks.sort(),
            ),
            (ListKind::Todos, false) => (
                self.todos.active().into_iter().map(todo_item).collect(),
                self.todos.sort(),
            ),
            (ListKind::Todos, true) => (
                self.todos.history().into_iter().map(todo_item).collect(),
                self.todos.sort(),
            ),
        };
        let title = if self.showing_history {
            "History".to_string()
        } else {
            format!("Active ({sort})")
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        let help = if let Some(buf) = &self.input {
            match self.screen {
                ListKind::Tasks => format!("new task (title -d 1h 15m -u 3 --due 2025-12-31): {buf}_"),
                ListKind::Todos => format!("new todo: {buf}_"),
            }
        } else if self.message.is_empty() {
            "tab: switch  a: add  h: history  space: done  r: restore  d: delete  s: sort  q: quit"
                .to_string()
        } else {
            self.message.clone()
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }
}

/// One-line task form: `title words [-d DURATION] [-u URGENCY] [--due YYYY-MM-DD]`.
/// An urgency or date that doesn't parse is left unset.
#[derive(Debug, Default, PartialEq)]
struct TaskLine {
    title: String,
    duration: u32,
    urgency: Option<u8>,
    due: Option<NaiveDate>,
}

impl TaskLine {
    fn parse(line: &str) -> Self {
        #[derive(Clone, Copy)]
        enum Field {
            Title,
            Duration,
            Urgency,
            Due,
        }

        let mut title = Vec::new();
        let mut duration = Vec::new();
        let mut form = TaskLine::default();
        let mut field = Field::Title;
        for word in line.split_whitespace() {
            match (word, field) {
                ("-d", _) => field = Field::Duration,
                ("-u", _) => field = Field::Urgency,
                ("--due", _) => field = Field::Due,
                (_, Field::Title) => title.push(word),
                (_, Field::Duration) => duration.push(word),
                (_, Field::Urgency) => {
                    form.urgency = word.parse().ok();
                    field = Field::Title;
                }
                (_, Field::Due) => {
                    form.due = NaiveDate::parse_from_str(word, "%Y-%m-%d").ok();
                    field = Field::Title;
                }
            }
        }
        form.title = title.join(" ");
        form.duration = parse_duration(&duration.join(" "));
        form
    }
}

fn ids<T: Entry>(entries: Vec<&T>) -> Vec<String> {
    entries.into_iter().map(|e| e.id().to_string()).collect()
}

fn task_item(task: &Task, now: DateTime<Utc>) -> ListItem<'static> {
    let level = rules::display_urgency(task, now);
    let rgb = rules::color_for(f64::from(level));
    let color = Color::Rgb(rgb.r, rgb.g, rgb.b);
    let mut spans: Vec<Span> = (1..=MAX_URGENCY)
        .map(|l| {
            if l <= level {
                Span::styled("●", Style::default().fg(color))
            } else {
                Span::styled("●", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    spans.push(Span::raw(format!(" {}", task.title)));
    spans.push(Span::styled(
        format!("  {}", format_duration(task.duration)),
        Style::default().fg(Color::Gray),
    ));
    if let Some(due) = task.due_date {
        spans.push(Span::styled(
            format!("  due {}", due.format("%Y-%m-%d")),
            Style::default().fg(Color::Gray),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn todo_item(todo: &TodoEntry) -> ListItem<'static> {
    ListItem::new(Line::from(todo.text.clone()))
}
