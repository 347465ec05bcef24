use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use colored::Colorize;
use rabbit::config::Configuration;
use rabbit::database::ListStore;
use rabbit::duration::{format_duration, parse_duration};
use rabbit::entry::{Task, TodoEntry, midnight_utc};
use rabbit::list_manager::{ListManager, TaskPatch};
use rabbit::list_ui;
use rabbit::rules::{self, SortMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Prioritized tasks and a simple checklist", long_about = None)]
struct Cmd {
    /// Use this configuration file instead of the default one.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prioritized tasks with duration, urgency and due date.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Simple checklist.
    #[command(subcommand)]
    Todo(TodoCommand),
    /// Interactive list view.
    Ui,
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        title: String,
        /// e.g. "1h 15m" or "45m"
        #[arg(short, long, value_name = "DURATION")]
        duration: Option<String>,
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        urgency: Option<u8>,
        #[arg(long, value_name = "DATE")]
        due: Option<NaiveDate>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, value_name = "DURATION")]
        duration: Option<String>,
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        urgency: Option<u8>,
        #[arg(long, value_name = "DATE", conflicts_with = "no_due")]
        due: Option<NaiveDate>,
        /// Remove the due date.
        #[arg(long)]
        no_due: bool,
    },
    List(ListArgs),
    /// Move a task to history.
    Done { id: String },
    Restore { id: String },
    /// Permanently delete a task from history.
    Delete { id: String },
}

#[derive(Subcommand)]
enum TodoCommand {
    Add { text: String },
    List(ListArgs),
    /// Check off an entry, moving it to history.
    Toggle { id: String },
    Restore { id: String },
    /// Permanently delete an entry from history.
    Delete { id: String },
}

#[derive(Args)]
struct ListArgs {
    /// Change (and remember) the sort mode.
    #[arg(short, long, value_enum)]
    sort: Option<SortMode>,
    /// Show completed entries instead.
    #[arg(long)]
    history: bool,
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    let level = rules::display_urgency(task, now);
    let rgb = rules::color_for(f64::from(level));
    let dots = format!(
        "{}{}",
        "●".repeat(usize::from(level)).truecolor(rgb.r, rgb.g, rgb.b),
        "●".repeat(usize::from(rules::MAX_URGENCY - level)).bright_black()
    );
    let due = task
        .due_date
        .map(|d| format!("  due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!(
        "{} {} {}  {}{}",
        task.id.dimmed(),
        dots,
        task.title.bold(),
        format_duration(task.duration),
        due
    );
}

fn print_todo(todo: &TodoEntry) {
    println!("{} {}", todo.id.dimmed(), todo.text);
}

async fn task(store: &ListStore, cfg: &Configuration, cmd: TaskCommand) -> Result<()> {
    let mut tasks: ListManager<Task> = store.load_list(cfg.rabbit.task_sort).await?;
    let now = Utc::now();
    match cmd {
        TaskCommand::Add {
            title,
            duration,
            urgency,
            due,
        } => {
            let minutes = duration.as_deref().map(parse_duration).unwrap_or(0);
            let urgency = urgency.unwrap_or(cfg.rabbit.default_urgency);
            match tasks.add_task(&title, minutes, urgency, due.map(midnight_utc), now)? {
                Some(task) => println!("Added task {}", task.id),
                None => return Ok(()),
            }
        }
        TaskCommand::Edit {
            id,
            title,
            duration,
            urgency,
            due,
            no_due,
        } => {
            let patch = TaskPatch {
                title,
                duration: duration.as_deref().map(parse_duration),
                urgency,
                due_date: if no_due { Some(None) } else { due.map(|d| Some(midnight_utc(d))) },
            };
            print_task(tasks.edit(&id, patch)?, now);
        }
        TaskCommand::List(args) => {
            if let Some(mode) = args.sort {
                tasks.set_sort(mode)?;
            }
            let list = if args.history { tasks.history() } else { tasks.active() };
            list.into_iter().for_each(|t| print_task(t, now));
            // Listing only writes when the sort mode changed.
            if args.sort.is_none() {
                return Ok(());
            }
        }
        TaskCommand::Done { id } => println!("Completed {}", tasks.complete(&id)?.title),
        TaskCommand::Restore { id } => println!("Restored {}", tasks.restore(&id)?.title),
        TaskCommand::Delete { id } => println!("Deleted {}", tasks.delete(&id)?.title),
    }
    store.save_list(&tasks).await?;
    Ok(())
}

async fn todo(store: &ListStore, cfg: &Configuration, cmd: TodoCommand) -> Result<()> {
    let mut todos: ListManager<TodoEntry> = store.load_list(cfg.rabbit.todo_sort).await?;
    match cmd {
        TodoCommand::Add { text } => match todos.add_todo(&text, Utc::now()) {
            Some(todo) => println!("Added todo {}", todo.id),
            None => return Ok(()),
        },
        TodoCommand::List(args) => {
            if let Some(mode) = args.sort {
                todos.set_sort(mode)?;
            }
            let list = if args.history { todos.history() } else { todos.active() };
            list.into_iter().for_each(print_todo);
            if args.sort.is_none() {
                return Ok(());
            }
        }
        TodoCommand::Toggle { id } => println!("Checked {}", todos.toggle(&id)?.text),
        TodoCommand::Restore { id } => println!("Restored {}", todos.restore(&id)?.text),
        TodoCommand::Delete { id } => println!("Deleted {}", todos.delete(&id)?.text),
    }
    store.save_list(&todos).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cmds = Cmd::parse();

    let cfg = match &cmds.config {
        Some(path) => Configuration::from_path(path)?,
        None => Configuration::new()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.rabbit.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = ListStore::open(&cfg.database_path()?).await?;

    match cmds.commands {
        Commands::Task(cmd) => task(&store, &cfg, cmd).await,
        Commands::Todo(cmd) => todo(&store, &cfg, cmd).await,
        Commands::Ui => {
            let tasks = store.load_list(cfg.rabbit.task_sort).await?;
            let todos = store.load_list(cfg.rabbit.todo_sort).await?;
            list_ui::run(&store, tasks, todos, cfg.rabbit.default_urgency).await
        }
    }
}
