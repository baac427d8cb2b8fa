/// CLI argument parsing and command handling.
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use punchcard::timeutil::{format_date, format_duration, format_time, parse_instant, running_elapsed};
use punchcard::{DragPayload, NewSession, Project, SessionPatch, Store, StoreError};

#[derive(Parser)]
#[command(
    name = "punchcard",
    version,
    about = "Punchcard - A terminal-based project time tracker"
)]
pub struct Cli {
    /// SQLite file holding the saved projects (`:memory:` for a throwaway run)
    #[arg(long, env = "PUNCHCARD_DB", global = true)]
    pub db: Option<PathBuf>,
    #[arg(long, env = "PUNCHCARD_LOG", default_value = "info", global = true)]
    pub log_level: String,
    #[arg(long, env = "PUNCHCARD_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Start a timer, stopping whichever one is running
    Start { project: String },
    /// Stop the running timer (of the given project, or whichever runs)
    Stop {
        project: Option<String>,
        #[arg(short = 'n', long = "note")]
        note: Option<String>,
    },
    /// Start a new session carrying an earlier session's note
    Resume { project: String, session: String },
    /// Show the running timer
    Status,
    Clear {
        #[command(subcommand)]
        command: ClearCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    Add { name: String },
    Rename { project: String, name: String },
    Delete { project: String },
    List,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    List {
        project: String,
    },
    /// Record a finished session by hand
    Add {
        project: String,
        #[arg(short = 's', long = "start")]
        start: String,
        #[arg(short = 'e', long = "end")]
        end: String,
        #[arg(short = 'n', long = "note", default_value = "")]
        note: String,
    },
    Edit {
        project: String,
        session: String,
        #[arg(short = 's', long = "start")]
        start: Option<String>,
        #[arg(short = 'e', long = "end")]
        end: Option<String>,
        #[arg(short = 'n', long = "note")]
        note: Option<String>,
    },
    Note {
        project: String,
        session: String,
        note: String,
    },
    Delete {
        project: String,
        session: String,
    },
    Move {
        project: String,
        session: String,
        target: String,
    },
    /// Drop a `{"sessionId":..,"sourceProjectId":..}` payload onto a project
    Drop {
        target: String,
        payload: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClearCommand {
    Sessions,
    Projects,
}

/// Execute a CLI command against the store.
pub fn run(command: Command, store: &mut Store) -> Result<()> {
    let outcome = match command {
        Command::Project { command } => run_project(command, store),
        Command::Session { command } => run_session(command, store),
        Command::Start { project } => handle_start(&project, store),
        Command::Stop { project, note } => handle_stop(project.as_deref(), note.as_deref(), store),
        Command::Resume { project, session } => {
            let Some(project_id) = resolve_project(&project, store) else {
                return Ok(());
            };
            store.resume_session(&project_id, &session).map(|id| {
                println!("Resumed as session {id}");
            })
        }
        Command::Status => {
            print_status(store);
            Ok(())
        }
        Command::Clear {
            command: ClearCommand::Sessions,
        } => store.clear_all_sessions().map(|_| println!("All sessions cleared")),
        Command::Clear {
            command: ClearCommand::Projects,
        } => store.clear_all_projects().map(|_| println!("All projects cleared")),
    };
    if let Err(err) = outcome {
        report(&err);
    }
    Ok(())
}

fn run_project(command: ProjectCommand, store: &mut Store) -> Result<(), StoreError> {
    match command {
        ProjectCommand::Add { name } => {
            let id = store.add_project(&name)?;
            println!("Added project: {} ({id})", name.trim());
        }
        ProjectCommand::Rename { project, name } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            store.rename_project(&id, &name)?;
            println!("Renamed project to '{}'", name.trim());
        }
        ProjectCommand::Delete { project } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            store.delete_project(&id)?;
            println!("Project deleted");
        }
        ProjectCommand::List => {
            if store.projects().is_empty() {
                println!("No projects yet.");
            }
            for project in store.projects() {
                let marker = if store.is_active(&project.id) { "*" } else { " " };
                println!(
                    "{marker} {:<16} {:<24} {:>10}  {} sessions",
                    project.id,
                    project.name,
                    format_duration(project.total_time),
                    project.sessions.len()
                );
            }
        }
    }
    Ok(())
}

fn run_session(command: SessionCommand, store: &mut Store) -> Result<(), StoreError> {
    match command {
        SessionCommand::List { project } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            if let Some(project) = store.project(&id) {
                print_sessions(project, store);
            }
        }
        SessionCommand::Add {
            project,
            start,
            end,
            note,
        } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            let (Some(start_time), Some(end_time)) = (read_instant(&start), read_instant(&end)) else {
                return Ok(());
            };
            let session_id = store.add_session(
                &id,
                NewSession {
                    start_time,
                    end_time,
                    note,
                },
            )?;
            println!("Added session {session_id}");
        }
        SessionCommand::Edit {
            project,
            session,
            start,
            end,
            note,
        } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            let start_time = match start {
                Some(raw) => match read_instant(&raw) {
                    Some(instant) => Some(instant),
                    None => return Ok(()),
                },
                None => None,
            };
            let end_time = match end {
                Some(raw) => match read_instant(&raw) {
                    Some(instant) => Some(instant),
                    None => return Ok(()),
                },
                None => None,
            };
            store.update_session(
                &id,
                &session,
                SessionPatch {
                    start_time,
                    end_time,
                    note,
                },
            )?;
            println!("Session updated");
        }
        SessionCommand::Note {
            project,
            session,
            note,
        } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            store.update_session_note(&id, &session, &note)?;
            println!("Note saved");
        }
        SessionCommand::Delete { project, session } => {
            let Some(id) = resolve_project(&project, store) else {
                return Ok(());
            };
            store.delete_session(&id, &session)?;
            println!("Session deleted");
        }
        SessionCommand::Move {
            project,
            session,
            target,
        } => {
            let (Some(source_id), Some(target_id)) =
                (resolve_project(&project, store), resolve_project(&target, store))
            else {
                return Ok(());
            };
            store.move_session(&source_id, &session, &target_id)?;
            println!("Session moved");
        }
        SessionCommand::Drop { target, payload } => {
            let Some(target_id) = resolve_project(&target, store) else {
                return Ok(());
            };
            // Malformed payloads are ignored without a user-facing error.
            if let Some(payload) = DragPayload::parse(&payload) {
                store.drop_payload(&payload, &target_id)?;
                println!("Session moved");
            }
        }
    }
    Ok(())
}

fn handle_start(project: &str, store: &mut Store) -> Result<(), StoreError> {
    let Some(id) = resolve_project(project, store) else {
        return Ok(());
    };
    if let Some((running, _)) = store.running() {
        if running.id != id {
            println!("Stopping currently running project '{}'", running.name);
        }
    }
    let session_id = store.start_session(&id)?;
    println!("Timer running (session {session_id})");
    Ok(())
}

fn handle_stop(project: Option<&str>, note: Option<&str>, store: &mut Store) -> Result<(), StoreError> {
    let id = match project {
        Some(project) => match resolve_project(project, store) {
            Some(id) => id,
            None => return Ok(()),
        },
        None => match store.active_project_id() {
            Some(id) => id.to_string(),
            None => {
                println!("No timer running.");
                return Ok(());
            }
        },
    };
    let session_id = store.stop_session(&id, note)?;
    if let Some(session) = store.project(&id).and_then(|p| p.session(&session_id)) {
        println!("Stopped after {}", format_duration(session.duration.unwrap_or(0)));
    }
    Ok(())
}

fn print_status(store: &Store) {
    let now = store.now();
    match store.running() {
        Some((project, session)) => println!(
            "{} running for {} since {}",
            project.name,
            format_duration(running_elapsed(session, &now)),
            format_time(&session.start_time)
        ),
        None => println!("No timer running."),
    }
}

fn print_sessions(project: &Project, store: &Store) {
    let now = store.now();
    let mut sessions: Vec<_> = project.sessions.iter().collect();
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    if sessions.is_empty() {
        println!("No sessions for '{}'.", project.name);
    }
    for session in sessions {
        let end = match &session.end_time {
            Some(end) => format_time(end),
            None => "In progress".to_string(),
        };
        println!(
            "{:<16} {} {} - {:<11} {:>10}  {}",
            session.id,
            format_date(&session.start_time),
            format_time(&session.start_time),
            end,
            format_duration(running_elapsed(session, &now)),
            session.note
        );
    }
    println!("Total: {}", format_duration(project.total_time));
}

/// Finds a project by id or by exact name.
fn resolve_project(key: &str, store: &Store) -> Option<String> {
    if let Some(project) = store.project(key) {
        return Some(project.id.clone());
    }
    let matches: Vec<_> = store.projects().iter().filter(|p| p.name == key).collect();
    match matches.as_slice() {
        [] => {
            println!("Project '{key}' not found");
            None
        }
        [project] => Some(project.id.clone()),
        _ => {
            println!("Multiple projects found with the same name, use the project id instead");
            None
        }
    }
}

fn read_instant(raw: &str) -> Option<chrono::DateTime<chrono::Local>> {
    let parsed = parse_instant(raw);
    if parsed.is_none() {
        println!("Could not read '{raw}' as a time, use YYYY-MM-DD HH:MM[:SS] or RFC 3339.");
    }
    parsed
}

fn report(err: &StoreError) {
    log::warn!("command rejected: {err}");
    println!("{err}");
}
