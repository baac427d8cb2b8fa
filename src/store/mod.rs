/// The project/session state and every mutation on it.
///
/// The store is the only writer of project state. Each successful mutation is
/// followed by a full rewrite of the durable blob. The active project is a
/// single `Option<ProjectId>`; a project is active exactly when it owns the one
/// running session.
mod error;
mod transition;

use chrono::{DateTime, Duration, Local};

use crate::clock::Clock;
use crate::db::BlobSlot;
use crate::persist::{self, Loaded, Snapshot};
use crate::timeutil;
use crate::types::{DragPayload, NewSession, Project, ProjectId, Session, SessionId, SessionPatch};

pub use error::StoreError;
pub use transition::{Step, TimerEvent, TimerState, plan};

pub type StoreResult<T> = Result<T, StoreError>;

pub struct Store {
    projects: Vec<Project>,
    active: Option<ProjectId>,
    last_id: i64,
    slot: Box<dyn BlobSlot>,
    clock: Box<dyn Clock>,
    notice: Option<String>,
}

impl Store {
    /// Restores state from `slot`. An unreadable blob yields an empty store and
    /// a notice for the user; only I/O failure of the slot itself is an error.
    pub fn open(slot: Box<dyn BlobSlot>, clock: Box<dyn Clock>) -> anyhow::Result<Self> {
        let loaded = persist::load(slot.as_ref())?;
        let mut store = Self {
            projects: Vec::new(),
            active: None,
            last_id: 0,
            slot,
            clock,
            notice: None,
        };
        match loaded {
            Loaded::Empty => log::info!("no saved projects, starting empty"),
            Loaded::Snapshot(snapshot) => store.restore(snapshot),
            Loaded::Corrupt(err) => {
                log::error!("error parsing saved projects: {err:#}");
                store.notice = Some("Could not load saved projects".to_string());
            }
        }
        Ok(store)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active.as_deref().and_then(|id| self.project(id))
    }

    pub fn is_active(&self, project_id: &str) -> bool {
        self.active.as_deref() == Some(project_id)
    }

    /// The running session and its project, if any timer is running.
    pub fn running(&self) -> Option<(&Project, &Session)> {
        let project = self.active_project()?;
        Some((project, project.running_session()?))
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Message produced while opening the store, handed out once.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn add_project(&mut self, name: &str) -> StoreResult<ProjectId> {
        let name = validate_name(name)?;
        let now = self.clock.now();
        let id = self.next_id(&now);
        self.projects.push(Project {
            id: id.clone(),
            name,
            color: crate::color::random_pastel(),
            sessions: Vec::new(),
            total_time: 0,
        });
        log::debug!("added project {id}");
        self.commit()?;
        Ok(id)
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> StoreResult<()> {
        let name = validate_name(name)?;
        let index = self.project_index(id)?;
        self.projects[index].name = name;
        log::debug!("renamed project {id}");
        self.commit()
    }

    /// Removes the project with all its sessions.
    pub fn delete_project(&mut self, id: &str) -> StoreResult<()> {
        let index = self.project_index(id)?;
        self.projects.remove(index);
        if self.is_active(id) {
            self.active = None;
        }
        log::debug!("deleted project {id}");
        self.commit()
    }

    /// Starts a timer on `project_id`, stopping any timer running elsewhere.
    /// Returns the id of the session now running on the project.
    pub fn start_session(&mut self, project_id: &str) -> StoreResult<SessionId> {
        self.project_index(project_id)?;
        let steps = plan(self.timer_state(), TimerEvent::Start(project_id))?;
        if steps.is_empty() {
            return self.running_session_id(project_id);
        }
        let opened = self.apply(steps, String::new());
        self.commit()?;
        opened.ok_or_else(|| StoreError::NoRunningSession(project_id.to_string()))
    }

    /// Ends the project's running session. A non-empty `note` replaces the
    /// session's note; otherwise the existing note is kept.
    pub fn stop_session(&mut self, project_id: &str, note: Option<&str>) -> StoreResult<SessionId> {
        self.project_index(project_id)?;
        let session_id = self.running_session_id(project_id)?;
        plan(self.timer_state(), TimerEvent::Stop(project_id))?;
        let now = self.clock.now();
        self.close_running(project_id, note, &now);
        self.active = None;
        self.commit()?;
        Ok(session_id)
    }

    /// Opens a new session carrying the note of an earlier one.
    pub fn resume_session(&mut self, project_id: &str, session_id: &str) -> StoreResult<SessionId> {
        let index = self.project_index(project_id)?;
        let note = self.projects[index]
            .session(session_id)
            .map(|s| s.note.clone())
            .ok_or_else(|| session_not_found(project_id, session_id))?;
        let steps = plan(self.timer_state(), TimerEvent::Resume(project_id))?;
        let opened = self.apply(steps, note);
        self.commit()?;
        opened.ok_or_else(|| StoreError::NoRunningSession(project_id.to_string()))
    }

    pub fn delete_session(&mut self, project_id: &str, session_id: &str) -> StoreResult<()> {
        let (pi, si) = self.session_index(project_id, session_id)?;
        let removed = self.projects[pi].sessions.remove(si);
        if removed.is_running() {
            self.active = None;
        }
        self.recompute_total(pi);
        log::debug!("deleted session {session_id} from project {project_id}");
        self.commit()
    }

    pub fn update_session_note(&mut self, project_id: &str, session_id: &str, note: &str) -> StoreResult<()> {
        let (pi, si) = self.session_index(project_id, session_id)?;
        self.projects[pi].sessions[si].note = note.to_string();
        self.commit()
    }

    /// Applies `patch` to a session. The merged interval must satisfy
    /// end > start, and the duration is always recomputed from it.
    pub fn update_session(&mut self, project_id: &str, session_id: &str, patch: SessionPatch) -> StoreResult<()> {
        let (pi, si) = self.session_index(project_id, session_id)?;
        let now = self.clock.now();
        let session = &self.projects[pi].sessions[si];
        if session.is_running() && patch.end_time.is_some() {
            return Err(StoreError::SessionRunning(session_id.to_string()));
        }
        let start = patch.start_time.map(timeutil::truncate_millis).unwrap_or(session.start_time);
        let end = patch.end_time.map(timeutil::truncate_millis).or(session.end_time);
        // A running session is bounded by the current instant.
        validate_range(start, end.unwrap_or(now))?;

        let session = &mut self.projects[pi].sessions[si];
        session.start_time = start;
        session.end_time = end;
        if let Some(note) = patch.note {
            session.note = note;
        }
        session.duration = end.map(|end| timeutil::session_duration(&start, Some(&end)));
        self.recompute_total(pi);
        log::debug!("updated session {session_id} in project {project_id}");
        self.commit()
    }

    /// Records a finished session entered by hand.
    pub fn add_session(&mut self, project_id: &str, entry: NewSession) -> StoreResult<SessionId> {
        let index = self.project_index(project_id)?;
        let start = timeutil::truncate_millis(entry.start_time);
        let end = timeutil::truncate_millis(entry.end_time);
        validate_range(start, end)?;
        let now = self.clock.now();
        let id = self.next_id(&now);
        self.projects[index].sessions.push(Session {
            id: id.clone(),
            project_id: project_id.to_string(),
            start_time: start,
            end_time: Some(end),
            note: entry.note,
            duration: Some(timeutil::session_duration(&start, Some(&end))),
        });
        self.recompute_total(index);
        log::debug!("added manual session {id} to project {project_id}");
        self.commit()?;
        Ok(id)
    }

    /// Relocates a session to another project's list. A running session takes
    /// the active pointer with it.
    pub fn move_session(&mut self, source_id: &str, session_id: &str, target_id: &str) -> StoreResult<()> {
        let (source, si) = self.session_index(source_id, session_id)?;
        let target = self.project_index(target_id)?;
        if source == target {
            return Ok(());
        }
        let mut session = self.projects[source].sessions.remove(si);
        session.project_id = target_id.to_string();
        if session.is_running() {
            self.active = Some(target_id.to_string());
        }
        self.projects[target].sessions.push(session);
        self.recompute_total(source);
        self.recompute_total(target);
        log::debug!("moved session {session_id} from {source_id} to {target_id}");
        self.commit()
    }

    /// Combined create-or-move entry point: without a source, `entry` is
    /// created in the target; with one, the named session is relocated.
    pub fn move_session_to_project(
        &mut self,
        source_id: Option<&str>,
        session_id: &str,
        target_id: &str,
        entry: Option<NewSession>,
    ) -> StoreResult<SessionId> {
        match (source_id, entry) {
            (None, Some(entry)) => self.add_session(target_id, entry),
            (Some(source_id), _) => {
                self.move_session(source_id, session_id, target_id)?;
                Ok(session_id.to_string())
            }
            (None, None) => Err(session_not_found("", session_id)),
        }
    }

    pub fn drop_payload(&mut self, payload: &DragPayload, target_id: &str) -> StoreResult<()> {
        self.move_session(&payload.source_project_id, &payload.session_id, target_id)
    }

    pub fn clear_all_sessions(&mut self) -> StoreResult<()> {
        for project in &mut self.projects {
            project.sessions.clear();
            project.total_time = 0;
        }
        self.active = None;
        log::debug!("cleared all sessions");
        self.commit()
    }

    pub fn clear_all_projects(&mut self) -> StoreResult<()> {
        self.projects.clear();
        self.active = None;
        log::debug!("cleared all projects");
        self.commit()
    }

    fn timer_state(&self) -> TimerState<'_> {
        match self.active.as_deref() {
            Some(id) => TimerState::Running(id),
            None => TimerState::Idle,
        }
    }

    /// Steps must come from `plan`; project ids in them are known to exist.
    fn apply(&mut self, steps: Vec<Step>, note: String) -> Option<SessionId> {
        let now = self.clock.now();
        let mut opened = None;
        for step in steps {
            match step {
                Step::StopRunning(project_id) => {
                    self.close_running(&project_id, None, &now);
                    self.active = None;
                    log::debug!("stopped timer on project {project_id}");
                }
                Step::OpenSession(project_id) => {
                    let Some(index) = self.projects.iter().position(|p| p.id == project_id) else {
                        continue;
                    };
                    let id = self.next_id(&now);
                    self.projects[index].sessions.push(Session {
                        id: id.clone(),
                        project_id: project_id.clone(),
                        start_time: now,
                        end_time: None,
                        note: note.clone(),
                        duration: None,
                    });
                    self.recompute_total(index);
                    log::debug!("started session {id} on project {project_id}");
                    self.active = Some(project_id);
                    opened = Some(id);
                }
            }
        }
        opened
    }

    fn close_running(&mut self, project_id: &str, note: Option<&str>, now: &DateTime<Local>) {
        let Some(index) = self.projects.iter().position(|p| p.id == project_id) else {
            return;
        };
        if let Some(session) = self.projects[index].sessions.iter_mut().find(|s| s.is_running()) {
            // An end equal to the start would break end > start.
            let end = (*now).max(session.start_time + Duration::milliseconds(1));
            session.end_time = Some(end);
            session.duration = Some(timeutil::session_duration(&session.start_time, Some(&end)));
            if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                session.note = note.to_string();
            }
        }
        self.recompute_total(index);
    }

    fn recompute_total(&mut self, index: usize) {
        let now = self.clock.now();
        let project = &mut self.projects[index];
        project.total_time = timeutil::total_time(&project.sessions, &now);
    }

    fn project_index(&self, id: &str) -> StoreResult<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))
    }

    fn session_index(&self, project_id: &str, session_id: &str) -> StoreResult<(usize, usize)> {
        let pi = self.project_index(project_id)?;
        let si = self.projects[pi]
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| session_not_found(project_id, session_id))?;
        Ok((pi, si))
    }

    fn running_session_id(&self, project_id: &str) -> StoreResult<SessionId> {
        self.project(project_id)
            .filter(|_| self.is_active(project_id))
            .and_then(Project::running_session)
            .map(|s| s.id.clone())
            .ok_or_else(|| StoreError::NoRunningSession(project_id.to_string()))
    }

    /// Millisecond timestamp ids, strictly increasing within this store.
    fn next_id(&mut self, now: &DateTime<Local>) -> String {
        self.last_id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id.to_string()
    }

    fn commit(&self) -> StoreResult<()> {
        persist::save(self.slot.as_ref(), self.active.as_deref(), &self.projects).map_err(|err| {
            log::error!("failed to save projects: {err:#}");
            StoreError::Storage(err)
        })
    }

    /// Adopts a loaded snapshot, repairing anything that breaks the
    /// one-running-session rule.
    fn restore(&mut self, snapshot: Snapshot) {
        let now = self.clock.now();
        self.projects = snapshot.projects;

        for project in &mut self.projects {
            for session in &mut project.sessions {
                session.project_id = project.id.clone();
            }
        }

        let newest_running = |projects: &[Project], only: Option<&str>| {
            projects
                .iter()
                .filter(|p| only.is_none_or(|id| p.id == id))
                .flat_map(|p| p.sessions.iter().filter(|s| s.is_running()))
                .max_by_key(|s| s.start_time)
                .map(|s| (s.project_id.clone(), s.id.clone()))
        };
        let keeper = snapshot
            .active_project_id
            .as_deref()
            .and_then(|id| newest_running(&self.projects, Some(id)))
            .or_else(|| newest_running(&self.projects, None));

        for project in &mut self.projects {
            for session in project.sessions.iter_mut() {
                let keep = keeper
                    .as_ref()
                    .is_some_and(|(_, id)| *id == session.id && session.is_running());
                if session.is_running() && !keep {
                    log::warn!("closing surplus running session {} at load", session.id);
                    session.end_time = Some(now.max(session.start_time + Duration::milliseconds(1)));
                }
                if let Some(end) = session.end_time {
                    if end <= session.start_time {
                        log::warn!("session {} ends before it starts, widening to 1ms", session.id);
                        session.end_time = Some(session.start_time + Duration::milliseconds(1));
                    }
                }
                session.duration = session
                    .end_time
                    .map(|end| timeutil::session_duration(&session.start_time, Some(&end)));
            }
            project.total_time = timeutil::total_time(&project.sessions, &now);
        }
        self.active = keeper.map(|(project_id, _)| project_id);

        self.last_id = self
            .projects
            .iter()
            .flat_map(|p| std::iter::once(&p.id).chain(p.sessions.iter().map(|s| &s.id)))
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        log::info!(
            "restored {} projects, active project: {}",
            self.projects.len(),
            self.active.as_deref().unwrap_or("none")
        );
    }
}

fn validate_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn validate_range(start: DateTime<Local>, end: DateTime<Local>) -> StoreResult<()> {
    if end <= start {
        return Err(StoreError::InvalidRange { start, end });
    }
    Ok(())
}

fn session_not_found(project_id: &str, session_id: &str) -> StoreError {
    StoreError::SessionNotFound {
        project_id: project_id.to_string(),
        session_id: session_id.to_string(),
    }
}
