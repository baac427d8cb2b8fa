/// The single-running-timer rule as one transition table.
use super::StoreError;
use crate::types::ProjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState<'a> {
    Idle,
    Running(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent<'a> {
    Start(&'a str),
    Resume(&'a str),
    Stop(&'a str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    StopRunning(ProjectId),
    OpenSession(ProjectId),
}

/// Steps to apply, in order, for `event` in `state`.
pub fn plan(state: TimerState<'_>, event: TimerEvent<'_>) -> Result<Vec<Step>, StoreError> {
    use Step::*;
    use TimerEvent::*;
    use TimerState::*;

    let steps = match (state, event) {
        (Idle, Start(p) | Resume(p)) => vec![OpenSession(p.to_string())],
        (Running(q), Start(p)) if q == p => Vec::new(),
        (Running(q), Start(p) | Resume(p)) => {
            vec![StopRunning(q.to_string()), OpenSession(p.to_string())]
        }
        (Running(q), Stop(p)) if q == p => vec![StopRunning(p.to_string())],
        (_, Stop(p)) => return Err(StoreError::NoRunningSession(p.to_string())),
    };
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_from_idle_opens() {
        assert_eq!(
            plan(TimerState::Idle, TimerEvent::Start("a")).unwrap(),
            vec![Step::OpenSession("a".into())]
        );
    }

    #[test]
    fn start_elsewhere_stops_first() {
        assert_eq!(
            plan(TimerState::Running("a"), TimerEvent::Start("b")).unwrap(),
            vec![Step::StopRunning("a".into()), Step::OpenSession("b".into())]
        );
    }

    #[test]
    fn start_on_running_project_does_nothing() {
        assert!(plan(TimerState::Running("a"), TimerEvent::Start("a"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn resume_on_running_project_replaces_the_session() {
        assert_eq!(
            plan(TimerState::Running("a"), TimerEvent::Resume("a")).unwrap(),
            vec![Step::StopRunning("a".into()), Step::OpenSession("a".into())]
        );
    }

    #[test]
    fn stop_only_applies_to_the_running_project() {
        assert_eq!(
            plan(TimerState::Running("a"), TimerEvent::Stop("a")).unwrap(),
            vec![Step::StopRunning("a".into())]
        );
        assert!(matches!(
            plan(TimerState::Running("a"), TimerEvent::Stop("b")),
            Err(StoreError::NoRunningSession(id)) if id == "b"
        ));
        assert!(matches!(
            plan(TimerState::Idle, TimerEvent::Stop("a")),
            Err(StoreError::NoRunningSession(_))
        ));
    }
}
