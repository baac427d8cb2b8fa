/// Pure time arithmetic and display formatting. All durations are milliseconds.
use chrono::{DateTime, Duration, DurationRound, Local, NaiveDateTime};

use crate::types::Session;

const INPUT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Drops anything below a millisecond, the precision the blob stores.
pub fn truncate_millis(instant: DateTime<Local>) -> DateTime<Local> {
    instant
        .duration_trunc(Duration::milliseconds(1))
        .unwrap_or(instant)
}

/// Reads user-entered instants: RFC 3339, or local `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_instant(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_millis(dt.with_timezone(&Local)));
    }
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(truncate_millis)
}

/// Inverse of `parse_instant` for the local form.
pub fn format_input(instant: &DateTime<Local>) -> String {
    instant.format(INPUT_FORMATS[0]).to_string()
}

/// `H:MM:SS`, hours unbounded. Anything non-positive is `0:00:00`.
pub fn format_duration(millis: i64) -> String {
    if millis <= 0 {
        return "0:00:00".to_string();
    }
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// `09:05:03 AM` style clock time.
pub fn format_time(instant: &DateTime<Local>) -> String {
    instant.format("%I:%M:%S %p").to_string()
}

/// `May 1` style short date.
pub fn format_date(instant: &DateTime<Local>) -> String {
    instant.format("%b %-d").to_string()
}

pub fn session_duration(start: &DateTime<Local>, end: Option<&DateTime<Local>>) -> i64 {
    match end {
        Some(end) => end.signed_duration_since(*start).num_milliseconds(),
        None => 0,
    }
}

/// Elapsed time as shown on screen: stored duration, closed interval, or time so far.
pub fn running_elapsed(session: &Session, now: &DateTime<Local>) -> i64 {
    if let Some(duration) = session.duration {
        return duration;
    }
    match &session.end_time {
        Some(end) => end.signed_duration_since(session.start_time).num_milliseconds(),
        None => now.signed_duration_since(session.start_time).num_milliseconds(),
    }
}

pub fn total_time(sessions: &[Session], now: &DateTime<Local>) -> i64 {
    sessions
        .iter()
        .map(|session| running_elapsed(session, now))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn session(start: DateTime<Local>, end: Option<DateTime<Local>>, duration: Option<i64>) -> Session {
        Session {
            id: "1".into(),
            project_id: "p".into(),
            start_time: start,
            end_time: end,
            note: String::new(),
            duration,
        }
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(3_661_000), "1:01:01");
        assert_eq!(format_duration(-5), "0:00:00");
        assert_eq!(format_duration(999), "0:00:00");
        assert_eq!(format_duration(65_000), "0:01:05");
        assert_eq!(format_duration(360_000_000), "100:00:00");
    }

    #[test]
    fn formats_clock_and_date() {
        assert_eq!(format_time(&at(9, 5, 3)), "09:05:03 AM");
        assert_eq!(format_time(&at(17, 0, 0)), "05:00:00 PM");
        assert_eq!(format_date(&at(9, 0, 0)), "May 1");
    }

    #[test]
    fn open_session_has_no_duration() {
        assert_eq!(session_duration(&at(9, 0, 0), None), 0);
        assert_eq!(session_duration(&at(9, 0, 0), Some(&at(9, 1, 5))), 65_000);
    }

    #[test]
    fn total_prefers_stored_then_interval_then_now() {
        let now = at(12, 0, 0);
        let sessions = vec![
            session(at(8, 0, 0), Some(at(9, 0, 0)), Some(1_000)),
            session(at(9, 0, 0), Some(at(9, 0, 30)), None),
            session(at(11, 59, 0), None, None),
        ];
        assert_eq!(total_time(&sessions, &now), 1_000 + 30_000 + 60_000);
    }

    #[test]
    fn parses_user_instants() {
        assert_eq!(parse_instant("2024-05-01 09:05:03"), Some(at(9, 5, 3)));
        assert_eq!(parse_instant(" 2024-05-01 09:05 "), Some(at(9, 5, 0)));
        assert_eq!(parse_instant(&format_input(&at(17, 0, 0))), Some(at(17, 0, 0)));
        let utc = parse_instant("2024-05-01T08:00:00.000Z").unwrap();
        assert_eq!(utc.timestamp(), 1_714_550_400);
        assert_eq!(parse_instant("yesterday"), None);
        let fine = parse_instant("2024-05-01T08:00:00.000900Z").unwrap();
        assert_eq!(fine.timestamp_subsec_nanos(), 0);
        assert_eq!(parse_instant(""), None);
    }

    #[test]
    fn running_elapsed_tracks_the_clock() {
        let start = at(10, 0, 0);
        let running = session(start, None, None);
        assert_eq!(running_elapsed(&running, &(start + Duration::seconds(3))), 3_000);
    }
}
