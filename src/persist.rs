/// Serialisation of the project list to and from the durable blob.
///
/// The blob is versioned. Version 1 is the legacy bare array of projects with a
/// per-project `isActive` flag; version 2 wraps the list with a single
/// `activeProjectId`. Older versions are migrated on read.
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::BlobSlot;
use crate::types::{Project, ProjectId};

pub const FORMAT_VERSION: u64 = 2;
pub const STORAGE_KEY: &str = "projects";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    #[serde(default)]
    pub active_project_id: Option<ProjectId>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    version: u64,
    active_project_id: Option<&'a str>,
    projects: &'a [Project],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProject {
    #[serde(flatten)]
    project: Project,
    #[serde(default)]
    is_active: bool,
}

/// Result of reading the slot at startup.
#[derive(Debug)]
pub enum Loaded {
    Empty,
    Snapshot(Snapshot),
    /// The blob exists but could not be understood.
    Corrupt(anyhow::Error),
}

pub fn load(slot: &dyn BlobSlot) -> Result<Loaded> {
    let Some(raw) = slot.read()? else {
        return Ok(Loaded::Empty);
    };
    Ok(match decode(&raw) {
        Ok(snapshot) => Loaded::Snapshot(snapshot),
        Err(err) => Loaded::Corrupt(err),
    })
}

pub fn save(slot: &dyn BlobSlot, active: Option<&str>, projects: &[Project]) -> Result<()> {
    slot.write(&encode(active, projects)?)
}

pub fn encode(active: Option<&str>, projects: &[Project]) -> Result<String> {
    let snapshot = SnapshotRef {
        version: FORMAT_VERSION,
        active_project_id: active,
        projects,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

pub fn decode(raw: &str) -> Result<Snapshot> {
    let value: Value = serde_json::from_str(raw).context("blob is not valid JSON")?;
    match value {
        Value::Array(_) => migrate_v1(value),
        Value::Object(ref map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| anyhow!("blob has no format version"))?;
            if version > FORMAT_VERSION {
                bail!("blob format version {version} is newer than supported version {FORMAT_VERSION}");
            }
            if version != FORMAT_VERSION {
                bail!("unknown blob format version {version}");
            }
            Ok(serde_json::from_value(value).context("malformed project list")?)
        }
        _ => bail!("blob is neither a project list nor a versioned snapshot"),
    }
}

fn migrate_v1(value: Value) -> Result<Snapshot> {
    let legacy: Vec<LegacyProject> =
        serde_json::from_value(value).context("malformed legacy project list")?;

    let flagged = legacy
        .iter()
        .find(|p| p.is_active && p.project.running_session().is_some())
        .map(|p| p.project.id.clone());
    // Without a usable flag, the newest running session decides.
    let active_project_id = flagged.or_else(|| {
        legacy
            .iter()
            .filter_map(|p| p.project.running_session().map(|s| (s.start_time, &p.project.id)))
            .max_by_key(|(start, _)| *start)
            .map(|(_, id)| id.clone())
    });

    log::info!("migrated {} projects from blob format version 1", legacy.len());
    Ok(Snapshot {
        version: FORMAT_VERSION,
        active_project_id,
        projects: legacy.into_iter().map(|p| p.project).collect(),
    })
}

/// Instants are stored as RFC 3339 UTC strings with millisecond precision.
pub mod instant {
    use chrono::{DateTime, Local, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Local>) -> String {
        value
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Local>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Local))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod optional_instant {
    use chrono::{DateTime, Local};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Local>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => s.serialize_str(&super::instant::format(value)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Local>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => super::instant::parse(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySlot;
    use crate::types::Session;
    use chrono::{DateTime, Duration, Local, TimeZone};

    fn instant(ms: i64) -> DateTime<Local> {
        Local.timestamp_millis_opt(ms).unwrap()
    }

    fn sample() -> Vec<Project> {
        let start = instant(1_714_550_400_123);
        vec![Project {
            id: "1".into(),
            name: "Writing".into(),
            color: "hsl(210, 100%, 92%)".into(),
            sessions: vec![
                Session {
                    id: "2".into(),
                    project_id: "1".into(),
                    start_time: start,
                    end_time: Some(start + Duration::milliseconds(65_000)),
                    note: "chapter one".into(),
                    duration: Some(65_000),
                },
                Session {
                    id: "3".into(),
                    project_id: "1".into(),
                    start_time: start + Duration::seconds(120),
                    end_time: None,
                    note: String::new(),
                    duration: None,
                },
            ],
            total_time: 65_000,
        }]
    }

    #[test]
    fn instants_survive_a_round_trip() {
        let projects = sample();
        let raw = encode(Some("1"), &projects).unwrap();
        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.version, FORMAT_VERSION);
        assert_eq!(snapshot.active_project_id.as_deref(), Some("1"));
        assert_eq!(snapshot.projects, projects);
        assert!(snapshot.projects[0].sessions[1].end_time.is_none());
    }

    #[test]
    fn encoded_instants_use_millisecond_utc_strings() {
        let raw = encode(None, &sample()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let start = &value["projects"][0]["sessions"][0]["startTime"];
        assert_eq!(start.as_str().unwrap(), "2024-05-01T08:00:00.123Z");
        assert!(value["projects"][0]["sessions"][1]["endTime"].is_null());
    }

    #[test]
    fn legacy_array_is_migrated() {
        let raw = r#"[
            {"id":"1","name":"A","color":"x","isActive":false,"totalTime":1000,
             "sessions":[{"id":"10","projectId":"1","startTime":"2024-05-01T08:00:00.000Z",
                          "endTime":"2024-05-01T08:00:01.000Z","note":"","duration":1000}]},
            {"id":"2","name":"B","color":"y","isActive":true,"totalTime":0,
             "sessions":[{"id":"11","projectId":"2","startTime":"2024-05-01T09:00:00.000Z",
                          "endTime":null,"note":"draft"}]}
        ]"#;
        let snapshot = decode(raw).unwrap();
        assert_eq!(snapshot.version, FORMAT_VERSION);
        assert_eq!(snapshot.active_project_id.as_deref(), Some("2"));
        assert_eq!(snapshot.projects.len(), 2);
        assert_eq!(snapshot.projects[1].sessions[0].note, "draft");
        assert!(snapshot.projects[1].sessions[0].is_running());
    }

    #[test]
    fn legacy_flag_without_running_session_is_dropped() {
        let raw = r#"[{"id":"1","name":"A","color":"x","isActive":true,"totalTime":0,"sessions":[]}]"#;
        assert_eq!(decode(raw).unwrap().active_project_id, None);
    }

    #[test]
    fn future_and_garbage_blobs_are_rejected() {
        assert!(decode(r#"{"version":3,"projects":[]}"#).is_err());
        assert!(decode(r#"{"projects":[]}"#).is_err());
        assert!(decode("{not json").is_err());
        assert!(decode("42").is_err());
        assert!(decode(r#"[{"id":"1"}]"#).is_err());
    }

    #[test]
    fn load_reports_each_outcome() {
        assert!(matches!(load(&MemorySlot::default()).unwrap(), Loaded::Empty));
        assert!(matches!(
            load(&MemorySlot::with_value("oops")).unwrap(),
            Loaded::Corrupt(_)
        ));
        let slot = MemorySlot::default();
        save(&slot, None, &sample()).unwrap();
        assert!(matches!(load(&slot).unwrap(), Loaded::Snapshot(_)));
    }
}
