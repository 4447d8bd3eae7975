use chrono::Local;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::value_objects::RevisionId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionLogError {
    #[error("Malformed revisions.log line: {0}")]
    Malformed(String),
}

/// One line of the deployment activity log:
/// `<date> <time> <user> <revision> <release>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionLogEntry {
    pub date: String,
    pub time: String,
    pub user: String,
    pub revision: RevisionId,
    pub release: String,
}

impl RevisionLogEntry {
    /// Release id this entry records: the last component of its release
    /// field, which may be a bare id or a full release path
    pub fn release_id(&self) -> &str {
        let release = self.release.trim_end_matches('/');
        release.rsplit('/').next().unwrap_or(release)
    }

    /// Whether this entry records exactly `release` (no prefix matches)
    pub fn is_for_release(&self, release: &str) -> bool {
        self.release_id() == release
    }
}

/// Everything an activity log line carries except the release:
/// `<date> <time> <user> <revision>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStamp {
    pub date: String,
    pub time: String,
    pub user: String,
    pub revision: RevisionId,
}

impl RevisionStamp {
    /// Stamp for `revision` deployed by `user` at the current local time
    ///
    /// Whitespace in the user name would shift the log fields, so it is
    /// replaced; an empty name becomes `unknown`.
    pub fn now(user: &str, revision: RevisionId) -> Self {
        let now = Local::now();
        let user: String = user
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            user: if user.is_empty() { "unknown".to_string() } else { user },
            revision,
        }
    }

    pub fn entry(&self, release: impl Into<String>) -> RevisionLogEntry {
        RevisionLogEntry {
            date: self.date.clone(),
            time: self.time.clone(),
            user: self.user.clone(),
            revision: self.revision,
            release: release.into(),
        }
    }
}

impl fmt::Display for RevisionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.date, self.time, self.user, self.revision)
    }
}

impl FromStr for RevisionLogEntry {
    type Err = RevisionLogError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(RevisionLogError::Malformed(line.to_string()));
        }

        let revision = fields[3]
            .parse::<RevisionId>()
            .map_err(|_| RevisionLogError::Malformed(line.to_string()))?;

        Ok(Self {
            date: fields[0].to_string(),
            time: fields[1].to_string(),
            user: fields[2].to_string(),
            revision,
            release: fields[4].to_string(),
        })
    }
}

impl fmt::Display for RevisionLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.date, self.time, self.user, self.revision, self.release
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let entry: RevisionLogEntry = "2024-01-01 12:00:00 deploy 1967 /srv/app/releases/20240101"
            .parse()
            .unwrap();
        assert_eq!(entry.revision, RevisionId::new(1967));
        assert_eq!(entry.user, "deploy");
        assert_eq!(entry.release_id(), "20240101");
        assert!(entry.is_for_release("20240101"));
        assert!(!entry.is_for_release("2024010"));
        assert!(!entry.is_for_release("0240101"));
    }

    #[test]
    fn test_bare_release_ids() {
        let entry: RevisionLogEntry = "2024-01-01 12:00:00 deploy 7 20240101/".parse().unwrap();
        assert_eq!(entry.release_id(), "20240101");
        assert!(entry.is_for_release("20240101"));
    }

    #[test]
    fn test_malformed_entries() {
        assert!("2024-01-01 12:00:00 deploy".parse::<RevisionLogEntry>().is_err());
        assert!("2024-01-01 12:00:00 deploy abc rel"
            .parse::<RevisionLogEntry>()
            .is_err());
    }

    #[test]
    fn test_stamp_makes_parseable_entries() {
        let stamp = RevisionStamp::now(" deploy bot ", RevisionId::new(42));
        assert_eq!(stamp.user, "deploy_bot");
        assert_eq!(stamp.date.len(), 10);
        assert_eq!(stamp.time.len(), 8);

        let line = stamp.entry("/srv/app/releases/20240101").to_string();
        assert!(line.starts_with(&stamp.to_string()));
        let entry: RevisionLogEntry = line.parse().unwrap();
        assert_eq!(entry.revision, RevisionId::new(42));
        assert!(entry.is_for_release("20240101"));

        assert_eq!(RevisionStamp::now("", RevisionId::new(1)).user, "unknown");
    }

    #[test]
    fn test_display_matches_log_format() {
        let line = "2024-01-01 12:00:00 deploy 42 20240101";
        let entry: RevisionLogEntry = line.parse().unwrap();
        assert_eq!(entry.to_string(), line);
    }
}
