use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = i64;

/// Concurrency token stamped on every mutable aggregate.
pub type RowVersion = i64;

/// Version assigned to a record when it is first written.
pub const INITIAL_ROW_VERSION: RowVersion = 1;

pub fn generate_key() -> Uuid {
    Uuid::new_v4()
}

/// A record owned by an aggregate. Id 0 means "not yet stored".
pub trait ChildRecord {
    fn child_id(&self) -> Id;
    fn id_mut(&mut self) -> &mut Id;
}

/// Give every unsaved child a fresh id. Returns how many were assigned.
pub fn assign_child_ids<T, F>(children: &mut [T], next_id: &mut F) -> usize
where
    T: ChildRecord,
    F: FnMut() -> Id,
{
    let mut assigned = 0;
    for child in children.iter_mut() {
        let id = child.id_mut();
        if *id <= 0 {
            *id = next_id();
            assigned += 1;
        }
    }
    assigned
}

/// The kind of file an activity or document hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Research,
    Lease,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Research => "research",
            FileKind::Lease => "lease",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "research" | "researchfile" | "research_file" => Some(FileKind::Research),
            "lease" | "leases" => Some(FileKind::Lease),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a parcel identifier: strip formatting and left pad to nine digits.
pub fn normalize_pid(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 9 {
        return None;
    }
    Some(format!("{:0>9}", digits))
}

/// Largest parcel identifier; PIDs are at most nine digits.
pub const MAX_PID: i32 = 999_999_999;

/// Format a PID as `000-000-000`. Values outside the PID range are printed as-is.
pub fn format_pid(pid: i32) -> String {
    if !(0..=MAX_PID).contains(&pid) {
        return pid.to_string();
    }
    let padded = format!("{:09}", pid);
    format!("{}-{}-{}", &padded[0..3], &padded[3..6], &padded[6..9])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pid_strips_dashes_and_pads() {
        assert_eq!(normalize_pid("001-505-360"), Some("001505360".to_string()));
        assert_eq!(normalize_pid("1505360"), Some("001505360".to_string()));
        assert_eq!(normalize_pid(""), None);
        assert_eq!(normalize_pid("1234567890"), None);
    }

    #[test]
    fn format_pid_inserts_dashes() {
        assert_eq!(format_pid(28753054), "028-753-054");
        assert_eq!(format_pid(1_234_567_890), "1234567890");
    }

    #[test]
    fn file_kind_parses_route_segments() {
        assert_eq!(FileKind::parse("Research"), Some(FileKind::Research));
        assert_eq!(FileKind::parse("leases"), Some(FileKind::Lease));
        assert_eq!(FileKind::parse("acquisition"), None);
    }
}
