//! Process information types

use super::ProcessId;
use serde::{Deserialize, Serialize};

/// A live process as reported by the OS enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessInfo {
            pid,
            name: name.into(),
        }
    }

    /// Case-insensitive match against the executable name
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_info_serializes_as_pid_and_name() {
        let info = ProcessInfo::new(42, "Project64.exe");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"pid":42,"name":"Project64.exe"}"#);
    }

    #[test]
    fn test_name_matches() {
        let info = ProcessInfo::new(1, "Project64.exe");
        assert!(info.name_matches("project64.EXE"));
        assert!(!info.name_matches("project64"));
    }
}
