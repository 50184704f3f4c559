//! Scan result types

use super::Address;
use serde::{Deserialize, Serialize};

/// Counters describing one address-space walk. Recovered per-region failures
/// only surface here and in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub regions_visited: usize,
    pub regions_scanned: usize,
    pub regions_skipped: usize,
    pub regions_truncated: usize,
    pub query_failures: usize,
    pub read_failures: usize,
    pub bytes_scanned: u64,
    pub hit_region_limit: bool,
    pub walk_abandoned: bool,
}

/// Result of scanning an address space for a 32-bit value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Match addresses in ascending order
    pub matches: Vec<Address>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// True when any region was skipped because of a recovered failure
    pub fn had_failures(&self) -> bool {
        self.stats.query_failures > 0 || self.stats.read_failures > 0
    }
}

/// A scan match re-read after the walk to show what it currently holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedMatch {
    pub address: Address,
    pub hex_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifiedMatch {
    /// Builds a verified match from whatever bytes the re-read returned
    pub fn from_read(address: Address, bytes: &[u8]) -> Self {
        match bytes.get(..4).and_then(|b| <[u8; 4]>::try_from(b).ok()) {
            Some(word) => {
                let unsigned = u32::from_ne_bytes(word);
                VerifiedMatch {
                    address,
                    hex_address: address.to_string(),
                    value: Some(unsigned as i32),
                    unsigned_value: Some(unsigned),
                    hex_value: Some(format!("0x{:X}", unsigned)),
                    error: None,
                }
            }
            None => Self::unreadable(address, "Could not read 4 bytes"),
        }
    }

    /// A match whose current contents could not be read back
    pub fn unreadable(address: Address, reason: impl Into<String>) -> Self {
        VerifiedMatch {
            address,
            hex_address: address.to_string(),
            value: None,
            unsigned_value: None,
            hex_value: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_verified_match_from_full_read() {
        let bytes = 0xFFFF_FFFEu32.to_ne_bytes();
        let verified = VerifiedMatch::from_read(Address::new(0x1A2B), &bytes);
        assert!(verified.is_confirmed());
        assert_eq!(verified.hex_address, "0x1A2B");
        assert_eq!(verified.value, Some(-2));
        assert_eq!(verified.unsigned_value, Some(0xFFFF_FFFE));
        assert_eq!(verified.hex_value.as_deref(), Some("0xFFFFFFFE"));
    }

    #[test]
    fn test_verified_match_from_short_read() {
        let verified = VerifiedMatch::from_read(Address::new(0x10), &[1, 2]);
        assert!(!verified.is_confirmed());
        assert_eq!(verified.error.as_deref(), Some("Could not read 4 bytes"));
        assert_eq!(verified.value, None);
    }

    #[test]
    fn test_scan_report_serialization() {
        let report = ScanReport {
            matches: vec![Address::new(0x1000), Address::new(0x2004)],
            stats: ScanStats {
                regions_visited: 3,
                read_failures: 1,
                ..Default::default()
            },
        };
        assert_eq!(report.len(), 2);
        assert!(report.had_failures());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["matches"][1], 0x2004);
        assert_eq!(json["stats"]["regionsVisited"], 3);
        assert_eq!(json["stats"]["hitRegionLimit"], false);
        assert_eq!(json["stats"]["walkAbandoned"], false);
    }
}
