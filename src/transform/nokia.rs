//! Nokia SR OS transformers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::OutputTransformer;
use crate::platform::Platform;

/// Entry counts within this fraction of each other are in sync
const SYNC_TOLERANCE: f64 = 0.005;

static NEIGHBOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d{1,3}){3}|[0-9A-Fa-f]*:[0-9A-Fa-f:.]+)\s*$")
        .expect("Invalid neighbor regex")
});

static PEER_STATS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+(\d+)\s+\d+\s+\d+\s+\S+\s+(\S+)")
        .expect("Invalid peer stats regex")
});

/// `show router bgp summary family ipv4` as one `neighbor AS state` line
/// per peer, stored under `show router bgp summary ipv4`.
///
/// SR OS prints each peer over several lines: the address, an optional
/// description, then a line with the AS and either the session state or
/// the received/active/sent prefix counts of an established session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrosBgpSummary;

impl OutputTransformer for SrosBgpSummary {
    fn name(&self) -> &'static str {
        "sros_bgp_summary"
    }

    fn platform(&self) -> Platform {
        Platform::NokiaSros
    }

    fn source_command(&self) -> &'static str {
        "show router bgp summary family ipv4"
    }

    fn target_command(&self) -> &'static str {
        "show router bgp summary ipv4"
    }

    fn transform(&self, lines: &[String]) -> Vec<String> {
        let mut peers = Vec::new();
        let mut neighbor: Option<&str> = None;

        for line in lines {
            if let Some(caps) = NEIGHBOR_LINE.captures(line) {
                neighbor = caps.get(1).map(|m| m.as_str());
                continue;
            }
            let Some(peer) = neighbor else {
                continue;
            };
            if let Some(caps) = PEER_STATS_LINE.captures(line) {
                let state = &caps[2];
                let state = if state.contains('/') {
                    "Established"
                } else {
                    state
                };
                peers.push(format!("{}  {}  {}", peer, &caps[1], state));
                neighbor = None;
            }
        }
        peers
    }
}

#[derive(Debug, Default)]
struct SyncRecord {
    peer_ip: String,
    peer_name: String,
    db_state: String,
    entries: Option<String>,
    remote_entries: Option<String>,
}

impl SyncRecord {
    fn line(&self) -> Option<String> {
        let entries = self.entries.as_deref()?;
        let remote = self.remote_entries.as_deref()?;
        let outcome = match (entries.parse::<u64>(), remote.parse::<u64>()) {
            (Ok(local), Ok(rem)) => {
                let allowed = (local as f64 * SYNC_TOLERANCE).ceil() as u64;
                if local.abs_diff(rem) > allowed {
                    "NOT_SYNC"
                } else {
                    "IN_SYNC"
                }
            }
            _ => "NOT_SYNC",
        };
        let state = if self.db_state.is_empty() {
            "unknown"
        } else {
            &self.db_state
        };
        let name = if self.peer_name.is_empty() {
            "-".to_string()
        } else {
            self.peer_name.split_whitespace().collect::<Vec<_>>().join("_")
        };
        Some(format!(
            "{} {} {} {} {} {}",
            self.peer_ip, entries, remote, state, outcome, name
        ))
    }
}

/// `show redundancy multi-chassis sync` rewritten in place to one line per
/// peer: `peer_ip entries rem_entries db_sync_state IN_SYNC|NOT_SYNC name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrosMultiChassisSync;

impl OutputTransformer for SrosMultiChassisSync {
    fn name(&self) -> &'static str {
        "sros_mc_sync"
    }

    fn platform(&self) -> Platform {
        Platform::NokiaSros
    }

    fn source_command(&self) -> &'static str {
        "show redundancy multi-chassis sync"
    }

    fn transform(&self, lines: &[String]) -> Vec<String> {
        let mut records: Vec<SyncRecord> = Vec::new();

        for line in lines {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "Peer IP Address" => records.push(SyncRecord {
                    peer_ip: value,
                    ..Default::default()
                }),
                key => {
                    let Some(record) = records.last_mut() else {
                        continue;
                    };
                    match key {
                        "Description" => record.peer_name = value,
                        "DB Sync State" => record.db_state = value,
                        "Num Entries" => record.entries = Some(value),
                        "Rem Num Entries" => record.remote_entries = Some(value),
                        _ => {}
                    }
                }
            }
        }

        records.iter().filter_map(SyncRecord::line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const BGP_SUMMARY: &str = "\
===============================================================================
BGP Summary
===============================================================================
Neighbor
Description
                   AS PktRcvd InQ  Up/Down   State|Rcv/Act/Sent (Addr Family)
                      PktSent OutQ
-------------------------------------------------------------------------------
10.0.0.2
Peer-R2
                65001    1234    0 01d02h03m 100/90/80 (IPv4)
                          5678    0
10.0.0.3
                65002       0    0 00h05m12s Active
                             0    0
-------------------------------------------------------------------------------
";

    #[test]
    fn test_bgp_summary_one_line_per_peer() {
        let out = SrosBgpSummary.transform(&lines(BGP_SUMMARY));
        assert_eq!(
            out,
            vec!["10.0.0.2  65001  Established", "10.0.0.3  65002  Active"]
        );
    }

    #[test]
    fn test_bgp_summary_unparseable_is_empty() {
        assert!(SrosBgpSummary
            .transform(&lines("MINOR: CLI Command not allowed"))
            .is_empty());
    }

    const MC_SYNC: &str = "\
===============================================================================
Multi-chassis Peer Table
===============================================================================
Peer IP Address         : 192.168.0.1
Description             : router2
DB Sync State           : inSync
Num Entries             : 1000
Rem Num Entries         : 1005
-------------------------------------------------------------------------------
Peer IP Address         : 192.168.0.9
Description             : (Not Specified)
DB Sync State           : syncing
Num Entries             : 1000
Rem Num Entries         : 1006
===============================================================================
";

    #[test]
    fn test_mc_sync_tolerance() {
        let out = SrosMultiChassisSync.transform(&lines(MC_SYNC));
        assert_eq!(
            out,
            vec![
                "192.168.0.1 1000 1005 inSync IN_SYNC router2",
                "192.168.0.9 1000 1006 syncing NOT_SYNC (Not_Specified)",
            ]
        );
    }
}
