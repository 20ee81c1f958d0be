//! Supported network device platforms and their per-platform constants.
//!
//! Everything that differs between device families lives here: the CLI
//! prompt used to split capture transcripts, the command that dumps the
//! configuration, where the ping result sits, and how noisy the
//! configuration diff is.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported network device platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Juniper Junos
    JuniperJunos,
    /// Cisco IOS/IOS-XE
    CiscoIos,
    /// Cisco IOS-XR
    CiscoXr,
    /// Nokia SR OS, classic CLI
    NokiaSros,
    /// Nokia SR OS, model-driven CLI
    NokiaMdcli,
}

/// How a ping command reports its result line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingFormat {
    /// Substring identifying the summary line
    pub marker: &'static str,
    /// Whitespace-delimited field holding the metric
    pub field: usize,
    /// Whether the metric is packet loss (converted to success rate)
    pub reports_loss: bool,
}

impl Platform {
    /// All supported platforms, in a stable order
    pub const ALL: [Platform; 5] = [
        Platform::JuniperJunos,
        Platform::CiscoIos,
        Platform::CiscoXr,
        Platform::NokiaSros,
        Platform::NokiaMdcli,
    ];

    /// Name used for rule directories and manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::JuniperJunos => "juniper_junos",
            Platform::CiscoIos => "cisco_ios",
            Platform::CiscoXr => "cisco_xr",
            Platform::NokiaSros => "nokia_sros",
            Platform::NokiaMdcli => "nokia_mdcli",
        }
    }

    /// Command whose output is the full device configuration
    pub fn config_command(&self) -> &'static str {
        match self {
            Platform::JuniperJunos => "show configuration | display set",
            Platform::CiscoIos => "show run",
            Platform::CiscoXr => "show configuration running-config formal",
            Platform::NokiaSros => "admin display-config",
            Platform::NokiaMdcli => "admin show configuration",
        }
    }

    /// Location of the ping summary metric
    pub fn ping_format(&self) -> PingFormat {
        match self {
            Platform::JuniperJunos | Platform::NokiaSros | Platform::NokiaMdcli => PingFormat {
                marker: "packets",
                field: 6,
                reports_loss: true,
            },
            Platform::CiscoIos | Platform::CiscoXr => PingFormat {
                marker: "Success",
                field: 3,
                reports_loss: false,
            },
        }
    }

    /// Whether `configure`/`exit` scaffolding shows up in config diffs
    pub fn has_block_scaffolding(&self) -> bool {
        matches!(self, Platform::NokiaSros)
    }

    /// Prompt pattern that introduces a new command in a capture transcript.
    ///
    /// The match is stripped from the line; what remains is the command.
    pub fn prompt_regex(&self, hostname: &str) -> Result<Regex> {
        let host = regex::escape(hostname);
        let pattern = match self {
            Platform::JuniperJunos => format!(r"(?i)^[\w.-]+@{host}(-re[01])?> ?"),
            Platform::CiscoIos => format!(r"(?i)^{host}#"),
            Platform::CiscoXr => format!(r"(?i)^RP/0/.*/CPU[01]:{host}#"),
            Platform::NokiaSros | Platform::NokiaMdcli => {
                format!(r"(?i)^\*?[AB]:(.*@)?{host}# ?")
            }
        };
        Regex::new(&pattern).map_err(|e| Error::Config(format!("bad prompt pattern: {e}")))
    }

    /// Nokia devices share a driver; the prompt tells classic and MD-CLI apart.
    ///
    /// MD-CLI prompts carry `user@host`, classic prompts only the host. Only
    /// the first ten lines of the transcript are inspected.
    pub fn refine_nokia(self, hostname: &str, transcript: &str) -> Platform {
        if self != Platform::NokiaSros {
            return self;
        }
        let pattern = format!(r"^\*?[AB]:.*@{}", regex::escape(hostname));
        let Ok(re) = Regex::new(&pattern) else {
            return self;
        };
        if transcript.lines().take(10).any(|line| re.is_match(line)) {
            Platform::NokiaMdcli
        } else {
            Platform::NokiaSros
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "juniper_junos" | "junos" | "juniper" => Ok(Platform::JuniperJunos),
            "cisco_ios" | "ios" | "ios_xe" | "iosxe" => Ok(Platform::CiscoIos),
            "cisco_xr" | "cisco_iosxr" | "iosxr" | "ios_xr" | "xr" => Ok(Platform::CiscoXr),
            "nokia_sros" | "sros" | "timos" => Ok(Platform::NokiaSros),
            "nokia_mdcli" | "mdcli" => Ok(Platform::NokiaMdcli),
            _ => Err(format!(
                "Unknown platform: {}. Valid options: juniper_junos, cisco_ios, cisco_xr, nokia_sros, nokia_mdcli",
                s
            )),
        }
    }
}
