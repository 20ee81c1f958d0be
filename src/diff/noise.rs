//! Changed lines that carry no configuration meaning.

use crate::platform::Platform;

/// Which changed lines a platform's config diff ignores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseProfile {
    /// Drop `configure`/`exit` block scaffolding and lines without letters
    pub block_scaffolding: bool,
}

impl NoiseProfile {
    /// Profile for a platform
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            block_scaffolding: platform.has_block_scaffolding(),
        }
    }

    /// Whether the content of a changed line (sign stripped) is noise
    pub fn is_noise(&self, content: &str) -> bool {
        let trimmed = content.trim();
        if content.starts_with('!') || content.starts_with('#') {
            return true;
        }
        if !self.block_scaffolding {
            return false;
        }
        trimmed.starts_with('#')
            || trimmed == "configure"
            || trimmed == "exit"
            || trimmed.starts_with("exit ")
            || !trimmed.chars().any(|c| c.is_ascii_alphabetic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_are_noise_everywhere() {
        let ios = NoiseProfile::for_platform(Platform::CiscoIos);
        assert!(ios.is_noise("!"));
        assert!(ios.is_noise("! Last configuration change"));
        assert!(!ios.is_noise(""));
        assert!(!ios.is_noise("   "));
        assert!(!ios.is_noise(" description uplink"));
        assert!(!ios.is_noise("exit"));
    }

    #[test]
    fn test_sros_scaffolding() {
        let sros = NoiseProfile::for_platform(Platform::NokiaSros);
        assert!(sros.is_noise("    configure"));
        assert!(sros.is_noise("        exit"));
        assert!(sros.is_noise("    exit all"));
        assert!(sros.is_noise("    # Generated Tue Jan 1"));
        assert!(sros.is_noise("    12345"));
        assert!(sros.is_noise("    "));
        assert!(!sros.is_noise("        shutdown"));
        assert!(!sros.is_noise("        exited-state up"));
    }
}
