use regex::Regex;
use std::collections::BTreeSet;

/// Hostnames of one application split by origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VhostPartition {
    /// Platform-generated hostname (`app-<id>.<domain>`)
    pub default: Option<String>,
    pub additional: BTreeSet<String>,
}

/// Matcher for platform-generated hostnames.
#[derive(Debug, Clone)]
pub struct VhostPattern {
    regex: Regex,
}

impl VhostPattern {
    pub fn for_domain(platform_domain: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(r"^app-.*\.{}$", regex::escape(platform_domain)))?;
        Ok(Self { regex })
    }

    pub fn is_default(&self, hostname: &str) -> bool {
        self.regex.is_match(hostname)
    }

    /// Split hostnames into the default one and the rest.
    ///
    /// When several hostnames match the default pattern, the first one wins
    /// and the others are reported as additional.
    pub fn partition<'a>(&self, hostnames: impl IntoIterator<Item = &'a str>) -> VhostPartition {
        let mut partition = VhostPartition::default();
        for hostname in hostnames {
            if partition.default.is_none() && self.is_default(hostname) {
                partition.default = Some(hostname.to_string());
            } else {
                partition.additional.insert(hostname.to_string());
            }
        }
        partition
    }

    /// Desired additional hostnames that need registering; pattern-matching
    /// entries are dropped since the platform owns them.
    pub fn registrable<'a>(&self, desired: &'a BTreeSet<String>) -> Vec<&'a str> {
        desired
            .iter()
            .map(String::as_str)
            .filter(|hostname| !self.is_default(hostname))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> VhostPattern {
        VhostPattern::for_domain("cleverapps.io").unwrap()
    }

    #[test]
    fn test_partition_default_and_additional() {
        let partition = pattern().partition(["app-abc123.cleverapps.io", "www.example.com"]);

        assert_eq!(partition.default.as_deref(), Some("app-abc123.cleverapps.io"));
        assert_eq!(
            partition.additional,
            BTreeSet::from(["www.example.com".to_string()])
        );
    }

    #[test]
    fn test_partition_without_default() {
        let partition = pattern().partition(["www.example.com", "api.example.com"]);

        assert!(partition.default.is_none());
        assert_eq!(partition.additional.len(), 2);
    }

    #[test]
    fn test_extra_default_matches_become_additional() {
        let partition = pattern().partition([
            "www.example.com",
            "app-first.cleverapps.io",
            "app-second.cleverapps.io",
        ]);

        assert_eq!(partition.default.as_deref(), Some("app-first.cleverapps.io"));
        assert!(partition.additional.contains("app-second.cleverapps.io"));
        assert!(partition.additional.contains("www.example.com"));
    }

    #[test]
    fn test_pattern_is_anchored_and_escaped() {
        let pattern = pattern();

        assert!(pattern.is_default("app-x.cleverapps.io"));
        assert!(!pattern.is_default("myapp-x.cleverapps.io"));
        assert!(!pattern.is_default("app-x.cleverapps.io.evil.com"));
        assert!(!pattern.is_default("app-x.cleverappsXio"));
        assert!(!pattern.is_default("shop.cleverapps.io"));
    }

    #[test]
    fn test_registrable_drops_platform_hostnames() {
        let desired = BTreeSet::from([
            "app-injected.cleverapps.io".to_string(),
            "www.example.com".to_string(),
            "api.example.com".to_string(),
        ]);

        assert_eq!(
            pattern().registrable(&desired),
            vec!["api.example.com", "www.example.com"]
        );
    }

    #[test]
    fn test_custom_platform_domain() {
        let pattern = VhostPattern::for_domain("apps.example.net").unwrap();
        assert!(pattern.is_default("app-1.apps.example.net"));
        assert!(!pattern.is_default("app-1.cleverapps.io"));
    }
}
