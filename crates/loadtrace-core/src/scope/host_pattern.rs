use glob::Pattern;

/// A host pattern used to scope which URLs take part in an analysis.
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// Exact hostname (case-insensitive)
    Exact(String),
    /// Wildcard hostname such as `*.cdn.example.com`
    Glob(Pattern),
}

impl HostPattern {
    /// Parse a pattern. `*` or `?` makes it a glob, anything else is exact.
    pub fn parse(pattern: &str) -> crate::Result<Self> {
        let lowered = pattern.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(crate::Error::InvalidPattern(
                "host pattern must not be empty".to_string(),
            ));
        }

        if lowered.contains(['*', '?']) {
            Pattern::new(&lowered).map(HostPattern::Glob).map_err(|e| {
                crate::Error::InvalidPattern(format!("'{}': {}", pattern, e))
            })
        } else {
            Ok(HostPattern::Exact(lowered))
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        match self {
            HostPattern::Exact(expected) => host == *expected,
            HostPattern::Glob(glob) => glob.matches(&host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_is_case_insensitive() {
        let pattern = HostPattern::parse("CDN.Example.com").unwrap();
        assert!(pattern.matches("cdn.example.com"));
        assert!(!pattern.matches("static.example.com"));
    }

    #[test]
    fn test_glob_subdomains() {
        let pattern = HostPattern::parse("*.example.com").unwrap();
        assert!(pattern.matches("api.example.com"));
        assert!(pattern.matches("A.B.EXAMPLE.COM"));
        assert!(!pattern.matches("example.com"));
    }

    #[test]
    fn test_tracker_and_cdn_exclusions() {
        let tracker = HostPattern::parse("*.doubleclick.net").unwrap();
        assert!(tracker.matches("stats.g.doubleclick.net"));
        assert!(!tracker.matches("doubleclick.net.example.com"));

        let cdn = HostPattern::parse("cdn.jsdelivr.net").unwrap();
        assert!(cdn.matches("CDN.jsDelivr.net"));
        assert!(!cdn.matches("fastly.jsdelivr.net"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(HostPattern::parse("").is_err());
        assert!(HostPattern::parse("[a-.example.com*").is_err());
    }
}
