mod host_pattern;

pub use host_pattern::HostPattern;

use url::Url;

/// Which URLs an analysis run admits, by host.
///
/// An empty include list admits every host. Excludes always win. URLs with no
/// parseable host (relative paths, bare names) are admitted only when there
/// is no include list.
#[derive(Debug, Clone, Default)]
pub struct UrlScope {
    pub include: Vec<HostPattern>,
    pub exclude: Vec<HostPattern>,
}

impl UrlScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include<S: AsRef<str>>(mut self, patterns: &[S]) -> crate::Result<Self> {
        for pattern in patterns {
            self.include.push(HostPattern::parse(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn with_exclude<S: AsRef<str>>(mut self, patterns: &[S]) -> crate::Result<Self> {
        for pattern in patterns {
            self.exclude.push(HostPattern::parse(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn admits(&self, url: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        let host = match host_of(url) {
            Some(host) => host,
            None => return self.include.is_empty(),
        };

        if self.exclude.iter().any(|pattern| pattern.matches(&host)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|pattern| pattern.matches(&host))
    }
}

/// Hostname of an absolute URL, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_admits_everything() {
        let scope = UrlScope::new();
        assert!(scope.admits("https://x.com/a.js"));
        assert!(scope.admits("/relative/a.js"));
    }

    #[test]
    fn test_include_and_exclude() {
        let scope = UrlScope::new()
            .with_include(&["*.example.com", "example.com"])
            .unwrap()
            .with_exclude(&["ads.example.com"])
            .unwrap();

        assert!(scope.admits("https://example.com/"));
        assert!(scope.admits("https://cdn.example.com/a.js"));
        assert!(!scope.admits("https://ads.example.com/pixel.gif"));
        assert!(!scope.admits("https://other.org/a.js"));
        assert!(!scope.admits("/relative/a.js"));
    }

    #[test]
    fn test_exclude_only_keeps_relative_urls() {
        let scope = UrlScope::new().with_exclude(&["*.tracker.io"]).unwrap();
        assert!(scope.admits("/app.js"));
        assert!(scope.admits("https://x.com/app.js"));
        assert!(!scope.admits("https://eu.tracker.io/t.gif"));
    }
}
