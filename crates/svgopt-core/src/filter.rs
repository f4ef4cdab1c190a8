//! Selection of candidate files from the changes in a pull request.
//!
//! A descriptor is a candidate when its path looks like an SVG that is not
//! ignored, and its status says the file has new content after the change.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::change::ChangeDescriptor;
use crate::error::ConfigError;

/// File suffix of SVG images.
pub const SVG_FILE_EXTENSION: &str = ".svg";

/// How the SVG suffix is compared against a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuffixMatch {
    /// `icon.svg` matches, `icon.SVG` does not.
    #[default]
    Exact,
    CaseInsensitive,
}

impl SuffixMatch {
    fn matches(&self, path: &str, suffix: &str) -> bool {
        match self {
            SuffixMatch::Exact => path.ends_with(suffix),
            SuffixMatch::CaseInsensitive => {
                path.len() >= suffix.len()
                    && path.is_char_boundary(path.len() - suffix.len())
                    && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
            }
        }
    }
}

/// Compiled set of glob patterns for paths that must never be optimized.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl IgnoreSet {
    /// Compile the given globs. `*` does not cross `/`; use `**` for that.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| ConfigError::InvalidGlob {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|e| ConfigError::InvalidGlob {
            pattern: kept.join(", "),
            reason: e.to_string(),
        })?;
        Ok(Self { patterns: kept, set })
    }

    /// An ignore set that ignores nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// Whether `path` matches at least one pattern.
    pub fn is_ignored(&self, path: &str) -> bool {
        !self.patterns.is_empty() && self.set.is_match(path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Decides which changed files are candidates for optimization.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    ignore: IgnoreSet,
    suffix_match: SuffixMatch,
}

impl ChangeFilter {
    pub fn new(ignore: IgnoreSet, suffix_match: SuffixMatch) -> Self {
        Self {
            ignore,
            suffix_match,
        }
    }

    pub fn ignore(&self) -> &IgnoreSet {
        &self.ignore
    }

    pub fn suffix_match(&self) -> SuffixMatch {
        self.suffix_match
    }

    /// Path predicate: an SVG path that is not ignored.
    pub fn is_svg_path(&self, path: &str) -> bool {
        self.suffix_match.matches(path, SVG_FILE_EXTENSION) && !self.ignore.is_ignored(path)
    }

    /// Both the path and the status predicates hold.
    pub fn is_eligible(&self, descriptor: &ChangeDescriptor) -> bool {
        self.is_svg_path(&descriptor.path) && descriptor.status.has_new_content()
    }

    /// Eligible descriptors, in input order.
    pub fn select(&self, descriptors: &[ChangeDescriptor]) -> Vec<ChangeDescriptor> {
        descriptors
            .iter()
            .filter(|d| self.is_eligible(d))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeStatus;

    fn descriptor(path: &str, status: ChangeStatus) -> ChangeDescriptor {
        ChangeDescriptor::new(path, status)
    }

    #[test]
    fn test_svg_suffix_exact() {
        let filter = ChangeFilter::default();
        assert!(filter.is_svg_path("icons/logo.svg"));
        assert!(!filter.is_svg_path("icons/logo.SVG"));
        assert!(!filter.is_svg_path("icons/logo.png"));
        assert!(!filter.is_svg_path("icons/logo.svg.bak"));
        assert!(!filter.is_svg_path("svg"));
    }

    #[test]
    fn test_svg_suffix_case_insensitive() {
        let filter = ChangeFilter::new(IgnoreSet::empty(), SuffixMatch::CaseInsensitive);
        assert!(filter.is_svg_path("icons/logo.SVG"));
        assert!(filter.is_svg_path("icons/logo.Svg"));
        assert!(!filter.is_svg_path("icons/logo.svgz"));
        assert!(!filter.is_svg_path("vg"));
    }

    #[test]
    fn test_removed_svg_never_eligible() {
        let filter = ChangeFilter::default();
        assert!(!filter.is_eligible(&descriptor("a.svg", ChangeStatus::Removed)));
        assert!(!filter.is_eligible(&descriptor("a.svg", ChangeStatus::Renamed)));
        assert!(!filter.is_eligible(&descriptor("a.svg", ChangeStatus::Unchanged)));
        assert!(filter.is_eligible(&descriptor("a.svg", ChangeStatus::Added)));
        assert!(filter.is_eligible(&descriptor("a.svg", ChangeStatus::Modified)));
    }

    #[test]
    fn test_ignore_patterns() {
        let ignore = IgnoreSet::new(["foo/*", "**/vendor/**"]).unwrap();
        let filter = ChangeFilter::new(ignore, SuffixMatch::Exact);

        assert!(!filter.is_eligible(&descriptor("foo/bar.svg", ChangeStatus::Added)));
        assert!(!filter.is_eligible(&descriptor(
            "web/vendor/icons/x.svg",
            ChangeStatus::Modified
        )));
        assert!(filter.is_eligible(&descriptor("foobar.svg", ChangeStatus::Added)));
        // `*` does not cross directories
        assert!(filter.is_eligible(&descriptor("foo/nested/bar.svg", ChangeStatus::Added)));
    }

    #[test]
    fn test_empty_ignore_set_excludes_nothing() {
        let ignore = IgnoreSet::new(Vec::<String>::new()).unwrap();
        assert!(ignore.is_empty());
        assert!(!ignore.is_ignored("anything.svg"));
    }

    #[test]
    fn test_invalid_glob() {
        let err = IgnoreSet::new(["icons/[a-"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { ref pattern, .. } if pattern == "icons/[a-"));
    }

    #[test]
    fn test_select_preserves_order() {
        let filter = ChangeFilter::default();
        let descriptors = vec![
            descriptor("z.svg", ChangeStatus::Modified),
            descriptor("readme.md", ChangeStatus::Added),
            descriptor("a.svg", ChangeStatus::Added),
            descriptor("gone.svg", ChangeStatus::Removed),
            descriptor("m.svg", ChangeStatus::Modified),
        ];

        let selected: Vec<_> = filter
            .select(&descriptors)
            .into_iter()
            .map(|d| d.path)
            .collect();
        assert_eq!(selected, vec!["z.svg", "a.svg", "m.svg"]);
    }

    #[test]
    fn test_select_empty() {
        assert!(ChangeFilter::default().select(&[]).is_empty());
    }
}
