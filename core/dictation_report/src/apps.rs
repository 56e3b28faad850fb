//! Application identifier → short display name.

pub const UNKNOWN_APP: &str = "Unknown";
pub const OTHER_APP: &str = "Other";

const SEARCH_TAIL_CHARS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppRule {
    pub pattern: &'static str,
    pub display: &'static str,
    pub case_sensitive: bool,
}

impl AppRule {
    pub const fn new(pattern: &'static str, display: &'static str) -> Self {
        Self {
            pattern,
            display,
            case_sensitive: false,
        }
    }

    pub const fn case_sensitive(pattern: &'static str, display: &'static str) -> Self {
        Self {
            pattern,
            display,
            case_sensitive: true,
        }
    }

    fn matches(&self, raw: &str) -> bool {
        if self.case_sensitive {
            raw.contains(self.pattern)
        } else {
            raw.to_lowercase().contains(&self.pattern.to_lowercase())
        }
    }
}

const TOP_APP_RULES: &[AppRule] = &[
    AppRule::new("todesktop", "Claude Desktop"),
    AppRule::new("ghostty", "Ghostty"),
    AppRule::new("brave", "Brave"),
    AppRule::new("obsidian", "Obsidian"),
    AppRule::new("session", "Session"),
    AppRule::new("zed", "Zed"),
    AppRule::new("cursor", "Cursor"),
    AppRule::new("Terminal", "Terminal"),
];

const DASHBOARD_RULES: &[AppRule] = &[
    AppRule::new("todesktop", "Claude Desktop"),
    AppRule::new("ghostty", "Ghostty"),
    AppRule::new("brave", "Brave"),
    AppRule::new("obsidian", "Obsidian"),
    AppRule::new("session", "Session"),
    AppRule::new("zed", "Zed"),
];

const SHORT_RULES: &[AppRule] = &[
    AppRule::new("todesktop", "Claude"),
    AppRule::new("ghostty", "Ghostty"),
    AppRule::new("brave", "Brave"),
    AppRule::new("obsidian", "Obsidian"),
    AppRule::new("session", "Session"),
];

/// What an unmatched, non-empty identifier turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// The raw identifier, unchanged.
    Raw,
    /// A fixed `"Other"` bucket.
    Other,
    /// The last `n` characters of the raw identifier.
    Tail(usize),
}

/// Ordered rule list; first match wins.
///
/// The call sites deliberately disagree on their rule sets and fallbacks:
/// "top apps" keeps unknown identifiers visible, the dashboard folds them into
/// one slice, search trims them to fit a console line.
#[derive(Clone, Debug)]
pub struct Canonicalizer {
    rules: Vec<AppRule>,
    fallback: Fallback,
}

impl Canonicalizer {
    pub fn new(rules: Vec<AppRule>, fallback: Fallback) -> Self {
        Self { rules, fallback }
    }

    pub fn top_apps() -> Self {
        Self::new(TOP_APP_RULES.to_vec(), Fallback::Raw)
    }

    pub fn dashboard() -> Self {
        Self::new(DASHBOARD_RULES.to_vec(), Fallback::Other)
    }

    pub fn search() -> Self {
        Self::new(SHORT_RULES.to_vec(), Fallback::Tail(SEARCH_TAIL_CHARS))
    }

    pub fn notes() -> Self {
        Self::new(SHORT_RULES.to_vec(), Fallback::Raw)
    }

    pub fn canonical_name(&self, raw: Option<&str>) -> String {
        let raw = match raw {
            Some(r) if !r.is_empty() => r,
            _ => return UNKNOWN_APP.to_string(),
        };
        if let Some(rule) = self.rules.iter().find(|r| r.matches(raw)) {
            return rule.display.to_string();
        }
        match self.fallback {
            Fallback::Raw => raw.to_string(),
            Fallback::Other => OTHER_APP.to_string(),
            Fallback::Tail(n) => {
                let len = raw.chars().count();
                raw.chars().skip(len.saturating_sub(n)).collect()
            }
        }
    }

    /// Rule patterns whose display name contains `needle` (case-insensitive).
    ///
    /// Lets an app filter typed as a display name ("claude") also select the
    /// raw identifiers that canonicalize to it.
    pub fn patterns_for_display(&self, needle: &str) -> Vec<&'static str> {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<&'static str> = Vec::new();
        for rule in &self.rules {
            if rule.display.to_lowercase().contains(&needle) && !out.contains(&rule.pattern) {
                out.push(rule.pattern);
            }
        }
        out
    }
}
