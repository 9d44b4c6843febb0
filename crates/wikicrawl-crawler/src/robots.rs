use std::collections::BTreeSet;

/// Disallowed path prefixes taken from a robots.txt.
///
/// Only `User-agent` grouping and `Disallow` prefixes are understood, the rest
/// of the robots grammar is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRuleSet {
    prefixes: BTreeSet<String>,
}

impl ExclusionRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `Disallow` rules applying to `*` or to `user_agent`.
    ///
    /// Rules that appear before any `User-agent` line apply to everyone.
    pub fn parse(policy: &str, user_agent: &str) -> Self {
        let user_agent = user_agent.to_ascii_lowercase();
        let mut rules = Self::new();

        let mut applies = true;
        let mut in_agent_lines = false;
        for line in policy.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            };
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_ascii_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    let agent = value.to_ascii_lowercase();
                    let matches =
                        agent == "*" || (!agent.is_empty() && user_agent.contains(&agent));
                    // Consecutive User-agent lines share the following rules
                    applies = if in_agent_lines {
                        applies || matches
                    } else {
                        matches
                    };
                    in_agent_lines = true;
                }
                "disallow" => {
                    in_agent_lines = false;
                    if applies {
                        rules.insert(value);
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        rules
    }

    /// Empty prefixes are ignored, they would exclude everything.
    pub fn insert(&mut self, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return false;
        }
        self.prefixes.insert(prefix)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionRuleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut rules = Self::new();
        for prefix in iter {
            rules.insert(prefix);
        }
        rules
    }
}
