use std::collections::HashSet;

use crate::config::{KeywordCase, RelevanceConfig, RelevancePolicy};
use crate::extract::Candidate;
use crate::graph::VertexGraph;
use crate::robots::ExclusionRuleSet;

/// Outcome of running a candidate through the [`RelevanceFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted { score: usize },
    Duplicate,
    Excluded,
    Fragment,
    Namespace,
    Irrelevant { score: usize },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    policy: RelevancePolicy,
    threshold: usize,
    case: KeywordCase,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I, config: &RelevanceConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| match config.keyword_case {
                KeywordCase::Insensitive => k.to_lowercase(),
                KeywordCase::Sensitive => k,
            })
            .collect();

        Self {
            keywords,
            policy: config.policy,
            threshold: config.threshold,
            case: config.keyword_case,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn policy(&self) -> RelevancePolicy {
        self.policy
    }

    pub fn evaluate(
        &self,
        candidate: &Candidate,
        graph: &VertexGraph,
        visited: &HashSet<String>,
        rules: &ExclusionRuleSet,
    ) -> Verdict {
        let path = candidate.path.as_str();

        if graph.contains(path) || visited.contains(path) {
            return Verdict::Duplicate;
        }
        if rules.is_excluded(path) {
            return Verdict::Excluded;
        }
        if path.contains('#') {
            return Verdict::Fragment;
        }
        if path.contains(':') {
            return Verdict::Namespace;
        }

        match self.policy {
            RelevancePolicy::Scored => {
                let score = candidate
                    .anchor_text
                    .as_deref()
                    .map_or(0, |text| self.matching_keywords(text))
                    + candidate
                        .context
                        .as_deref()
                        .map_or(0, |text| self.matching_keywords(text));
                if score >= self.threshold {
                    Verdict::Accepted { score }
                } else {
                    Verdict::Irrelevant { score }
                }
            }
            RelevancePolicy::PathContains => {
                // Article paths spell spaces as underscores
                if self.matching_keywords(&path.replace('_', " ")) > 0 {
                    Verdict::Accepted { score: 1 }
                } else {
                    Verdict::Irrelevant { score: 0 }
                }
            }
        }
    }

    /// Number of distinct keywords occurring in `text`.
    pub fn matching_keywords(&self, text: &str) -> usize {
        let text = match self.case {
            KeywordCase::Insensitive => text.to_lowercase(),
            KeywordCase::Sensitive => text.to_string(),
        };
        self.keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count()
    }
}
