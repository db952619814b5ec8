use serde::{Deserialize, Serialize};
use std::fmt;

/// A detected inconsistency. Findings are recorded in the report log, never
/// raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Finding {
    /// Name of the rule that produced it.
    pub rule: String,
    /// Offending node names, sorted.
    pub nodes: Vec<String>,
    pub message: String,
}

impl Finding {
    pub fn new(rule: impl Into<String>, nodes: Vec<String>, message: impl Into<String>) -> Self {
        let mut nodes = nodes;
        nodes.sort();
        Self {
            rule: rule.into(),
            nodes,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] nodes {}: {}",
            self.rule,
            self.nodes.join(", "),
            self.message
        )
    }
}
