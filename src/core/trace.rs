//! Result records produced by the rule-based languages

use serde::{Deserialize, Serialize};

/// One comparison between two model elements
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub rule: String,
    pub left: String,
    pub right: String,
    pub matching: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTrace {
    pub matches: Vec<Match>,
}

impl MatchTrace {
    pub fn push(&mut self, entry: Match) {
        self.matches.push(entry);
    }

    /// Only the pairs that matched
    pub fn matching(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.matching)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// One source element and what a rule produced from it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    pub rule: String,
    pub source: String,
    pub targets: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationTrace {
    pub transformations: Vec<Transformation>,
}

impl TransformationTrace {
    pub fn push(&mut self, entry: Transformation) {
        self.transformations.push(entry);
    }

    pub fn targets_of(&self, source: &str) -> Vec<&str> {
        self.transformations
            .iter()
            .filter(|t| t.source == source)
            .flat_map(|t| t.targets.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transformations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }
}

/// Matched elements and the element merged from them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    pub rule: String,
    pub left: String,
    pub right: String,
    pub merged: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTrace {
    pub merges: Vec<Merge>,
}

impl MergeTrace {
    pub fn push(&mut self, entry: Merge) {
        self.merges.push(entry);
    }

    pub fn len(&self) -> usize {
        self.merges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }
}

/// Result of a merging run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTraces {
    pub match_trace: MatchTrace,
    pub merge_trace: MergeTrace,
}

/// A declared check. Critiques are the soft kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub context: String,
    pub critique: bool,
}

impl Constraint {
    pub fn constraint<S: Into<String>, C: Into<String>>(name: S, context: C) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
            critique: false,
        }
    }

    pub fn critique<S: Into<String>, C: Into<String>>(name: S, context: C) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
            critique: true,
        }
    }
}

/// Constraints grouped under the element type they apply to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintContext {
    pub name: String,
    pub type_name: String,
    pub constraints: Vec<Constraint>,
}

/// A failed check against one element
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsatisfiedConstraint {
    pub constraint: Constraint,
    pub instance: String,
    pub message: String,
}

impl UnsatisfiedConstraint {
    pub fn new<I: Into<String>, M: Into<String>>(
        constraint: Constraint,
        instance: I,
        message: M,
    ) -> Self {
        Self {
            constraint,
            instance: instance.into(),
            message: message.into(),
        }
    }

    pub fn is_critique(&self) -> bool {
        self.constraint.critique
    }

    pub fn name(&self) -> &str {
        &self.constraint.name
    }
}
