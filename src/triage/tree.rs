use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Answer to a yes/no node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Yes => "yes",
            Choice::No => "no",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Ok(Choice::Yes),
            "no" | "n" => Ok(Choice::No),
            _ => Err(format!("Unknown choice: {}", s)),
        }
    }
}

/// Labels (i18n keys) of the two answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceLabels {
    #[serde(default)]
    pub yes: String,
    #[serde(default)]
    pub no: String,
}

/// Subtrees reached by each answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Children {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes: Option<Box<DecisionTreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<Box<DecisionTreeNode>>,
}

/// How urgently a triage outcome needs care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageUrgency {
    Low,
    Medium,
    High,
    Emergency,
}

/// Leaf payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOutcome {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<TriageUrgency>,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A triage tree node.
///
/// Well-formed nodes are either a question (question, options, children) or
/// a result. Every part is optional so malformed trees still deserialize and
/// can be reported by [`validate_tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTreeNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ChoiceLabels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TreeOutcome>,
}

impl DecisionTreeNode {
    /// Question node with both branches.
    pub fn question(
        id: impl Into<String>,
        question: impl Into<String>,
        options: ChoiceLabels,
        yes: DecisionTreeNode,
        no: DecisionTreeNode,
    ) -> Self {
        Self {
            id: id.into(),
            question: Some(question.into()),
            options: Some(options),
            children: Some(Children {
                yes: Some(Box::new(yes)),
                no: Some(Box::new(no)),
            }),
            result: None,
        }
    }

    /// Result node.
    pub fn leaf(
        id: impl Into<String>,
        title: impl Into<String>,
        urgency: TriageUrgency,
        actions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: None,
            options: None,
            children: None,
            result: Some(TreeOutcome {
                title: title.into(),
                urgency: Some(urgency),
                actions,
            }),
        }
    }

    /// Parse a tree from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn is_result(&self) -> bool {
        self.result.is_some()
    }

    /// Subtree for `choice`, if present.
    pub fn child(&self, choice: Choice) -> Option<&DecisionTreeNode> {
        let children = self.children.as_ref()?;
        match choice {
            Choice::Yes => children.yes.as_deref(),
            Choice::No => children.no.as_deref(),
        }
    }

    fn child_nodes(&self) -> impl Iterator<Item = &DecisionTreeNode> {
        [Choice::Yes, Choice::No]
            .into_iter()
            .filter_map(move |choice| self.child(choice))
    }

    /// Depth-first search for `id`, this node included.
    pub fn find(&self, id: &str) -> Option<&DecisionTreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.child_nodes().find_map(|child| child.find(id))
    }

    /// Every node, depth-first, yes branch before no.
    pub fn nodes(&self) -> Vec<&DecisionTreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(no) = node.child(Choice::No) {
                stack.push(no);
            }
            if let Some(yes) = node.child(Choice::Yes) {
                stack.push(yes);
            }
        }
        out
    }
}

/// Outcome of [`validate_tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check a tree's structure, collecting every problem found.
pub fn validate_tree(root: &DecisionTreeNode) -> TreeValidation {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for node in root.nodes() {
        let id = node.id.as_str();
        if id.trim().is_empty() {
            errors.push("Node with empty id".to_string());
        } else if !seen.insert(id) {
            errors.push(format!("Duplicate node id: {}", id));
        }

        let has_question = node.question.is_some() || node.options.is_some() || node.children.is_some();
        match (has_question, &node.result) {
            (true, Some(_)) => {
                errors.push(format!("Node {} has both a question and a result", id));
            }
            (false, None) => {
                errors.push(format!("Node {} has neither a question nor a result", id));
            }
            (true, None) => {
                if node.question.as_deref().map_or(true, |q| q.trim().is_empty()) {
                    errors.push(format!("Node {} is missing its question", id));
                }
                match &node.options {
                    Some(labels) => {
                        if labels.yes.trim().is_empty() {
                            errors.push(format!("Node {} is missing the 'yes' option label", id));
                        }
                        if labels.no.trim().is_empty() {
                            errors.push(format!("Node {} is missing the 'no' option label", id));
                        }
                    }
                    None => errors.push(format!("Node {} is missing its options", id)),
                }
                for choice in [Choice::Yes, Choice::No] {
                    if node.child(choice).is_none() {
                        errors.push(format!("Node {} is missing the '{}' child", id, choice));
                    }
                }
            }
            (false, Some(outcome)) => {
                if outcome.title.trim().is_empty() {
                    errors.push(format!("Result node {} is missing its title", id));
                }
                if outcome.urgency.is_none() {
                    errors.push(format!("Result node {} is missing its urgency", id));
                }
            }
        }
    }

    TreeValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
