use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Choice, DecisionTreeNode, TreeOutcome};
use crate::error::{TransitionError, TransitionResult};

/// A decision taken while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionStep {
    pub node_id: String,
    pub question: Option<String>,
    pub choice: Choice,
    pub timestamp: DateTime<Utc>,
}

/// Walks a borrowed triage tree one yes/no decision at a time.
///
/// The current node is always the initial node followed along `path`, so
/// undoing a step is truncating the path.
#[derive(Debug, Clone)]
pub struct DecisionTreeWalker<'a> {
    initial: &'a DecisionTreeNode,
    current: &'a DecisionTreeNode,
    path: Vec<DecisionStep>,
}

impl<'a> DecisionTreeWalker<'a> {
    /// Start at the root.
    pub fn new(root: &'a DecisionTreeNode) -> Self {
        Self {
            initial: root,
            current: root,
            path: Vec::new(),
        }
    }

    /// Start at the node with `id`, searched depth-first from `root`.
    pub fn starting_at(root: &'a DecisionTreeNode, id: &str) -> TransitionResult<Self> {
        let initial = root.find(id).ok_or_else(|| TransitionError::UnknownNode {
            node_id: id.to_string(),
        })?;
        Ok(Self::new(initial))
    }

    pub fn current_node(&self) -> &'a DecisionTreeNode {
        self.current
    }

    pub fn initial_node(&self) -> &'a DecisionTreeNode {
        self.initial
    }

    pub fn path(&self) -> &[DecisionStep] {
        &self.path
    }

    /// Whether the current node is a result.
    pub fn is_completed(&self) -> bool {
        self.current.is_result()
    }

    /// Outcome at the current node, if it is a result.
    pub fn result(&self) -> Option<&'a TreeOutcome> {
        self.current.result.as_ref()
    }

    /// Follow `choice` from the current node.
    ///
    /// # Errors
    /// `TerminalNode` at a result, `MissingBranch` when the branch is absent.
    /// The walker is unchanged on error.
    pub fn make_decision(&mut self, choice: Choice) -> TransitionResult<&'a DecisionTreeNode> {
        let node = self.current;
        if node.is_result() {
            return Err(TransitionError::TerminalNode {
                node_id: node.id.clone(),
            });
        }
        let next = node.child(choice).ok_or_else(|| TransitionError::MissingBranch {
            node_id: node.id.clone(),
            choice: choice.to_string(),
        })?;

        self.path.push(DecisionStep {
            node_id: node.id.clone(),
            question: node.question.clone(),
            choice,
            timestamp: Utc::now(),
        });
        self.current = next;
        debug!(from = %node.id, to = %next.id, choice = %choice, depth = self.path.len(), "Triage decision");

        Ok(next)
    }

    /// Apply several decisions; on the first failure nothing is applied.
    pub fn walk(&mut self, choices: &[Choice]) -> TransitionResult<&'a DecisionTreeNode> {
        let checkpoint = self.path.len();
        let before = self.current;
        for choice in choices {
            if let Err(e) = self.make_decision(*choice) {
                self.path.truncate(checkpoint);
                self.current = before;
                return Err(e);
            }
        }
        Ok(self.current)
    }

    /// Undo the last decision.
    ///
    /// # Errors
    /// `NothingToUndo` when no decision has been made.
    pub fn go_back(&mut self) -> TransitionResult<&'a DecisionTreeNode> {
        let undone = self.path.pop().ok_or(TransitionError::NothingToUndo)?;
        self.current = self.replay()?;
        debug!(undone = %undone.node_id, current = %self.current.id, "Triage step undone");
        Ok(self.current)
    }

    /// Back to the initial node with an empty path.
    pub fn reset(&mut self) {
        self.path.clear();
        self.current = self.initial;
    }

    fn replay(&self) -> TransitionResult<&'a DecisionTreeNode> {
        self.path.iter().try_fold(self.initial, |node, step| {
            node.child(step.choice).ok_or_else(|| TransitionError::MissingBranch {
                node_id: node.id.clone(),
                choice: step.choice.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::period_pain_triage;

    #[test]
    fn test_yes_yes_reaches_emergency() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::starting_at(&tree, "start").unwrap();
        walker.make_decision(Choice::Yes).unwrap();
        let node = walker.make_decision(Choice::Yes).unwrap();

        assert_eq!(node.id, "emergency_result");
        assert!(walker.is_completed());
        assert_eq!(
            walker.result().unwrap().urgency,
            Some(crate::triage::TriageUrgency::Emergency)
        );
        assert_eq!(walker.path().len(), 2);
        assert_eq!(walker.path()[0].node_id, "start");
    }

    #[test]
    fn test_decision_at_result_is_error() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        walker.walk(&[Choice::No, Choice::No]).unwrap();
        let err = walker.make_decision(Choice::Yes).unwrap_err();
        assert_eq!(
            err,
            TransitionError::TerminalNode {
                node_id: "self_care_result".to_string()
            }
        );
        assert_eq!(walker.path().len(), 2);
    }

    #[test]
    fn test_go_back_restores_previous_state() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        walker.make_decision(Choice::Yes).unwrap();
        let before_node = walker.current_node().id.clone();
        let before_path = walker.path().to_vec();

        walker.make_decision(Choice::No).unwrap();
        assert!(walker.is_completed());

        let node = walker.go_back().unwrap();
        assert_eq!(node.id, before_node);
        assert_eq!(walker.path(), before_path.as_slice());
        assert!(!walker.is_completed());
        assert!(walker.result().is_none());
    }

    #[test]
    fn test_go_back_twice_returns_to_root() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::starting_at(&tree, "start").unwrap();
        walker.walk(&[Choice::Yes, Choice::Yes]).unwrap();
        assert!(walker.is_completed());

        let node = walker.go_back().unwrap();
        assert_eq!(node.id, "severe_symptoms_check");
        assert_eq!(walker.path().len(), 1);
        assert!(walker.result().is_none());

        let node = walker.go_back().unwrap();
        assert_eq!(node.id, "start");
        assert!(walker.path().is_empty());
        assert!(!walker.is_completed());
        assert_eq!(walker.go_back().unwrap_err(), TransitionError::NothingToUndo);
    }

    #[test]
    fn test_reset_from_leaf_returns_to_root() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::starting_at(&tree, "start").unwrap();
        walker.walk(&[Choice::No, Choice::No]).unwrap();
        assert_eq!(walker.current_node().id, "self_care_result");

        walker.reset();
        assert_eq!(walker.current_node().id, "start");
        assert_eq!(walker.initial_node().id, "start");
        assert!(walker.path().is_empty());
        assert!(!walker.is_completed());
        assert!(walker.result().is_none());

        let node = walker.make_decision(Choice::Yes).unwrap();
        assert_eq!(node.id, "severe_symptoms_check");
    }

    #[test]
    fn test_go_back_on_empty_path() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        assert_eq!(walker.go_back().unwrap_err(), TransitionError::NothingToUndo);
        assert_eq!(walker.current_node().id, "start");
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::starting_at(&tree, "duration_check").unwrap();
        walker.make_decision(Choice::Yes).unwrap();
        walker.reset();
        assert_eq!(walker.current_node().id, "duration_check");
        assert!(walker.path().is_empty());
    }

    #[test]
    fn test_unknown_start_node() {
        let tree = period_pain_triage();
        let err = DecisionTreeWalker::starting_at(&tree, "nowhere").unwrap_err();
        assert!(matches!(err, TransitionError::UnknownNode { node_id } if node_id == "nowhere"));
    }

    #[test]
    fn test_missing_branch() {
        let tree = DecisionTreeNode::from_json(
            r#"{"id":"root","question":"q","options":{"yes":"y","no":"n"},"children":{"yes":{"id":"leaf","result":{"title":"t","urgency":"low"}}}}"#,
        )
        .unwrap();
        let mut walker = DecisionTreeWalker::new(&tree);
        let err = walker.make_decision(Choice::No).unwrap_err();
        assert!(matches!(err, TransitionError::MissingBranch { ref choice, .. } if choice == "no"));
        assert_eq!(walker.current_node().id, "root");
        assert!(walker.path().is_empty());
    }

    #[test]
    fn test_walk_is_all_or_nothing() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        walker.make_decision(Choice::No).unwrap();
        assert!(walker.walk(&[Choice::No, Choice::Yes]).is_err());
        assert_eq!(walker.current_node().id, "duration_check");
        assert_eq!(walker.path().len(), 1);
    }
}
