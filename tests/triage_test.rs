//! Integration tests for triage trees
//!
//! Walks the built-in tree and trees loaded from JSON.

use periodhub_assessment::error::TransitionError;
use periodhub_assessment::triage::{
    period_pain_triage, validate_tree, Choice, DecisionTreeNode, DecisionTreeWalker,
    TriageUrgency,
};

#[cfg(test)]
mod walker_tests {
    use super::*;

    #[test]
    fn test_every_leaf_reachable() {
        let tree = period_pain_triage();
        let cases = [
            ([Choice::Yes, Choice::Yes], "emergency_result", TriageUrgency::Emergency),
            ([Choice::Yes, Choice::No], "urgent_result", TriageUrgency::High),
            ([Choice::No, Choice::Yes], "consult_result", TriageUrgency::Medium),
            ([Choice::No, Choice::No], "self_care_result", TriageUrgency::Low),
        ];

        for (choices, leaf, urgency) in cases {
            let mut walker = DecisionTreeWalker::new(&tree);
            let node = walker.walk(&choices).unwrap();
            assert_eq!(node.id, leaf);
            assert_eq!(walker.result().and_then(|r| r.urgency), Some(urgency));
        }
    }

    #[test]
    fn test_undo_then_take_other_branch() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        walker.walk(&[Choice::Yes, Choice::Yes]).unwrap();

        walker.go_back().unwrap();
        walker.make_decision(Choice::No).unwrap();
        assert_eq!(walker.current_node().id, "urgent_result");
        assert_eq!(walker.path().len(), 2);

        walker.go_back().unwrap();
        walker.go_back().unwrap();
        assert_eq!(walker.current_node().id, "start");
        assert_eq!(walker.go_back().unwrap_err(), TransitionError::NothingToUndo);
    }

    #[test]
    fn test_path_records_questions() {
        let tree = period_pain_triage();
        let mut walker = DecisionTreeWalker::new(&tree);
        walker.walk(&[Choice::No]).unwrap();

        let step = &walker.path()[0];
        assert_eq!(step.node_id, "start");
        assert_eq!(step.choice, Choice::No);
        assert_eq!(
            step.question.as_deref(),
            Some("medicalCareGuide.decisionTree.nodes.start.question")
        );
    }
}

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn test_builtin_tree_survives_json() {
        let tree = period_pain_triage();
        let json = serde_json::to_string(&tree).unwrap();
        let parsed = DecisionTreeNode::from_json(&json).unwrap();
        assert_eq!(parsed, tree);
        assert!(validate_tree(&parsed).is_valid);
    }

    #[test]
    fn test_malformed_tree_collects_all_errors() {
        let tree = DecisionTreeNode::from_json(
            r#"{
                "id": "root",
                "question": "",
                "options": {"yes": "y", "no": "n"},
                "children": {
                    "yes": {"id": "dup", "result": {"title": "", "urgency": "low"}},
                    "no": {"id": "dup"}
                }
            }"#,
        )
        .unwrap();

        let validation = validate_tree(&tree);
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec![
                "Node root is missing its question".to_string(),
                "Result node dup is missing its title".to_string(),
                "Duplicate node id: dup".to_string(),
                "Node dup has neither a question nor a result".to_string(),
            ]
        );
    }
}
