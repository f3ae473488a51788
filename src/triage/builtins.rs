use super::{ChoiceLabels, DecisionTreeNode, TriageUrgency};

/// Id of the root of [`period_pain_triage`].
pub const TRIAGE_START: &str = "start";

const PREFIX: &str = "medicalCareGuide.decisionTree";

fn labels() -> ChoiceLabels {
    ChoiceLabels {
        yes: format!("{}.options.yes", PREFIX),
        no: format!("{}.options.no", PREFIX),
    }
}

fn ask(id: &str, yes: DecisionTreeNode, no: DecisionTreeNode) -> DecisionTreeNode {
    DecisionTreeNode::question(id, format!("{}.nodes.{}.question", PREFIX, id), labels(), yes, no)
}

fn outcome(id: &str, urgency: TriageUrgency, actions: usize) -> DecisionTreeNode {
    let actions = (1..=actions)
        .map(|n| format!("{}.results.{}.actions.{}", PREFIX, id, n))
        .collect();
    DecisionTreeNode::leaf(id, format!("{}.results.{}.title", PREFIX, id), urgency, actions)
}

/// The period-pain triage tree.
///
/// `start` asks about severe pain; `yes, yes` ends at `emergency_result`.
pub fn period_pain_triage() -> DecisionTreeNode {
    ask(
        TRIAGE_START,
        ask(
            "severe_symptoms_check",
            outcome("emergency_result", TriageUrgency::Emergency, 3),
            outcome("urgent_result", TriageUrgency::High, 3),
        ),
        ask(
            "duration_check",
            outcome("consult_result", TriageUrgency::Medium, 3),
            outcome("self_care_result", TriageUrgency::Low, 4),
        ),
    )
}
