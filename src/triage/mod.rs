//! Yes/no triage decision trees.
//!
//! [`DecisionTreeNode`] mirrors the JSON shape of a tree, [`validate_tree`]
//! reports structural problems, and [`DecisionTreeWalker`] steps through a
//! tree with undo. Transitions that cannot be taken are errors, not no-ops.

mod builtins;
mod tree;
mod walker;

pub use builtins::*;
pub use tree::*;
pub use walker::*;
