//! Rule-based disease detection
//!
//! Independent threshold rules over raw vitals, evaluated alongside the
//! classifier. Rules only ever add alarm; the consolidation policy in
//! [`crate::verdict`] decides how their output merges with the model's.

mod engine;

pub use engine::{evaluate, Alert, RuleFindings, Severity};
