//! Intake domain module.
//!
//! The conversation state machine that collects one record turn by turn:
//! the session and its flow states, the field input resolver, the nested
//! group collector, the update flow, reply-token rules, pluggable field
//! rules and the document assembler boundary.

mod assembler;
mod errors;
mod nested_group;
mod resolver;
mod rules;
mod session;
pub mod tokens;
mod update;

pub use assembler::{assemble, AssembledRecord};
pub use errors::{FlowError, ResolveError};
pub use nested_group::{GroupAwaiting, GroupStage, GroupStep, NestedGroupContext};
pub use resolver::{match_option, resolve, ResolveContext};
pub use rules::{FieldRule, FieldRules};
pub use session::{FlowStage, FlowState, NextStep, PendingPrompt, Session};
pub use update::{split_assignment, UpdateContext, FIELD_CHOOSER};
