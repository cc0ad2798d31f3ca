//! Intake handlers - The flow controller and its helpers.
//!
//! `HandleTurnHandler::handle` is the single boundary entry point: one actor,
//! one raw message in, one renderable reply out.

mod dispatch_intent;
mod errors;
mod handle_turn;
mod start_create;
mod turn_locks;
mod update_record;

use std::sync::Arc;

use crate::ports::{
    Clock, DocumentStore, FieldPresenter, IntentParser, PermissionChecker, SchemaProvider,
    SessionStore,
};

pub use errors::TurnError;
pub use handle_turn::{HandleTurnCommand, HandleTurnHandler, TurnConfig, TurnOutcome, TurnReply};
pub use turn_locks::TurnLocks;

/// Collaborators the flow controller talks to.
#[derive(Clone)]
pub struct IntakePorts {
    pub sessions: Arc<dyn SessionStore>,
    pub schema: Arc<dyn SchemaProvider>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub documents: Arc<dyn DocumentStore>,
    pub intents: Arc<dyn IntentParser>,
    pub presenter: Arc<dyn FieldPresenter>,
    pub clock: Arc<dyn Clock>,
}
