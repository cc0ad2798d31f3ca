//! Application handlers.
//!
//! Command handlers that orchestrate the intake domain over its ports.

pub mod intake;

pub use intake::{
    HandleTurnCommand, HandleTurnHandler, IntakePorts, TurnConfig, TurnError, TurnOutcome,
    TurnReply,
};
