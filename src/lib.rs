//! Nexchat - Conversational record intake
//!
//! Guides a user through supplying every field a structured record needs,
//! one short chat message at a time, including required repeating
//! subgroups (order lines, contacts, ...). Each turn loads a TTL-bound
//! session, resolves the answer, decides the next question and assembles
//! the record once nothing is missing.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
