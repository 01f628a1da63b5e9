//! Data Transfer Objects for the HTTP API
//!
//! This module contains the request and response payloads exchanged between
//! the Pipewatch server and its clients. Field names are camelCase on the wire.

pub mod alert;
pub mod patch;
pub mod pipeline;
pub mod run;

pub use patch::FieldPatch;
