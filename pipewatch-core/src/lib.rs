//! Pipewatch Core
//!
//! Core types and derivations for the Pipewatch ETL monitoring service.
//!
//! This crate contains:
//! - Domain types: Pipelines, their runs, and alerts
//! - DTOs: Request/response payloads exchanged over the HTTP API
//! - Health: Pure aggregation of run history into dashboard metrics

pub mod domain;
pub mod dto;
pub mod health;
