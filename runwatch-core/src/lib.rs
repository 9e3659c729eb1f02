//! Runwatch Core
//!
//! Core types shared by the runwatch client and CLI.
//!
//! This crate contains:
//! - Domain types: Tasks as seen by the run poller, and the agent service
//!   entities (Agent, Thread, Message, Run, RunStep)
//! - DTOs: Request bodies sent to the agent service

pub mod domain;
pub mod dto;
