//! Core domain types
//!
//! This module contains the structures used across runwatch crates.
//! `task` is the service-agnostic view the poller works with; the rest
//! mirror the entities returned by the agent service.

pub mod agent;
pub mod message;
pub mod run;
pub mod task;
pub mod thread;

pub use task::{Task, TaskStatus};
