//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: Sequences the analyze, anonymize and llm_analyze stages

pub mod orchestrator;

// Re-export commonly used types
pub use orchestrator::Orchestrator;
