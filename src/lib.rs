// src/lib.rs
// AGORA CORE: synthetic focus groups, from persona generation through
// moderated discussion to summaries and grounded Q&A.

pub mod analyst;
pub mod api;
pub mod brain;
pub mod config;
pub mod coordinator;
pub mod custom_summary;
pub mod discussion_plan;
pub mod error;
pub mod focus_group;
pub mod framework;
pub mod heuristics;
pub mod memory;
pub mod organizer;
pub mod participant;
pub mod persona_generator;
pub mod qa;
pub mod reporter;
pub mod transcript;

pub use error::{FocusGroupError, GenerationError, Result};
