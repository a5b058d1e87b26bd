//! Normalizes ~60 CI/CD, lint, test, application-log, infrastructure,
//! security, and cloud-audit transcript dialects into the single
//! `ValidationEvent` schema `model` defines. See `SPEC_FULL.md` for the
//! full module map; `dispatch::read_events` is the one entry point every
//! caller (the `devlog-harvest` binary included) goes through.

pub mod boundary;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod parser;
pub mod parsers;
pub mod registry;
pub mod severity;
pub mod workflow;
pub mod workflow_parsers;

pub use boundary::OutputRow;
pub use config::ReadOptions;
pub use dispatch::read_events;
pub use error::{HarvestError, Result};
pub use model::{
    SeverityLevel, ValidationEvent, ValidationEventStatus, ValidationEventType, WorkflowLogFormat,
};
pub use registry::Registries;
