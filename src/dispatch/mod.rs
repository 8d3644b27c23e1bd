//! Request dispatch pipeline.
//!
//! The orchestrator owns no state of its own; every shared map lives in an
//! injected component so each can be replaced with a fake in tests.

pub mod orchestrator;

pub use orchestrator::Dispatcher;
