//! The execution engine: the component abstraction and its results.
//!
//! A [`component::WorkflowComponent`] filters or transforms molecules one at a
//! time; the engine runs it over a collection, optionally in parallel, and
//! gathers the retained and removed molecules in a [`result::ComponentResult`].
//! Progress is reported through a caller-supplied callback so that front ends
//! can render it without the engine knowing about terminals.

pub mod component;
pub mod components;
pub mod error;
pub mod progress;
pub mod result;
