//! Service layer module.
//!
//! The ID generation engine (registry, specifier compiler, generators,
//! validator, renderer) and the service exposing it to collaborators.

pub mod custom_id;
pub mod generator;
pub mod registry;
pub mod renderer;
pub mod specifier;
pub mod validator;

pub use custom_id::CustomIdService;
pub use generator::{Clock, FixedClock, SystemClock};
pub use registry::{ElementDescriptor, catalog, describe, describe_name};
pub use renderer::{RenderMode, Renderer};
pub use specifier::{CompiledRule, RuleCache, compile};
