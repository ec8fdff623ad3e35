//! HTTP request handlers.

pub mod custom_id;
pub mod element_types;
pub mod health;
