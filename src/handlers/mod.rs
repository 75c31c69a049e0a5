//! HTTP handlers, dispatched from [`crate::server`].

pub mod folder;
pub mod object;
