//! Tiamat engine crate.
//!
//! GPU resource identity and ordered draw-call submission core. Applications
//! allocate vertex/uniform/texture/shader resources through [`engine::Engine`],
//! compose render passes referencing them by id, and let the runtime submit
//! passes in a stable order each frame through a pluggable [`backend`].

pub mod backend;
pub mod core;
pub mod engine;
pub mod id;
pub mod window;
pub mod time;

pub mod logging;
pub mod settings;
