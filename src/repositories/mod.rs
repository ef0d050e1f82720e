//! # Repository Layer
//!
//! Repositories encapsulating SeaORM operations that are shared between the
//! sync orchestrator and the bot lifecycle engine.

pub mod preference;

pub use preference::PreferenceRepository;
