//! Report generation: the delegate prompt digest, the deterministic
//! narrator, and answer rendering.

pub mod context;
pub mod narrator;
pub mod render;

pub use context::build_context;
pub use narrator::Narrator;
pub use render::{render_json, render_text};
