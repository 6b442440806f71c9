//! Core types - pure abstractions shared across the codebase.

mod defines;
mod kind;
mod mode;
mod request;
mod state;

pub use defines::Defines;
pub use kind::AssetKind;
pub use mode::BuildMode;
pub use request::{ImportContext, ResourceRequest};
pub use state::{is_shutdown, setup_shutdown_handler};
