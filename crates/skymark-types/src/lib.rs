//! Shared types for the Skymark study-abroad advisor.

mod chat;
mod fine_tune;

pub use chat::*;
pub use fine_tune::*;
