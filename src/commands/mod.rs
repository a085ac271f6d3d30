//! Command implementations

pub mod groups;
pub mod links;
pub mod open;
pub mod utils;
