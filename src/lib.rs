//! link-groups library
//!
//! Group URLs, keep them in a local JSON store with a one-step backup, and
//! open a whole group in a chosen browser.

pub mod config;
pub mod error;
pub mod links;
pub mod notify;
pub mod opener;
pub mod urls;
