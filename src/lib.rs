//! Core entry point for the storybook_export crate.

pub mod elements;
pub mod export;
pub mod fetch;
pub mod fonts;
pub mod format;
pub mod model;
pub mod validate;

#[cfg(feature = "bookmarks")]
pub mod outline;
