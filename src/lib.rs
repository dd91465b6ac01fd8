//! gametome: tree-structured game guides, edited and read in the terminal.
//!
//! A guide is a forest of [`section::Section`]s addressed by positional
//! [`path::SectionPath`]s. The pure core ([`tree`], [`markers`], [`search`],
//! [`tree_view`]) never performs I/O; [`workflow`] and [`games`] sequence the
//! [`store`] and [`blob`] collaborators around it.
#![allow(clippy::multiple_crate_versions)]

pub mod app_state;
pub mod blob;
pub mod config;
pub mod error;
pub mod game;
pub mod games;
pub mod logging;
pub mod markers;
pub mod path;
pub mod search;
pub mod section;
pub mod store;
pub mod tree;
pub mod tree_view;
pub mod ui;
pub mod views;
pub mod workflow;

pub use error::Error;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
