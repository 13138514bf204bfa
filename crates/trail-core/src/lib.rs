//! Trailblazer Core - grid, maze generation, and shared types
//!
//! This crate provides the road grid the agent walks on, the procedural
//! maze generator with its connectivity repair, and the configuration
//! structures shared by the learning crate and the CLI.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod error;
pub mod grid;
pub mod maze;
pub mod types;

pub use error::{Result, TrailError};
pub use grid::Grid;
pub use maze::{render_ascii, Maze, MazeGenerator};
pub use types::*;
