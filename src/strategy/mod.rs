//! Evaluation Strategies
//!
//! Navigation itself is single-threaded. This module adds ways of running
//! several queries against one loaded document:
//! - Parallel: independent queries on per-thread forks (rayon)

pub mod parallel;

pub use parallel::{select_map, select_parallel, xmap};
