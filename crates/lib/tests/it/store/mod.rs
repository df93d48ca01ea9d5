//! OptionStore integration tests
//!
//! Organized by concern: path resolution and tree queries, typed value
//! access, structural edits, and the multi-threaded wrapper.

mod resolve;
mod shared;
