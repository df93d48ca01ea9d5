//! Persistence integration tests
//!
//! File round trips in both formats, format detection by extension, and
//! rejection of unreadable or malformed files.

mod files;
mod round_trip;
