//! Utility functions and helpers.
//!
//! This module provides common functionality used across commands:
//!
//! - [`time`] - Timestamp parsing, day index and time-of-day buckets
//! - [`reader`] - File reader with automatic decompression
//! - [`output`] - Atomic CSV publishing
//! - [`parallel`] - Fault-isolated parallel fan-out
//! - [`progress`] - Progress tracking and display utilities
//! - [`format`] - Number formatting for summaries
//!
//! # Examples
//!
//! ## Reading compressed files
//!
//! ```no_run
//! use insider_session_features::utils::reader::open_file;
//! use std::io::Read;
//!
//! // Automatically decompresses .gz and .zst files
//! let mut reader = open_file("week_12.csv.gz").unwrap();
//! let mut text = String::new();
//! reader.read_to_string(&mut text).unwrap();
//! ```

pub mod format;
pub mod output;
pub mod parallel;
pub mod progress;
pub mod reader;
pub mod time;
