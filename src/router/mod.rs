//! # Router Module
//!
//! Path matching and route resolution. Each service owns one [`Trie`] that
//! maps (method, path) to the registered [`crate::route::Route`] and the path
//! parameter bindings.
//!
//! ## Pattern grammar
//!
//! Patterns are `/seg(/seg)*` where each segment is one of:
//!
//! - a literal (`users`), matched exactly;
//! - `:name`, a named parameter consuming one segment;
//! - `*name`, a catch-all consuming every remaining segment, bound as a
//!   single `/`-joined string; must be the final segment.
//!
//! ## Matching
//!
//! Lookup is a pre-order depth-first search with strict precedence at every
//! node: literal children first, then parameter children (binding the current
//! segment), then a catch-all. Backtracking across parameter choices is
//! permitted, so `users/:id/profile` still matches when a literal sibling of
//! `:id` fails deeper down; bindings collected on a failed branch are
//! discarded. A path that matches only under other methods reports the bound
//! method set instead of a plain miss.
//!
//! Registration and lookup are O(segments × fan-out); fan-out is small for
//! typical APIs, so a linear scan per node is sufficient.
//!
//! The trie is build-once read-many: it is populated while the engine is
//! assembled and only read, without locks, once the transport starts.

mod trie;
#[cfg(test)]
mod tests;

pub use trie::{Found, PathBindings, RouteConflict, Trie};
