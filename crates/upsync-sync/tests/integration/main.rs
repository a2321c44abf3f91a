//! Integration tests for upsync-sync
//!
//! Runs the engine against an in-memory remote store and a real temporary
//! local directory, and checks the end state of both trees.

mod common;

mod test_guards;
mod test_merge;
