//! Integration test modules.

#[path = "../common/mod.rs"]
mod common;

mod batch_import_test;
mod cross_format_test;
