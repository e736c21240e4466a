//! Library wrapper around the `apicat` CLI implementation.
//!
//! Compiles the binary crate root (`main.rs`) as a module so
//! `cargo test -p apicat-cli --lib` typechecks the CLI without building the
//! integration suite.
//!
//! Note: `fn main()` inside `main.rs` is just another function when compiled as a module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
