//! # wasmgate
//!
//! JSON marshalling bridge between a Rust host and WebAssembly guest
//! modules running in linear memory.
//!
//! A guest module only understands raw pointers and lengths; the host
//! wants to call named exports with structured values. `wasmgate`
//! closes that gap with a fixed ABI:
//!
//! - the guest exports `allocate(size) -> ptr`, `free(ptr, size)`, a
//!   growable `memory`, and any number of compute exports with the
//!   shape `(ptr, len) -> result_ptr`;
//! - the host serializes a payload to UTF-8 JSON, copies it into guest
//!   memory, calls the export, and scans forward from the returned
//!   pointer for a zero byte to recover the response;
//! - the guest may call the `env::native_console_log(ptr, len)` import
//!   to emit log lines through the host's sink.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wasmgate::{BridgeConfig, Loader};
//!
//! let loader = Loader::new(BridgeConfig::default())?;
//! let image = loader.load_file("module.wasm")?;
//! let mut instance = loader.instantiate(&image)?;
//!
//! let reply: serde_json::Value =
//!     instance.invoke("do_something", &serde_json::json!({}))?;
//! ```
//!
//! ## Invariants
//!
//! - The input allocation is released exactly once on every exit path,
//!   including failures after `allocate` succeeded.
//! - Memory bounds are re-read at every access; the guest may grow its
//!   memory at any point during a call.
//! - At most one call is in flight per instance: [`ModuleInstance::invoke`]
//!   takes `&mut self`, so overlapping calls do not compile.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;

mod host_imports;
mod loader;
mod trampoline;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use host_imports::LogSink;
pub use loader::{Loader, ModuleImage, ModuleInstance};

#[cfg(test)]
mod tests;
