//! Host functions importable by guest modules.
//!
//! Guests get exactly one import, `env::native_console_log(ptr, len)`:
//! the host reads `len` bytes starting at `ptr` from the calling
//! instance's memory and hands the decoded text to the configured
//! [`LogSink`].
//!
//! The memory referenced here does not exist until instantiation has
//! finished, so the callback cannot capture it up front. It is resolved
//! late, through [`wasmtime::Caller`], on every call. A guest that
//! calls the import while its memory export is unreachable traps
//! instead of silently misreading.

use std::sync::Arc;

use wasmtime::{Caller, Linker, Memory};

use crate::error::{BridgeError, Result};
use crate::loader::HostState;

/// Sink that receives decoded guest log lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Default sink: forward guest lines to `tracing`.
pub(crate) fn tracing_sink() -> LogSink {
    Arc::new(|line: &str| tracing::info!(target: "wasmgate::guest", "{}", line))
}

/// Host imports exposed to guest modules under the `env` namespace.
pub struct HostImports;

impl HostImports {
    /// Register all host imports with the wasmtime linker.
    pub fn register(linker: &mut Linker<HostState>) -> Result<()> {
        Self::register_console_log(linker)?;
        Ok(())
    }

    fn register_console_log(linker: &mut Linker<HostState>) -> Result<()> {
        linker
            .func_wrap(
                "env",
                "native_console_log",
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                    let memory = get_memory(&mut caller)?;
                    let data = memory.data(&caller);

                    let start = ptr as u32 as usize;
                    let end = start
                        .checked_add(len as u32 as usize)
                        .filter(|&end| end <= data.len())
                        .ok_or_else(|| {
                            BridgeError::Bounds(format!(
                                "log range at offset {} of {} bytes exceeds memory size {}",
                                start,
                                len,
                                data.len()
                            ))
                        })?;

                    let line = String::from_utf8_lossy(&data[start..end]).into_owned();
                    (caller.data().log)(&line);

                    Ok(())
                },
            )
            .map_err(|e| {
                BridgeError::Instantiate(format!(
                    "failed to register native_console_log: {}",
                    e
                ))
            })?;
        Ok(())
    }
}

/// Get the memory export from the caller.
fn get_memory(caller: &mut Caller<'_, HostState>) -> Result<Memory> {
    caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or_else(|| BridgeError::MissingExport("memory".to_string()))
}
