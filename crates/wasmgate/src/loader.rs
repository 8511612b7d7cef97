//! Module loading and instantiation using wasmtime.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::host_imports::{self, HostImports, LogSink};

use std::path::Path;
use std::sync::Arc;

use wasmtime::*;

/// Host state for the store: the guest log sink and resource limits.
pub struct HostState {
    pub(crate) log: LogSink,
    pub(crate) limits: StoreLimits,
}

impl std::fmt::Debug for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostState")
            .field("log", &"<log sink>")
            .field("limits", &self.limits)
            .finish()
    }
}

/// Compiles guest module images and instantiates them with the bridge's
/// host imports wired in.
pub struct Loader {
    engine: Engine,
    config: BridgeConfig,
    log_sink: LogSink,
}

/// A compiled guest module.
#[derive(Debug)]
pub struct ModuleImage {
    module: Module,
    name: String,
}

/// An instantiated guest module ready for calls.
#[derive(Debug)]
pub struct ModuleInstance {
    pub(crate) store: Store<HostState>,
    pub(crate) instance: Instance,
}

impl Loader {
    /// Create a new loader with the given configuration.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let mut engine_config = Config::new();

        engine_config.cranelift_opt_level(match config.optimization_level {
            0 => OptLevel::None,
            _ => OptLevel::Speed,
        });

        // Enable fuel metering if configured
        if config.fuel_limit.is_some() {
            engine_config.consume_fuel(true);
        }

        // Configure caching if path provided
        if let Some(ref cache_path) = config.cache_path {
            if let Err(e) = engine_config.cache_config_load(cache_path) {
                tracing::warn!("Failed to load cache config: {}", e);
            }
        }

        let engine = Engine::new(&engine_config)
            .map_err(|e| BridgeError::Load(format!("engine creation failed: {}", e)))?;

        Ok(Self {
            engine,
            config,
            log_sink: host_imports::tracing_sink(),
        })
    }

    /// Replace the sink that `env::native_console_log` forwards to.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = sink;
        self
    }

    /// Compile a module image from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ModuleImage> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let module = Module::from_file(&self.engine, path)
            .map_err(|e| BridgeError::Load(format!("module load failed: {}", e)))?;

        Ok(ModuleImage { module, name })
    }

    /// Compile a module image from in-memory bytes.
    pub fn load_bytes(&self, name: &str, bytes: &[u8]) -> Result<ModuleImage> {
        let module = Module::new(&self.engine, bytes)
            .map_err(|e| BridgeError::Load(format!("module creation failed: {}", e)))?;

        Ok(ModuleImage {
            module,
            name: name.to_string(),
        })
    }

    /// Instantiate a compiled module, supplying the host import table.
    pub fn instantiate(&self, image: &ModuleImage) -> Result<ModuleInstance> {
        let limits = StoreLimitsBuilder::new()
            .memory_size(self.config.max_memory)
            .build();
        let state = HostState {
            log: Arc::clone(&self.log_sink),
            limits,
        };
        let mut store = Store::new(&self.engine, state);

        // Configure resource limits via the stored limiter
        store.limiter(|state| &mut state.limits);

        // Add fuel if configured
        if let Some(fuel) = self.config.fuel_limit {
            store
                .set_fuel(fuel)
                .map_err(|e| BridgeError::Instantiate(format!("fuel setup failed: {}", e)))?;
        }

        // Create linker and register the env namespace imports
        let mut linker: Linker<HostState> = Linker::new(&self.engine);
        HostImports::register(&mut linker)?;

        // Instantiate the module
        let instance = linker
            .instantiate(&mut store, &image.module)
            .map_err(|e| BridgeError::Instantiate(format!("instantiation failed: {}", e)))?;

        Ok(ModuleInstance { store, instance })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl ModuleImage {
    /// Get the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get exported function names.
    pub fn exports(&self) -> impl Iterator<Item = &str> {
        self.module.exports().filter_map(|e| {
            if matches!(e.ty(), ExternType::Func(_)) {
                Some(e.name())
            } else {
                None
            }
        })
    }
}

impl ModuleInstance {
    /// Write bytes to guest memory at the given offset.
    ///
    /// The current memory size is re-read here; the guest may have
    /// grown its memory since the last access.
    pub fn write_memory(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let memory = self.get_memory()?;
        let mem_data = memory.data_mut(&mut self.store);

        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= mem_data.len())
            .ok_or_else(|| {
                BridgeError::Bounds(format!(
                    "write of {} bytes at offset {} exceeds memory size {}",
                    data.len(),
                    offset,
                    mem_data.len()
                ))
            })?;

        mem_data[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Read bytes from guest memory at the given offset.
    pub fn read_memory(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let memory = self.get_memory()?;
        let mem_data = memory.data(&self.store);

        let end = offset
            .checked_add(len)
            .filter(|&end| end <= mem_data.len())
            .ok_or_else(|| {
                BridgeError::Bounds(format!(
                    "read of {} bytes at offset {} exceeds memory size {}",
                    len,
                    offset,
                    mem_data.len()
                ))
            })?;

        Ok(mem_data[offset..end].to_vec())
    }

    /// Get remaining fuel (if fuel metering enabled).
    pub fn remaining_fuel(&self) -> Option<u64> {
        self.store.get_fuel().ok()
    }

    /// Get the memory export.
    pub(crate) fn get_memory(&mut self) -> Result<Memory> {
        self.instance
            .get_memory(&mut self.store, "memory")
            .ok_or_else(|| BridgeError::MissingExport("memory".to_string()))
    }
}
