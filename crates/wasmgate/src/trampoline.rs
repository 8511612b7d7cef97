//! The marshal/invoke/unmarshal/release sequence.
//!
//! A call moves through encode, allocate, write, invoke, decode,
//! release. Once `allocate` has succeeded, the matching `free` runs on
//! every exit path, so a failed call does not leak guest memory.
//!
//! The response has no out-of-band length: the guest returns a pointer
//! to a buffer terminated by a single zero byte, and the host scans for
//! that terminator. The scan is bounded only by the current memory
//! size. A zero byte before the logical end of content is a contract
//! violation on the guest side; UTF-8 JSON never needs an interior NUL,
//! so well-formed responses are unaffected.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasmtime::TypedFunc;

use crate::error::{BridgeError, Result};
use crate::loader::ModuleInstance;

// Guest allocator export names fixed by the ABI.
const ALLOCATE: &str = "allocate";
const FREE: &str = "free";

impl ModuleInstance {
    /// Call the named export with `payload`, returning the decoded
    /// response.
    ///
    /// The payload travels as UTF-8 JSON through a guest-side buffer
    /// obtained from `allocate`; the response is read back from the
    /// zero-terminated buffer the export returns. The input buffer is
    /// handed back to `free` whether or not the call succeeded. The
    /// guest owns the result buffer; the bridge never frees it.
    ///
    /// On [`BridgeError::Bounds`] the instance should be discarded:
    /// its memory can no longer be trusted. Every other failure leaves
    /// the instance usable for subsequent calls.
    pub fn invoke<P, R>(&mut self, export: &str, payload: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let encoded = serde_json::to_vec(payload).map_err(BridgeError::Encoding)?;
        let len = i32::try_from(encoded.len()).map_err(|_| {
            BridgeError::Allocation(format!(
                "payload of {} bytes exceeds the guest address space",
                encoded.len()
            ))
        })?;

        let ptr = self.allocate(len)?;
        let outcome = self.dispatch(export, ptr, &encoded);

        // Unconditional release; an earlier failure takes precedence
        // over a release failure, which is logged rather than masking it.
        match (outcome, self.release(ptr, len)) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(call_err), Ok(())) => Err(call_err),
            (Err(call_err), Err(release_err)) => {
                tracing::error!("release failed after call error: {}", release_err);
                Err(call_err)
            }
        }
    }

    /// Request `size` bytes from the guest allocator.
    ///
    /// A returned pointer of 0 is the allocator's exhaustion sentinel.
    pub fn allocate(&mut self, size: i32) -> Result<i32> {
        let func = self
            .instance
            .get_func(&mut self.store, ALLOCATE)
            .ok_or_else(|| {
                BridgeError::Allocation(format!("module does not export '{}'", ALLOCATE))
            })?
            .typed::<i32, i32>(&self.store)
            .map_err(|e| {
                BridgeError::Allocation(format!(
                    "'{}' has an incompatible signature: {}",
                    ALLOCATE, e
                ))
            })?;

        let ptr = func
            .call(&mut self.store, size)
            .map_err(|e| BridgeError::Allocation(format!("'{}' trapped: {}", ALLOCATE, e)))?;

        if ptr == 0 {
            return Err(BridgeError::Allocation(format!(
                "allocator exhausted requesting {} bytes",
                size
            )));
        }
        Ok(ptr)
    }

    /// Hand a buffer previously obtained from [`Self::allocate`] back
    /// to the guest allocator.
    pub fn release(&mut self, ptr: i32, size: i32) -> Result<()> {
        let func = self
            .instance
            .get_func(&mut self.store, FREE)
            .ok_or_else(|| BridgeError::Release(format!("module does not export '{}'", FREE)))?
            .typed::<(i32, i32), ()>(&self.store)
            .map_err(|e| {
                BridgeError::Release(format!("'{}' has an incompatible signature: {}", FREE, e))
            })?;

        func.call(&mut self.store, (ptr, size))
            .map_err(|e| BridgeError::Release(format!("'{}' trapped: {}", FREE, e)))
    }

    /// Steps between allocation and release: write, call, decode.
    fn dispatch<R: DeserializeOwned>(
        &mut self,
        export: &str,
        ptr: i32,
        encoded: &[u8],
    ) -> Result<R> {
        self.write_memory(ptr as u32 as usize, encoded)?;

        let func = self.export_func(export)?;
        let result_ptr = func
            .call(&mut self.store, (ptr, encoded.len() as i32))
            .map_err(|e| BridgeError::Call(format!("'{}' trapped: {}", export, e)))?;

        let raw = self.read_terminated(result_ptr)?;
        let text = std::str::from_utf8(&raw)
            .map_err(|e| BridgeError::Decoding(format!("response is not UTF-8: {}", e)))?;
        serde_json::from_str(text)
            .map_err(|e| BridgeError::Decoding(format!("response is not valid JSON: {}", e)))
    }

    /// Resolve a compute export with the `(ptr, len) -> result_ptr` shape.
    fn export_func(&mut self, name: &str) -> Result<TypedFunc<(i32, i32), i32>> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| BridgeError::MissingExport(name.to_string()))?;

        func.typed::<(i32, i32), i32>(&self.store)
            .map_err(|e| BridgeError::ExportSignature {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Read the zero-terminated response starting at `ptr`.
    ///
    /// The scan is bounded by the current memory size, re-read here
    /// because the guest may have grown its memory during the call.
    fn read_terminated(&mut self, ptr: i32) -> Result<Vec<u8>> {
        let memory = self.get_memory()?;
        let data = memory.data(&self.store);

        let start = ptr as u32 as usize;
        if start >= data.len() {
            return Err(BridgeError::Bounds(format!(
                "result pointer {} outside memory of {} bytes",
                start,
                data.len()
            )));
        }

        match scan_terminator(&data[start..]) {
            Some(len) => Ok(data[start..start + len].to_vec()),
            None => Err(BridgeError::UnterminatedResult(start)),
        }
    }
}

/// Offset of the first zero byte in `data`, if any.
pub(crate) fn scan_terminator(data: &[u8]) -> Option<usize> {
    data.iter().position(|&b| b == 0)
}
