//! The introspection agent interface.
//!
//! JDWP cannot see VM-internal structures like ART's interpreter shadow frames or the raw
//! in-memory DEX an app was loaded from. A [NativeAgent] is an out-of-band channel (in practice
//! an RPC bridge into the target process) the debugger consults for exactly two things: the
//! fixed-size header of an in-memory DEX, and the virtual registers of a thread's current shadow
//! frame. Without an agent those operations report unavailable and everything JDWP-backed keeps
//! working.

use futures::future::BoxFuture;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// A native-side call failed
#[derive(Debug, Error)]
pub enum NativeError {
    /// The agent is not attached to the target process
    #[error("native agent not attached: {0}")]
    NotAttached(String),
    /// The agent answered with an error
    #[error("native agent call failed: {0}")]
    Rpc(String),
}

/// The raw bytes of an in-memory DEX header, as read from the target process
#[derive(Debug, Clone)]
pub struct DexHeaderDump {
    /// Address of the DEX data in the target process
    pub addr: u64,
    /// Size the VM records for the DEX data
    pub size: u32,
    /// The leading header bytes ([dalvik_dex::DEX_HEADER_LEN] of them)
    pub header: Vec<u8>,
}

/// One thread's interpreter shadow-frame registers
#[derive(Debug, Clone)]
pub struct VregDump {
    /// The dex program counter of the shadow frame
    pub dex_pc: u32,
    /// Raw register words, `v0..`
    pub raw: Vec<u32>,
    /// Reference-view register words, `v0..`
    pub refs: Vec<u32>,
}

impl VregDump {
    /// Number of virtual registers in the frame
    pub fn vreg_count(&self) -> usize {
        self.raw.len()
    }
}

impl Display for VregDump {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "dex_pc: {}", self.dex_pc)?;
        for (i, raw) in self.raw.iter().enumerate() {
            writeln!(f, "raw_v{i}: {raw:8x}")?;
        }
        for (i, reference) in self.refs.iter().enumerate() {
            writeln!(f, "ref_v{i}: {reference:8x}")?;
        }
        Ok(())
    }
}

/// An out-of-band channel into the target process.
///
/// Implementations live outside this crate (the scripting bridge that actually attaches to the
/// app); the debugger only needs these two reads.
pub trait NativeAgent: Send + Sync {
    /// Reads the DEX header of the in-memory DEX rooted at `addr` (the VM's `dexFile` pointer)
    fn fetch_dex_header(&self, addr: u64) -> BoxFuture<'_, Result<DexHeaderDump, NativeError>>;

    /// Dumps the virtual registers of the interpreter shadow frame of the thread whose
    /// `nativePeer` is `thread_peer`
    fn dump_vregs(&self, thread_peer: u64) -> BoxFuture<'_, Result<VregDump, NativeError>>;
}
