//! # `dalvik-debug`
//!
//! The debugger half of the stack: keeps classes, threads and objects coherent with VM lifecycle
//! events, arms immediate and deferred breakpoints, steps, and resolves object graphs while the
//! VM is paused. Everything rides on [`jdwp_client`] for the wire and on [`dalvik_dex`] for
//! showing the bytecode around a paused location.
//!
//! The entry point is [Debugger::start], which attaches, suspends the VM, primes the caches and
//! leaves the VM suspended for the caller to resume:
//!
//! ```no_run
//! # async fn demo() -> Result<(), dalvik_debug::DebugError> {
//! use dalvik_debug::{BreakpointSpec, Debugger};
//!
//! let dbg = Debugger::start("127.0.0.1", 8700).await?;
//! let bp = dbg.create_breakpoint(BreakpointSpec {
//!     class_signature: "Lsh/kau/playground/quotes/QuotesRepo;".into(),
//!     method_name: "loadQuotes".into(),
//!     method_signature: "()Ljava/util/List;".into(),
//!     ..BreakpointSpec::default()
//! })?;
//! bp.arm().await?;
//! dbg.resume_vm().await?;
//! bp.wait().await;
//! # Ok(())
//! # }
//! ```

mod breakpoint;
mod class;
mod debugger;
mod error;
pub mod native;
mod object;
mod thread;

pub use breakpoint::{jvm_to_java, Breakpoint, BreakpointSpec};
pub use class::{ClassInfo, ClassMembers, FieldInfo, MethodInfo};
pub use debugger::{Debugger, LifecycleRequests};
pub use error::DebugError;
pub use object::{ObjectInfo, SubObjectInfo};
pub use thread::{EventContext, FrameInfo, SlotInfo, ThreadInfo};
