use crate::native::NativeError;
use dalvik_dex::{DexHeaderError, DisassembleError};
use jdwp_client::JdwpError;
use thiserror::Error;

/// Everything the debugger layer can fail with.
///
/// Wire and protocol failures come through [DebugError::Jdwp]; the rest are cache and lookup
/// errors of this layer. Event handlers never propagate these into the transport tasks, they log
/// and carry on.
#[derive(Debug, Error)]
pub enum DebugError {
    /// The underlying command failed
    #[error(transparent)]
    Jdwp(#[from] JdwpError),
    /// The class is not in the cache and the VM does not know it either
    #[error("class {0} is not known to the VM")]
    UnknownClass(String),
    /// A method lookup by (name, signature) came up empty
    #[error("no method {name}{signature} on {class_signature}")]
    MethodNotFound {
        class_signature: String,
        name: String,
        signature: String,
    },
    /// A field lookup came up empty
    #[error("no field {name} on {class_signature}")]
    FieldNotFound {
        class_signature: String,
        name: String,
    },
    /// The field exists but dereferencing it is known to crash the VM
    #[error("field {name} on {class_signature} is unsafe to dereference")]
    UnsafeField {
        class_signature: String,
        name: String,
    },
    /// A signature string was not in JNI `L.../...;` form
    #[error("{0:?} is not a JNI class signature")]
    BadSignature(String),
    /// A field that should hold a native pointer held something else
    #[error("field {name} on {class_signature} does not hold a native pointer")]
    NotAPointer {
        class_signature: String,
        name: String,
    },
    /// A value that had to be an object reference was not
    #[error("expected an object value, got tag {0:?}")]
    NotAnObject(jdwp_types::Tag),
    /// A frame index past the end of the loaded stack
    #[error("thread {thread} has no frame {index}")]
    NoSuchFrame { thread: u64, index: usize },
    /// The breakpoint's class/method/signature triple was incomplete
    #[error("breakpoints need a class signature, a method name and a method signature")]
    IncompleteBreakpoint,
    /// A native-only operation was attempted with no agent attached, or the agent failed
    #[error("native features unavailable")]
    NativeUnavailable,
    /// The native agent answered but the call failed
    #[error(transparent)]
    Native(#[from] NativeError),
    /// A fetched DEX header did not parse
    #[error(transparent)]
    DexHeader(#[from] DexHeaderError),
    /// Bytecode around the paused location did not decode
    #[error(transparent)]
    Disassemble(#[from] DisassembleError),
    /// The debugger behind a weak handle has been dropped
    #[error("debugger has shut down")]
    Gone,
}
