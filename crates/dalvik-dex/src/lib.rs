//! Dalvik bytecode disassembly and DEX header parsing.
//!
//! The disassembler is a pure function over a byte stream: [disassemble] decodes the instruction
//! at a byte offset into its standard text form and returns the offset of the next instruction.
//! [Disassembler] walks a whole stream and stops at the first error or the first offset that
//! fails to advance, so feeding it garbage always terminates.
//!
//! Offsets are bytes; Dalvik itself measures instruction sizes in 16-bit code units, so every
//! instruction occupies an even number of bytes (2, 4, 6, 8 or 10) and JDWP location indices
//! multiply by two to become byte offsets here.

mod dis;
mod format;
mod header;
mod opcodes;

pub use dis::{disassemble, DisassembleError, Disassembler, Instruction};
pub use format::{Format, Operands};
pub use header::{DexHeader, DexHeaderError, DEX_HEADER_LEN};
pub use opcodes::opcode;
