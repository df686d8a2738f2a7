//! Decoding and textual rendering.
//!
//! Registers render in decimal (`v0`); branch targets, literals and pool indices render in hex
//! with the width their field mandates (`+001e`, `#+8000`, `type@1ede`).

use crate::format::{parse, Operands};
use crate::opcodes::opcode;
use thiserror::Error;

/// A decode failure; the stream position it names is a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisassembleError {
    /// The opcode byte is one of the unused gaps of the instruction set
    #[error("undefined opcode {opcode:#04x} at offset {offset}")]
    UndefinedOpcode { opcode: u8, offset: usize },
    /// The instruction's format wants more bytes than the stream holds
    #[error("instruction at offset {offset} runs past the end of the stream")]
    Truncated { offset: usize },
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset the instruction starts at
    pub offset: usize,
    /// The opcode byte
    pub opcode: u8,
    /// The rendered text form
    pub text: String,
}

/// Decodes the instruction at `offset`, returning its text form and the offset of the next
/// instruction
pub fn disassemble(data: &[u8], offset: usize) -> Result<(String, usize), DisassembleError> {
    if offset >= data.len() {
        return Err(DisassembleError::Truncated { offset });
    }
    let op = data[offset];
    let Some((mnemonic, format)) = opcode(op) else {
        return Err(DisassembleError::UndefinedOpcode {
            opcode: op,
            offset,
        });
    };
    let (operands, next) = parse(format, data, offset)?;
    Ok((render(op, mnemonic, &operands), next))
}

/// Walks an instruction stream from a byte offset.
///
/// Yields one [Instruction] at a time and fuses after the first error; together with every
/// format advancing the offset by its fixed size, this guarantees termination on any input.
#[derive(Debug, Clone)]
pub struct Disassembler<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Disassembler<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    pub fn with_offset(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            offset,
            failed: false,
        }
    }

    /// The byte offset of the next instruction to decode
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Disassembler<'a> {
    type Item = Result<Instruction, DisassembleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        let offset = self.offset;
        match disassemble(self.data, offset) {
            Ok((text, next)) => {
                if next <= offset {
                    // Stalled stream; treated as the end rather than looping forever.
                    self.failed = true;
                    return None;
                }
                self.offset = next;
                Some(Ok(Instruction {
                    offset,
                    opcode: self.data[offset],
                    text,
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn invoke_list(operands: &Operands) -> String {
    let regs = operands.invoke_registers();
    regs.iter()
        .map(|r| format!("v{r}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn range_list(aa: u8, cccc: u16) -> String {
    if aa == 0 {
        return "{}".to_string();
    }
    let last = cccc as u32 + aa as u32 - 1;
    format!("{{v{cccc} .. v{last}}}")
}

/// The pool a 21c/31c-style index points into, by opcode
fn pool_prefix(op: u8) -> &'static str {
    match op {
        0x1a | 0x1b => "string@",
        0x1c | 0x1f | 0x20 | 0x22 | 0x23 | 0x24 | 0x25 => "type@",
        0x52..=0x6d => "field@",
        0xfc | 0xfd => "call-site@",
        0xfe => "method_handle@",
        0xff => "proto@",
        _ => "meth@",
    }
}

fn render(op: u8, mnemonic: &str, operands: &Operands) -> String {
    match *operands {
        Operands::Empty => mnemonic.to_string(),
        Operands::RegPair { a, b } => match op {
            // const/4 packs its literal into the B nibble
            0x12 => format!("{mnemonic} v{a}, #+{b:x}"),
            _ => format!("{mnemonic} v{a}, v{b}"),
        },
        Operands::Reg { aa } => match op {
            // goto's operand is a branch target, not a register
            0x28 => format!("{mnemonic} +{aa:02x}"),
            _ => format!("{mnemonic} v{aa}"),
        },
        Operands::Wide16 { aaaa } => format!("{mnemonic} +{aaaa:04x}"),
        Operands::RegWide16 { aa, bbbb } => match op {
            0x38..=0x3d => format!("{mnemonic} v{aa}, +{bbbb:04x}"),
            0x13 | 0x16 => format!("{mnemonic} v{aa}, #+{bbbb:04x}"),
            0x15 => format!("{mnemonic} v{aa}, #+{bbbb:04x}0000"),
            0x19 => format!("{mnemonic} v{aa}, #+{bbbb:04x}000000000000"),
            0x02 | 0x05 | 0x08 => format!("{mnemonic} v{aa}, v{bbbb}"),
            _ => format!("{mnemonic} v{aa}, {}{bbbb:04x}", pool_prefix(op)),
        },
        Operands::RegTriple { aa, bb, cc } => match op {
            0xd8..=0xe2 => format!("{mnemonic} v{aa}, v{bb}, #+{cc:02x}"),
            _ => format!("{mnemonic} v{aa}, v{bb}, v{cc}"),
        },
        Operands::PairWide16 { a, b, cccc } => match op {
            0x32..=0x37 => format!("{mnemonic} v{a}, v{b}, +{cccc:04x}"),
            0xd0..=0xd7 => format!("{mnemonic} v{a}, v{b}, #+{cccc:04x}"),
            _ => format!("{mnemonic} v{a}, v{b}, {}{cccc:04x}", pool_prefix(op)),
        },
        Operands::Wide32 { aaaaaaaa } => format!("{mnemonic} +{aaaaaaaa:08x}"),
        Operands::Wide16Pair { aaaa, bbbb } => format!("{mnemonic} v{aaaa}, v{bbbb}"),
        Operands::RegWide32 { aa, bbbbbbbb } => match op {
            // branch-like targets: fill-array-data and the switches
            0x26 | 0x2b | 0x2c => format!("{mnemonic} v{aa}, +{bbbbbbbb:08x}"),
            0x1b => format!("{mnemonic} v{aa}, string@{bbbbbbbb:08x}"),
            _ => format!("{mnemonic} v{aa}, #+{bbbbbbbb:08x}"),
        },
        Operands::Invoke { bbbb, .. } => {
            let regs = invoke_list(operands);
            if regs.is_empty() {
                format!("{mnemonic} {}{bbbb:04x}", pool_prefix(op))
            } else {
                format!("{mnemonic} {regs}, {}{bbbb:04x}", pool_prefix(op))
            }
        }
        Operands::InvokeRange { aa, bbbb, cccc } => {
            format!(
                "{mnemonic} {}, {}{bbbb:04x}",
                range_list(aa, cccc),
                pool_prefix(op)
            )
        }
        Operands::InvokePoly { bbbb, hhhh, .. } => {
            let regs = invoke_list(operands);
            if regs.is_empty() {
                format!("{mnemonic} meth@{bbbb:04x}, proto@{hhhh:04x}")
            } else {
                format!("{mnemonic} {regs}, meth@{bbbb:04x}, proto@{hhhh:04x}")
            }
        }
        Operands::InvokePolyRange {
            aa,
            bbbb,
            cccc,
            hhhh,
        } => {
            format!(
                "{mnemonic} {}, meth@{bbbb:04x}, proto@{hhhh:04x}",
                range_list(aa, cccc)
            )
        }
        Operands::RegWide64 { aa, b } => format!("{mnemonic} v{aa}, #+{b:016x}"),
    }
}
