//! The opcode table: every defined opcode's mnemonic and format.
//!
//! The regular families (unary ops, binops, the 2addr and literal variants) are grouped mnemonic
//! tables indexed by distance from the family base, mirroring how the instruction set itself is
//! laid out.

use crate::format::Format;

/// Mnemonics for 0x7b..=0x8f, format 12x
pub(crate) const UNARY_OPS: [&str; 21] = [
    "neg-int",
    "not-int",
    "neg-long",
    "not-long",
    "neg-float",
    "neg-double",
    "int-to-long",
    "int-to-float",
    "int-to-double",
    "long-to-int",
    "long-to-float",
    "long-to-double",
    "float-to-int",
    "float-to-long",
    "float-to-double",
    "double-to-int",
    "double-to-long",
    "double-to-float",
    "int-to-byte",
    "int-to-char",
    "int-to-short",
];

/// Mnemonics for 0x90..=0xaf, format 23x
pub(crate) const BINARY_OPS: [&str; 32] = [
    "add-int",
    "sub-int",
    "mul-int",
    "div-int",
    "rem-int",
    "and-int",
    "or-int",
    "xor-int",
    "shl-int",
    "shr-int",
    "ushr-int",
    "add-long",
    "sub-long",
    "mul-long",
    "div-long",
    "rem-long",
    "and-long",
    "or-long",
    "xor-long",
    "shl-long",
    "shr-long",
    "ushr-long",
    "add-float",
    "sub-float",
    "mul-float",
    "div-float",
    "rem-float",
    "add-double",
    "sub-double",
    "mul-double",
    "div-double",
    "rem-double",
];

/// Mnemonics for 0xb0..=0xcf, format 12x
pub(crate) const BINARY_2ADDR_OPS: [&str; 32] = [
    "add-int/2addr",
    "sub-int/2addr",
    "mul-int/2addr",
    "div-int/2addr",
    "rem-int/2addr",
    "and-int/2addr",
    "or-int/2addr",
    "xor-int/2addr",
    "shl-int/2addr",
    "shr-int/2addr",
    "ushr-int/2addr",
    "add-long/2addr",
    "sub-long/2addr",
    "mul-long/2addr",
    "div-long/2addr",
    "rem-long/2addr",
    "and-long/2addr",
    "or-long/2addr",
    "xor-long/2addr",
    "shl-long/2addr",
    "shr-long/2addr",
    "ushr-long/2addr",
    "add-float/2addr",
    "sub-float/2addr",
    "mul-float/2addr",
    "div-float/2addr",
    "rem-float/2addr",
    "add-double/2addr",
    "sub-double/2addr",
    "mul-double/2addr",
    "div-double/2addr",
    "rem-double/2addr",
];

/// Mnemonics for 0xd0..=0xd7, format 22s
pub(crate) const LIT16_OPS: [&str; 8] = [
    "add-int/lit16",
    "rsub-int/lit16",
    "mul-int/lit16",
    "div-int/lit16",
    "rem-int/lit16",
    "and-int/lit16",
    "or-int/lit16",
    "xor-int/lit16",
];

/// Mnemonics for 0xd8..=0xe2, format 22b
pub(crate) const LIT8_OPS: [&str; 11] = [
    "add-int/lit8",
    "rsub-int/lit8",
    "mul-int/lit8",
    "div-int/lit8",
    "rem-int/lit8",
    "and-int/lit8",
    "or-int/lit8",
    "xor-int/lit8",
    "shl-int/lit8",
    "shr-int/lit8",
    "ushr-int/lit8",
];

/// Looks up a defined opcode's mnemonic and format; `None` marks the unused gaps of the
/// instruction set (0x3e-0x43, 0x73, 0x79-0x7a, 0xe3-0xf9)
pub const fn opcode(op: u8) -> Option<(&'static str, Format)> {
    use Format::*;
    let entry = match op {
        0x00 => ("nop", F10x),
        0x01 => ("move", F12x),
        0x02 => ("move/from16", F22x),
        0x03 => ("move/16", F32x),
        0x04 => ("move-wide", F12x),
        0x05 => ("move-wide/from16", F22x),
        0x06 => ("move-wide/16", F32x),
        0x07 => ("move-object", F12x),
        0x08 => ("move-object/from16", F22x),
        0x09 => ("move-object/16", F32x),
        0x0a => ("move-result", F11x),
        0x0b => ("move-result-wide", F11x),
        0x0c => ("move-result-object", F11x),
        0x0d => ("move-exception", F11x),
        0x0e => ("return-void", F10x),
        0x0f => ("return", F11x),
        0x10 => ("return-wide", F11x),
        0x11 => ("return-object", F11x),
        0x12 => ("const/4", F11n),
        0x13 => ("const/16", F21s),
        0x14 => ("const", F31i),
        0x15 => ("const/high16", F21h),
        0x16 => ("const-wide/16", F21s),
        0x17 => ("const-wide/32", F31i),
        0x18 => ("const-wide", F51l),
        0x19 => ("const-wide/high16", F21h),
        0x1a => ("const-string", F21c),
        0x1b => ("const-string/jumbo", F31c),
        0x1c => ("const-class", F21c),
        0x1d => ("monitor-enter", F11x),
        0x1e => ("monitor-exit", F11x),
        0x1f => ("check-cast", F21c),
        0x20 => ("instance-of", F22c),
        0x21 => ("array-length", F12x),
        0x22 => ("new-instance", F21c),
        0x23 => ("new-array", F22c),
        0x24 => ("filled-new-array", F35c),
        0x25 => ("filled-new-array/range", F3rc),
        0x26 => ("fill-array-data", F31t),
        0x27 => ("throw", F11x),
        0x28 => ("goto", F10t),
        0x29 => ("goto/16", F20t),
        0x2a => ("goto/32", F30t),
        0x2b => ("packed-switch", F31t),
        0x2c => ("sparse-switch", F31t),
        0x2d => ("cmpl-float", F23x),
        0x2e => ("cmpg-float", F23x),
        0x2f => ("cmpl-double", F23x),
        0x30 => ("cmpg-double", F23x),
        0x31 => ("cmp-long", F23x),
        0x32 => ("if-eq", F22t),
        0x33 => ("if-ne", F22t),
        0x34 => ("if-lt", F22t),
        0x35 => ("if-ge", F22t),
        0x36 => ("if-gt", F22t),
        0x37 => ("if-le", F22t),
        0x38 => ("if-eqz", F21t),
        0x39 => ("if-nez", F21t),
        0x3a => ("if-ltz", F21t),
        0x3b => ("if-gez", F21t),
        0x3c => ("if-gtz", F21t),
        0x3d => ("if-lez", F21t),
        0x44 => ("aget", F23x),
        0x45 => ("aget-wide", F23x),
        0x46 => ("aget-object", F23x),
        0x47 => ("aget-boolean", F23x),
        0x48 => ("aget-byte", F23x),
        0x49 => ("aget-char", F23x),
        0x4a => ("aget-short", F23x),
        0x4b => ("aput", F23x),
        0x4c => ("aput-wide", F23x),
        0x4d => ("aput-object", F23x),
        0x4e => ("aput-boolean", F23x),
        0x4f => ("aput-byte", F23x),
        0x50 => ("aput-char", F23x),
        0x51 => ("aput-short", F23x),
        0x52 => ("iget", F22c),
        0x53 => ("iget-wide", F22c),
        0x54 => ("iget-object", F22c),
        0x55 => ("iget-boolean", F22c),
        0x56 => ("iget-byte", F22c),
        0x57 => ("iget-char", F22c),
        0x58 => ("iget-short", F22c),
        0x59 => ("iput", F22c),
        0x5a => ("iput-wide", F22c),
        0x5b => ("iput-object", F22c),
        0x5c => ("iput-boolean", F22c),
        0x5d => ("iput-byte", F22c),
        0x5e => ("iput-char", F22c),
        0x5f => ("iput-short", F22c),
        0x60 => ("sget", F21c),
        0x61 => ("sget-wide", F21c),
        0x62 => ("sget-object", F21c),
        0x63 => ("sget-boolean", F21c),
        0x64 => ("sget-byte", F21c),
        0x65 => ("sget-char", F21c),
        0x66 => ("sget-short", F21c),
        0x67 => ("sput", F21c),
        0x68 => ("sput-wide", F21c),
        0x69 => ("sput-object", F21c),
        0x6a => ("sput-boolean", F21c),
        0x6b => ("sput-byte", F21c),
        0x6c => ("sput-char", F21c),
        0x6d => ("sput-short", F21c),
        0x6e => ("invoke-virtual", F35c),
        0x6f => ("invoke-super", F35c),
        0x70 => ("invoke-direct", F35c),
        0x71 => ("invoke-static", F35c),
        0x72 => ("invoke-interface", F35c),
        0x74 => ("invoke-virtual/range", F3rc),
        0x75 => ("invoke-super/range", F3rc),
        0x76 => ("invoke-direct/range", F3rc),
        0x77 => ("invoke-static/range", F3rc),
        0x78 => ("invoke-interface/range", F3rc),
        0x7b..=0x8f => (UNARY_OPS[(op - 0x7b) as usize], F12x),
        0x90..=0xaf => (BINARY_OPS[(op - 0x90) as usize], F23x),
        0xb0..=0xcf => (BINARY_2ADDR_OPS[(op - 0xb0) as usize], F12x),
        0xd0..=0xd7 => (LIT16_OPS[(op - 0xd0) as usize], F22s),
        0xd8..=0xe2 => (LIT8_OPS[(op - 0xd8) as usize], F22b),
        0xfa => ("invoke-polymorphic", F45cc),
        0xfb => ("invoke-polymorphic/range", F4rcc),
        0xfc => ("invoke-custom", F35c),
        0xfd => ("invoke-custom/range", F3rc),
        0xfe => ("const-method-handle", F21c),
        0xff => ("const-method-type", F21c),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_are_undefined() {
        for op in [0x3e, 0x43, 0x73, 0x79, 0x7a, 0xe3, 0xf9] {
            assert!(opcode(op).is_none(), "{op:#04x} must be undefined");
        }
    }

    #[test]
    fn test_families_are_fully_defined() {
        for op in 0x7b..=0xe2u8 {
            assert!(opcode(op).is_some(), "{op:#04x} must be defined");
        }
    }
}
