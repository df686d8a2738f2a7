//! End-to-end disassembly over a real instruction stream captured from a paused ART interpreter.

use dalvik_dex::{disassemble, DisassembleError, Disassembler};

/// 364 bytes of a method body, dumped via `Method.Bytecodes` while broken inside it
const INTERPRETER_STREAM: &[u8] = &[
    0x20, 0x80, 0xde, 0x1e, 0x38, 0x00, 0x12, 0x00, 0x07, 0x80, 0x1f, 0x00, 0xde, 0x1e, 0x52,
    0x01, 0x7e, 0x36, 0x15, 0x02, 0x00, 0x80, 0xb5, 0x21, 0x38, 0x01, 0x08, 0x00, 0x52, 0x08,
    0x7e, 0x36, 0xb1, 0x28, 0x59, 0x08, 0x7e, 0x36, 0x28, 0x06, 0x22, 0x00, 0xde, 0x1e, 0x70,
    0x30, 0x02, 0xc8, 0x70, 0x08, 0x54, 0x08, 0x7f, 0x36, 0x71, 0x00, 0xb7, 0x8c, 0x00, 0x00,
    0x0c, 0x01, 0x52, 0x02, 0x7e, 0x36, 0x12, 0x23, 0x12, 0x14, 0x38, 0x02, 0x17, 0x00, 0x32,
    0x42, 0x11, 0x00, 0x33, 0x32, 0x07, 0x00, 0x71, 0x10, 0x3e, 0x75, 0x08, 0x00, 0x29, 0x00,
    0x78, 0x00, 0x22, 0x08, 0x1c, 0x13, 0x1a, 0x00, 0x87, 0x84, 0x70, 0x20, 0xdd, 0x6e, 0x08,
    0x00, 0x27, 0x08, 0x71, 0x10, 0x3e, 0x75, 0x08, 0x00, 0x28, 0x3d, 0x71, 0x10, 0x3e, 0x75,
    0x08, 0x00, 0x54, 0x78, 0x81, 0x36, 0x72, 0x10, 0x51, 0x74, 0x08, 0x00, 0x0c, 0x08, 0x1f,
    0x08, 0xd8, 0x1e, 0x6e, 0x10, 0xdf, 0xc7, 0x08, 0x00, 0x0c, 0x08, 0x22, 0x02, 0x65, 0x0f,
    0x70, 0x10, 0x82, 0x59, 0x02, 0x00, 0x1a, 0x05, 0xc4, 0xa4, 0x71, 0x20, 0xb4, 0x59, 0x52,
    0x00, 0x07, 0x25, 0x1f, 0x05, 0x25, 0x10, 0x62, 0x06, 0xbd, 0x1d, 0x6e, 0x10, 0xef, 0x5b,
    0x06, 0x00, 0x0c, 0x06, 0x71, 0x20, 0x59, 0x5e, 0x65, 0x00, 0x62, 0x05, 0xab, 0x1e, 0x6e,
    0x10, 0x68, 0x5e, 0x05, 0x00, 0x0c, 0x05, 0x6e, 0x20, 0x92, 0x59, 0x52, 0x00, 0x22, 0x05,
    0xa2, 0x0f, 0x70, 0x30, 0xff, 0x5a, 0x25, 0x08, 0x59, 0x04, 0x7e, 0x36, 0x6e, 0x20, 0x03,
    0x5b, 0x05, 0x00, 0x0c, 0x08, 0x33, 0x18, 0x03, 0x00, 0x28, 0x2e, 0x1f, 0x08, 0x96, 0x0f,
    0x6e, 0x10, 0xc1, 0x5a, 0x08, 0x00, 0x0c, 0x08, 0x1c, 0x02, 0xcf, 0x13, 0x71, 0x10, 0x69,
    0x92, 0x02, 0x00, 0x0c, 0x02, 0x1c, 0x04, 0xcf, 0x13, 0x62, 0x05, 0x46, 0x28, 0x1c, 0x06,
    0xdc, 0x1e, 0x71, 0x10, 0x80, 0x92, 0x06, 0x00, 0x0c, 0x06, 0x6e, 0x20, 0xc9, 0x96, 0x65,
    0x00, 0x0c, 0x05, 0x71, 0x20, 0x81, 0x92, 0x54, 0x00, 0x0c, 0x04, 0x28, 0x02, 0x12, 0x04,
    0x22, 0x05, 0xd1, 0x11, 0x70, 0x30, 0xc6, 0x68, 0x25, 0x04, 0x59, 0x03, 0x7e, 0x36, 0x6e,
    0x30, 0x7c, 0x4f, 0x58, 0x00, 0x0c, 0x08, 0x33, 0x18, 0x03, 0x00, 0x11, 0x01, 0x38, 0x08,
    0x0a, 0x00, 0x1f, 0x08, 0xcf, 0x13, 0x12, 0x00, 0x72, 0x20, 0x5f, 0x72, 0x08, 0x00, 0x0c,
    0x08, 0x11, 0x08, 0x22, 0x08, 0x2d, 0x13, 0x1a, 0x00, 0x79, 0xb6, 0x70, 0x20, 0x43, 0x6f,
    0x08, 0x00, 0x27, 0x08,
];

#[test]
fn test_interpreter_stream_prefix() {
    let expected = [
        "instance-of v0, v8, type@1ede",
        "if-eqz v0, +0012",
        "move-object v0, v8",
        "check-cast v0, type@1ede",
        "iget v1, v0, field@367e",
        "const/high16 v2, #+80000000",
        "and-int/2addr v1, v2",
        "if-eqz v1, +0008",
        "iget v8, v0, field@367e",
        "sub-int/2addr v8, v2",
        "iput v8, v0, field@367e",
        "goto +06",
        "new-instance v0, type@1ede",
        "invoke-direct v0, v7, v8, meth@c802",
        "iget-object v8, v0, field@367f",
        "invoke-static meth@8cb7",
        "move-result-object v1",
        "iget v2, v0, field@367e",
        "const/4 v3, #+2",
        "const/4 v4, #+1",
    ];
    let decoded: Vec<String> = Disassembler::new(INTERPRETER_STREAM)
        .take(expected.len())
        .map(|i| i.expect("stream prefix decodes").text)
        .collect();
    assert_eq!(decoded, expected);
}

#[test]
fn test_interpreter_stream_decodes_completely() {
    let mut count = 0;
    let mut dis = Disassembler::new(INTERPRETER_STREAM);
    for instruction in &mut dis {
        instruction.expect("whole stream decodes");
        count += 1;
    }
    assert_eq!(count, 93);
    assert_eq!(dis.offset(), INTERPRETER_STREAM.len());
}

#[test]
fn test_resume_at_code_unit_offset() {
    // A JDWP location index counts 16-bit code units; index 22 is the invoke-direct above.
    let (text, next) = disassemble(INTERPRETER_STREAM, 22 * 2).unwrap();
    assert_eq!(text, "invoke-direct v0, v7, v8, meth@c802");
    assert_eq!(next, 50);
}
