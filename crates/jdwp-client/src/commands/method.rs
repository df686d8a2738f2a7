//! The Method command set (6)

use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpDecoder};
use crate::commands::command;
use jdwp_types::{Boolean, Byte, Int, Long, MethodId, ReferenceTypeId};

command! {
    command_set: Method = 6;
    command: 1;
    /// Returns line number information for the method, if present
    #[derive(Debug)]
    pub struct LineTable {
        pub ref_type: ReferenceTypeId,
        pub method: MethodId,
    } -> {
        pub start: Long,
        pub end: Long,
        pub lines: Vec<LineTableEntry>,
    }
}

/// A mapping from a code index to a source line
#[derive(Debug, Clone, Copy)]
pub struct LineTableEntry {
    pub line_code_index: Long,
    pub line_number: Int,
}

impl JdwpDecodable for LineTableEntry {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            line_code_index: decoder.get()?,
            line_number: decoder.get()?,
        })
    }
}

command! {
    command_set: Method = 6;
    command: 2;
    /// Returns variable information for the method.
    ///
    /// On Dalvik this table routinely omits slots that hold live values; the frame loader does
    /// not trust it and probes slots directly instead.
    #[derive(Debug)]
    pub struct VariableTable {
        pub ref_type: ReferenceTypeId,
        pub method: MethodId,
    } -> {
        pub arg_cnt: Int,
        pub slots: Vec<VariableTableEntry>,
    }
}

/// A declared local variable and the slot it lives in
#[derive(Debug, Clone)]
pub struct VariableTableEntry {
    pub code_index: Long,
    pub name: String,
    pub signature: String,
    pub length: Int,
    pub slot: Int,
}

impl JdwpDecodable for VariableTableEntry {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            code_index: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            length: decoder.get()?,
            slot: decoder.get()?,
        })
    }
}

command! {
    command_set: Method = 6;
    command: 3;
    /// Retrieves the method's bytecodes as they appear in the VM
    #[derive(Debug)]
    pub struct Bytecodes {
        pub ref_type: ReferenceTypeId,
        pub method: MethodId,
    } -> {
        pub bytecodes: Vec<Byte>
    }
}

command! {
    command_set: Method = 6;
    command: 4;
    /// Whether the method has been made obsolete by a class redefinition
    #[derive(Debug)]
    pub struct IsObsolete {
        pub ref_type: ReferenceTypeId,
        pub method: MethodId,
    } -> {
        pub is_obsolete: Boolean
    }
}

command! {
    command_set: Method = 6;
    command: 5;
    /// Like [VariableTable], with generic signatures
    #[derive(Debug)]
    pub struct VariableTableWithGeneric {
        pub ref_type: ReferenceTypeId,
        pub method: MethodId,
    } -> {
        pub arg_cnt: Int,
        pub slots: Vec<GenericVariableTableEntry>,
    }
}

/// A declared local variable with its generic signature
#[derive(Debug, Clone)]
pub struct GenericVariableTableEntry {
    pub code_index: Long,
    pub name: String,
    pub signature: String,
    pub generic_signature: String,
    pub length: Int,
    pub slot: Int,
}

impl JdwpDecodable for GenericVariableTableEntry {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            code_index: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            generic_signature: decoder.get()?,
            length: decoder.get()?,
            slot: decoder.get()?,
        })
    }
}
