//! The StackFrame command set (16)

use crate::codec::{JdwpEncodable, JdwpEncoder};
use crate::commands::command;
use jdwp_types::{Byte, FrameId, Int, TaggedObjectId, ThreadId, Value};

/// One slot to fetch: its index and the signature byte the caller believes it holds.
///
/// The VM answers TYPE_MISMATCH when the signature byte is wrong for the slot, which the frame
/// loader exploits to probe Dalvik slots whose types the variable table does not admit to.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest {
    pub slot: Int,
    pub sigbyte: Byte,
}

impl JdwpEncodable for SlotRequest {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.slot);
        encoder.put(&self.sigbyte);
    }
}

command! {
    command_set: StackFrame = 16;
    command: 1;
    /// Returns the value of one or more local variable slots in a suspended frame
    #[derive(Debug)]
    pub struct GetValues {
        pub thread: ThreadId,
        pub frame: FrameId,
        pub slots: Vec<SlotRequest>,
    } -> {
        pub values: Vec<Value>
    }
}

/// One slot assignment: the index and the tagged value to store
#[derive(Debug, Clone)]
pub struct SlotAssignment {
    pub slot: Int,
    pub value: Value,
}

impl JdwpEncodable for SlotAssignment {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.slot);
        encoder.put(&self.value);
    }
}

command! {
    command_set: StackFrame = 16;
    command: 2;
    /// Assigns local variable slots in a suspended frame
    #[derive(Debug)]
    pub struct SetValues {
        pub thread: ThreadId,
        pub frame: FrameId,
        pub slots: Vec<SlotAssignment>,
    };
}

command! {
    command_set: StackFrame = 16;
    command: 3;
    /// Returns the `this` reference of the frame, or the null object for static and native
    /// methods
    #[derive(Debug)]
    pub struct ThisObject {
        pub thread: ThreadId,
        pub frame: FrameId,
    } -> {
        pub this_object: TaggedObjectId
    }
}

command! {
    command_set: StackFrame = 16;
    command: 4;
    /// Pops frames up to and including the given frame
    #[derive(Debug)]
    pub struct PopFrames {
        pub thread: ThreadId,
        pub frame: FrameId,
    };
}
