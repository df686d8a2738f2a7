//! The ArrayType command set (4)

use crate::commands::command;
use jdwp_types::{ArrayTypeId, Int, TaggedObjectId};

command! {
    command_set: ArrayType = 4;
    command: 1;
    /// Creates a new array of this type with the given length in the target VM
    #[derive(Debug)]
    pub struct NewInstance {
        pub array_type: ArrayTypeId,
        pub length: Int,
    } -> {
        pub new_array: TaggedObjectId
    }
}
