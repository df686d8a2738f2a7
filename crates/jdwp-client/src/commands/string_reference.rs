//! The StringReference command set (10)

use crate::commands::command;
use jdwp_types::ObjectId;

command! {
    command_set: StringReference = 10;
    command: 1;
    /// Returns the characters contained in the string
    #[derive(Debug)]
    pub struct Value {
        pub string_object: ObjectId,
    } -> {
        pub value: String
    }
}
