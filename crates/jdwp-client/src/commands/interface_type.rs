//! The InterfaceType command set (5)

use crate::commands::command;
use jdwp_types::{Int, InterfaceId, MethodId, TaggedObjectId, ThreadId, Value};

command! {
    command_set: InterfaceType = 5;
    command: 1;
    /// Invokes a static method of an interface in the suspended target VM
    #[derive(Debug)]
    pub struct InvokeMethod {
        pub interface: InterfaceId,
        pub thread: ThreadId,
        pub method: MethodId,
        pub arguments: Vec<Value>,
        pub options: Int,
    } -> {
        pub return_value: Value,
        pub exception: TaggedObjectId,
    }
}
