//! The ClassType command set (3)

use crate::commands::command;
use jdwp_types::{ClassId, Int, MethodId, TaggedObjectId, ThreadId, Value};

command! {
    command_set: ClassType = 3;
    command: 1;
    /// Returns the immediate superclass of a class, or the null id if the class is
    /// java.lang.Object
    #[derive(Debug)]
    pub struct Superclass {
        pub class: ClassId,
    } -> {
        pub superclass: ClassId
    }
}

command! {
    command_set: ClassType = 3;
    command: 3;
    /// Invokes a static method in the suspended target VM
    #[derive(Debug)]
    pub struct InvokeMethod {
        pub class: ClassId,
        pub thread: ThreadId,
        pub method: MethodId,
        pub arguments: Vec<Value>,
        pub options: Int,
    } -> {
        pub return_value: Value,
        pub exception: TaggedObjectId,
    }
}

command! {
    command_set: ClassType = 3;
    command: 4;
    /// Creates a new object of this type, invoking the given constructor
    #[derive(Debug)]
    pub struct NewInstance {
        pub class: ClassId,
        pub thread: ThreadId,
        pub method: MethodId,
        pub arguments: Vec<Value>,
        pub options: Int,
    } -> {
        pub new_object: TaggedObjectId,
        pub exception: TaggedObjectId,
    }
}
