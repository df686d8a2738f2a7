//! The ObjectReference command set (9)

use crate::commands::command;
use jdwp_types::{
    Boolean, ClassId, FieldId, Int, MethodId, ObjectId, ReferenceTypeId, TaggedObjectId, ThreadId,
    TypeTag, Value,
};

command! {
    command_set: ObjectReference = 9;
    command: 1;
    /// Returns the runtime type (class or array) of an object
    #[derive(Debug)]
    pub struct ReferenceType {
        pub object: ObjectId,
    } -> {
        pub ref_type_tag: TypeTag,
        pub type_id: ReferenceTypeId,
    }
}

command! {
    command_set: ObjectReference = 9;
    command: 2;
    /// Returns the value of one or more instance fields.
    ///
    /// Fields of any class in the object's type hierarchy are accessible, so the cache walks the
    /// hierarchy one class at a time and asks for each class's declared fields.
    #[derive(Debug)]
    pub struct GetValues {
        pub object: ObjectId,
        pub fields: Vec<FieldId>,
    } -> {
        pub values: Vec<Value>
    }
}

command! {
    command_set: ObjectReference = 9;
    command: 5;
    /// Returns monitor information for the object
    #[derive(Debug)]
    pub struct MonitorInfo {
        pub object: ObjectId,
    } -> {
        pub owner: ThreadId,
        pub entry_count: Int,
        pub waiters: Vec<ThreadId>,
    }
}

command! {
    command_set: ObjectReference = 9;
    command: 6;
    /// Invokes an instance method on the object in the suspended target VM
    #[derive(Debug)]
    pub struct InvokeMethod {
        pub object: ObjectId,
        pub thread: ThreadId,
        pub class: ClassId,
        pub method: MethodId,
        pub arguments: Vec<Value>,
        pub options: Int,
    } -> {
        pub return_value: Value,
        pub exception: TaggedObjectId,
    }
}

command! {
    command_set: ObjectReference = 9;
    command: 7;
    /// Prevents garbage collection of the object
    #[derive(Debug)]
    pub struct DisableCollection {
        pub object: ObjectId,
    };
}

command! {
    command_set: ObjectReference = 9;
    command: 8;
    /// Permits garbage collection of the object again
    #[derive(Debug)]
    pub struct EnableCollection {
        pub object: ObjectId,
    };
}

command! {
    command_set: ObjectReference = 9;
    command: 9;
    /// Whether the object has been garbage collected
    #[derive(Debug)]
    pub struct IsCollected {
        pub object: ObjectId,
    } -> {
        pub is_collected: Boolean
    }
}

command! {
    command_set: ObjectReference = 9;
    command: 10;
    /// Returns objects that directly reference this object
    #[derive(Debug)]
    pub struct ReferringObjects {
        pub object: ObjectId,
        pub max_referrers: Int,
    } -> {
        pub referring_objects: Vec<TaggedObjectId>
    }
}
