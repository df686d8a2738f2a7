//! The ClassObjectReference command set (17)

use crate::commands::command;
use jdwp_types::{ClassObjectId, ReferenceTypeId, TypeTag};

command! {
    command_set: ClassObjectReference = 17;
    command: 1;
    /// Returns the reference type reflected by this class object
    #[derive(Debug)]
    pub struct ReflectedType {
        pub class_object: ClassObjectId,
    } -> {
        pub ref_type_tag: TypeTag,
        pub type_id: ReferenceTypeId,
    }
}
