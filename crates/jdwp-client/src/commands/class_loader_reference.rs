//! The ClassLoaderReference command set (14)

use crate::commands::command;
use crate::commands::reference_type::TaggedTypeRef;
use jdwp_types::ClassLoaderId;

command! {
    command_set: ClassLoaderReference = 14;
    command: 1;
    /// Returns all reference types for which this class loader is the initiating loader
    #[derive(Debug)]
    pub struct VisibleClasses {
        pub class_loader: ClassLoaderId,
    } -> {
        pub classes: Vec<TaggedTypeRef>
    }
}
