//! The ArrayReference command set (13)

use crate::codec::ArrayRegion;
use crate::commands::command;
use jdwp_types::{ArrayId, Int};

command! {
    command_set: ArrayReference = 13;
    command: 1;
    /// Returns the number of components in the array
    #[derive(Debug)]
    pub struct Length {
        pub array: ArrayId,
    } -> {
        pub array_length: Int
    }
}

command! {
    command_set: ArrayReference = 13;
    command: 2;
    /// Returns a range of array components
    #[derive(Debug)]
    pub struct GetValues {
        pub array: ArrayId,
        pub first_index: Int,
        pub length: Int,
    } -> {
        pub values: ArrayRegion
    }
}
