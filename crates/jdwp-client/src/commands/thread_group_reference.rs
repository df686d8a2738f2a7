//! The ThreadGroupReference command set (12)

use crate::commands::command;
use jdwp_types::{ThreadGroupId, ThreadId};

command! {
    command_set: ThreadGroupReference = 12;
    command: 1;
    /// Returns the thread group name
    #[derive(Debug)]
    pub struct Name {
        pub group: ThreadGroupId,
    } -> {
        pub group_name: String
    }
}

command! {
    command_set: ThreadGroupReference = 12;
    command: 2;
    /// Returns the parent thread group, or the null id for a top-level group
    #[derive(Debug)]
    pub struct Parent {
        pub group: ThreadGroupId,
    } -> {
        pub parent_group: ThreadGroupId
    }
}

command! {
    command_set: ThreadGroupReference = 12;
    command: 3;
    /// Returns the live threads and subgroups directly contained in this group
    #[derive(Debug)]
    pub struct Children {
        pub group: ThreadGroupId,
    } -> {
        pub child_threads: Vec<ThreadId>,
        pub child_groups: Vec<ThreadGroupId>,
    }
}
