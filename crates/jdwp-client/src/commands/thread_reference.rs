//! The ThreadReference command set (11)

use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpDecoder};
use crate::commands::command;
use jdwp_types::{FrameId, Int, Location, ObjectId, TaggedObjectId, ThreadGroupId, ThreadId, Value};

command! {
    command_set: ThreadReference = 11;
    command: 1;
    /// Returns the thread name
    #[derive(Debug)]
    pub struct Name {
        pub thread: ThreadId,
    } -> {
        pub thread_name: String
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 2;
    /// Suspends this one thread
    #[derive(Debug)]
    pub struct Suspend {
        pub thread: ThreadId,
    };
}

command! {
    command_set: ThreadReference = 11;
    command: 3;
    /// Resumes this one thread
    #[derive(Debug)]
    pub struct Resume {
        pub thread: ThreadId,
    };
}

command! {
    command_set: ThreadReference = 11;
    command: 4;
    /// Returns the running and suspension status of the thread
    #[derive(Debug)]
    pub struct Status {
        pub thread: ThreadId,
    } -> {
        pub thread_status: Int,
        pub suspend_status: Int,
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 5;
    /// Returns the thread group this thread belongs to
    #[derive(Debug)]
    pub struct ThreadGroup {
        pub thread: ThreadId,
    } -> {
        pub group: ThreadGroupId
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 6;
    /// Returns the current call stack of a suspended thread.
    ///
    /// `start_frame` 0 and `length` -1 retrieve the whole stack, innermost frame first. Frame ids
    /// are only valid while the thread stays suspended.
    #[derive(Debug)]
    pub struct Frames {
        pub thread: ThreadId,
        pub start_frame: Int,
        pub length: Int,
    } -> {
        pub frames: Vec<FrameEntry>
    }
}

/// One stack frame: its id and where it is executing
#[derive(Debug, Clone, Copy)]
pub struct FrameEntry {
    pub frame_id: FrameId,
    pub location: Location,
}

impl JdwpDecodable for FrameEntry {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            frame_id: decoder.get()?,
            location: decoder.get()?,
        })
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 7;
    /// Returns the number of frames on the suspended thread's stack
    #[derive(Debug)]
    pub struct FrameCount {
        pub thread: ThreadId,
    } -> {
        pub frame_count: Int
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 8;
    /// Returns the monitors owned by the thread
    #[derive(Debug)]
    pub struct OwnedMonitors {
        pub thread: ThreadId,
    } -> {
        pub owned: Vec<TaggedObjectId>
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 9;
    /// Returns the monitor the thread is waiting to enter, if any
    #[derive(Debug)]
    pub struct CurrentContendedMonitor {
        pub thread: ThreadId,
    } -> {
        pub monitor: TaggedObjectId
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 10;
    /// Stops the thread with an asynchronously thrown exception
    #[derive(Debug)]
    pub struct Stop {
        pub thread: ThreadId,
        pub throwable: ObjectId,
    };
}

command! {
    command_set: ThreadReference = 11;
    command: 11;
    /// Interrupts the thread as if by java.lang.Thread.interrupt
    #[derive(Debug)]
    pub struct Interrupt {
        pub thread: ThreadId,
    };
}

command! {
    command_set: ThreadReference = 11;
    command: 12;
    /// Returns how many times the thread has been suspended without being resumed
    #[derive(Debug)]
    pub struct SuspendCount {
        pub thread: ThreadId,
    } -> {
        pub suspend_count: Int
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 13;
    /// Returns the monitors owned by the thread, with the stack depth each was acquired at
    #[derive(Debug)]
    pub struct OwnedMonitorsStackDepthInfo {
        pub thread: ThreadId,
    } -> {
        pub monitors: Vec<MonitorStackDepth>
    }
}

/// An owned monitor and the depth of the frame that acquired it
#[derive(Debug, Clone, Copy)]
pub struct MonitorStackDepth {
    pub monitor: TaggedObjectId,
    pub stack_depth: Int,
}

impl JdwpDecodable for MonitorStackDepth {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            monitor: decoder.get()?,
            stack_depth: decoder.get()?,
        })
    }
}

command! {
    command_set: ThreadReference = 11;
    command: 14;
    /// Forces the topmost frame of the thread to return early with the given value
    #[derive(Debug)]
    pub struct ForceEarlyReturn {
        pub thread: ThreadId,
        pub value: Value,
    };
}
