//! Threads, frames and slots.
//!
//! Frame and slot state is only meaningful while the VM is suspended for that thread; loading a
//! thread replaces whatever was cached, and anything resuming the VM leaves the old snapshot
//! behind as history.

use crate::debugger::DebuggerInner;
use crate::error::DebugError;
use jdwp_client::commands::{stack_frame, thread_reference};
use jdwp_client::events::{Composite, Event};
use jdwp_client::JdwpError;
use jdwp_types::{
    ErrorConstant, FrameId, Location, TaggedObjectId, ThreadId, Value,
};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace, warn};

/// The candidate signature bytes the slot prober walks, in order. Object references dominate
/// Dalvik frames, so `L` goes first; the tail kinds are rare but must still classify.
const SIGBYTE_CANDIDATES: [u8; 16] = [
    b'L', b'[', b's', b't', b'g', b'I', b'B', b'Z', b'S', b'J', b'C', b'D', b'F', b'l', b'c',
    b'V',
];

/// Slots probed per frame. The variable table cannot be trusted to enumerate live Dalvik slots,
/// so the loader just tries the first 16 registers.
const MAX_PROBED_SLOTS: i32 = 16;

/// One classified local variable slot
#[derive(Debug, Clone, Copy)]
pub struct SlotInfo {
    /// The slot (register) index
    pub slot: i32,
    /// The signature byte the VM accepted for this slot
    pub sigbyte: u8,
    /// The value read from the slot
    pub value: Value,
}

impl Display for SlotInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

/// One suspended stack frame, fully loaded: location, `this`, and the probed slots
#[derive(Debug)]
pub struct FrameInfo {
    thread_id: ThreadId,
    frame_id: FrameId,
    location: Location,
    this_object: Option<TaggedObjectId>,
    slots: BTreeMap<i32, SlotInfo>,
}

impl FrameInfo {
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The frame's `this`, absent for static and native methods
    pub fn this_object(&self) -> Option<TaggedObjectId> {
        self.this_object
    }

    /// The probed slots, by register index
    pub fn slots(&self) -> &BTreeMap<i32, SlotInfo> {
        &self.slots
    }

    pub fn slot(&self, index: i32) -> Option<&SlotInfo> {
        self.slots.get(&index)
    }
}

impl Display for FrameInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "FrameID: {}", self.frame_id.get())?;
        match self.this_object {
            Some(this) => writeln!(f, "ThisObj: {}", this.id().get())?,
            None => writeln!(f, "ThisObj: [none]")?,
        }
        writeln!(
            f,
            "Location: class {} method {} index {}",
            self.location.class.get(),
            self.location.method.get(),
            self.location.index
        )?;
        writeln!(f, "Slots:")?;
        for (index, slot) in &self.slots {
            writeln!(f, "  v{index}: {slot}")?;
        }
        Ok(())
    }
}

/// The breakpoint or step event a thread is currently paused on
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event: Event,
    pub composite: Arc<Composite>,
}

/// A thread known to the VM.
///
/// Created at startup and on THREAD_START, removed on THREAD_DEATH. Carries the frames loaded for
/// the current suspension and the event that caused it.
#[derive(Debug)]
pub struct ThreadInfo {
    thread_id: ThreadId,
    frames: Mutex<Arc<Vec<Arc<FrameInfo>>>>,
    event_context: Mutex<Option<EventContext>>,
}

impl ThreadInfo {
    pub(crate) fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            frames: Mutex::new(Arc::new(Vec::new())),
            event_context: Mutex::new(None),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// The frames loaded at the current suspension, innermost first
    pub fn frames(&self) -> Arc<Vec<Arc<FrameInfo>>> {
        self.frames.lock().expect("frame cache poisoned").clone()
    }

    pub fn frame(&self, index: usize) -> Result<Arc<FrameInfo>, DebugError> {
        self.frames()
            .get(index)
            .cloned()
            .ok_or(DebugError::NoSuchFrame {
                thread: self.thread_id.get(),
                index,
            })
    }

    /// Records the event this thread paused on
    pub fn set_event_context(&self, event: Event, composite: Arc<Composite>) {
        *self
            .event_context
            .lock()
            .expect("event context poisoned") = Some(EventContext { event, composite });
    }

    pub fn event_context(&self) -> Option<EventContext> {
        self.event_context
            .lock()
            .expect("event context poisoned")
            .clone()
    }

    /// Fetches the whole call stack and loads every frame. Only call while the VM is suspended
    /// for this thread.
    pub(crate) async fn load(&self, dbg: &DebuggerInner) -> Result<(), DebugError> {
        let reply = dbg
            .client()
            .send(thread_reference::Frames {
                thread: self.thread_id,
                start_frame: 0,
                length: -1,
            })
            .await?;

        let mut frames = Vec::with_capacity(reply.frames.len());
        for entry in reply.frames {
            frames.push(Arc::new(
                load_frame(dbg, self.thread_id, entry.frame_id, entry.location).await?,
            ));
        }
        *self.frames.lock().expect("frame cache poisoned") = Arc::new(frames);
        Ok(())
    }
}

async fn load_frame(
    dbg: &DebuggerInner,
    thread_id: ThreadId,
    frame_id: FrameId,
    location: Location,
) -> Result<FrameInfo, DebugError> {
    let this_object = match dbg
        .client()
        .send(stack_frame::ThisObject {
            thread: thread_id,
            frame: frame_id,
        })
        .await
    {
        Ok(reply) if !reply.this_object.is_null() => Some(reply.this_object),
        Ok(_) => None,
        Err(e @ JdwpError::Protocol { .. }) => {
            warn!("could not fetch `this` of frame {}: {e}", frame_id.get());
            None
        }
        Err(e) => return Err(e.into()),
    };

    let slots = probe_slots(dbg, thread_id, frame_id).await?;

    Ok(FrameInfo {
        thread_id,
        frame_id,
        location,
        this_object,
        slots,
    })
}

/// Brute-forces the frame's slots.
///
/// The published variable table omits slots that hold live values on Dalvik, so each register
/// index is asked for with every candidate signature byte until the VM stops answering
/// TYPE_MISMATCH. INVALID_SLOT means the register index is past the frame's register count and
/// short-circuits the remaining indices.
async fn probe_slots(
    dbg: &DebuggerInner,
    thread_id: ThreadId,
    frame_id: FrameId,
) -> Result<BTreeMap<i32, SlotInfo>, DebugError> {
    let mut slots = BTreeMap::new();
    'indices: for slot in 0..MAX_PROBED_SLOTS {
        let mut classified = false;
        for &sigbyte in SIGBYTE_CANDIDATES.iter() {
            let request = stack_frame::GetValues {
                thread: thread_id,
                frame: frame_id,
                slots: vec![stack_frame::SlotRequest { slot, sigbyte }],
            };
            match dbg.client().send(request).await {
                Ok(reply) => {
                    if let Some(value) = reply.values.into_iter().next() {
                        slots.insert(
                            slot,
                            SlotInfo {
                                slot,
                                sigbyte,
                                value,
                            },
                        );
                    }
                    classified = true;
                    break;
                }
                Err(e) if e.is_protocol(ErrorConstant::TypeMismatch) => continue,
                Err(e) if e.is_protocol(ErrorConstant::InvalidSlot) => {
                    trace!("slot v{slot} is past the frame's registers");
                    break 'indices;
                }
                Err(e @ JdwpError::Protocol { .. }) => {
                    warn!("could not fetch slot v{slot}: {e}");
                    classified = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        if !classified {
            debug!(
                "failed to guess type of slot v{slot} (frame {}), skipping it",
                frame_id.get()
            );
        }
    }
    Ok(slots)
}
