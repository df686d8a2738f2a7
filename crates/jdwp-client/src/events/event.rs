use crate::codec::{DecodeJdwpDataError, JdwpCodec, JdwpDecodable, JdwpDecoder};
use crate::raw::packet::RawCommandPacket;
use jdwp_types::{
    Boolean, ClassStatus, EventKind, FieldId, Location, Long, ReferenceTypeId, RequestId,
    SuspendPolicy, TaggedObjectId, ThreadId, TypeTag, Value,
};
use thiserror::Error;

/// One Event.Composite packet: a single suspend policy covering a batch of events.
///
/// Every event bundled in one composite shares the policy; the handler that ends up resuming the
/// VM is responsible for knowing it.
#[derive(Debug, Clone)]
pub struct Composite {
    pub suspend_policy: SuspendPolicy,
    pub events: Vec<Event>,
}

/// Events, as received from the VM
#[derive(Debug, Clone)]
pub enum Event {
    SingleStep {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
    },
    Breakpoint {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
    },
    FramePop,
    Exception {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
        exception: TaggedObjectId,
        catch_location: Location,
    },
    UserDefined,
    ThreadStart {
        request_id: RequestId,
        thread: ThreadId,
    },
    ThreadDeath {
        request_id: RequestId,
        thread: ThreadId,
    },
    ClassPrepare {
        request_id: RequestId,
        thread: ThreadId,
        ref_type_tag: TypeTag,
        type_id: ReferenceTypeId,
        signature: String,
        status: ClassStatus,
    },
    ClassUnload {
        request_id: RequestId,
        signature: String,
    },
    ClassLoad,
    FieldAccess {
        request_id: RequestId,
        thread: ThreadId,
        ref_type_tag: TypeTag,
        type_id: ReferenceTypeId,
        field_id: FieldId,
        object: TaggedObjectId,
        location: Location,
    },
    FieldModification {
        request_id: RequestId,
        thread: ThreadId,
        ref_type_tag: TypeTag,
        type_id: ReferenceTypeId,
        field_id: FieldId,
        object: TaggedObjectId,
        location: Location,
        value_to_be: Value,
    },
    ExceptionCatch,
    MethodEntry {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
    },
    MethodExit {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
    },
    MethodExitWithReturnValue {
        request_id: RequestId,
        thread: ThreadId,
        location: Location,
        value: Value,
    },
    MonitorContendedEnter {
        request_id: RequestId,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
    },
    MonitorContendedEntered {
        request_id: RequestId,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
    },
    MonitorWait {
        request_id: RequestId,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
        timeout: Long,
    },
    MonitorWaited {
        request_id: RequestId,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
        timed_out: Boolean,
    },
    VmStart {
        request_id: RequestId,
        thread: ThreadId,
    },
    VmDeath {
        request_id: RequestId,
    },
    /// Never sent across JDWP
    VmDisconnected,
}

impl Event {
    /// The id of the subscription that caused this event to be reported, when it has one.
    ///
    /// VM_START and VM_DEATH are auto-generated with request id 0; events without a request id
    /// at all (FRAME_POP and friends are never requested by this crate) return `None`.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::SingleStep { request_id, .. }
            | Event::Breakpoint { request_id, .. }
            | Event::Exception { request_id, .. }
            | Event::ThreadStart { request_id, .. }
            | Event::ThreadDeath { request_id, .. }
            | Event::ClassPrepare { request_id, .. }
            | Event::ClassUnload { request_id, .. }
            | Event::FieldAccess { request_id, .. }
            | Event::FieldModification { request_id, .. }
            | Event::MethodEntry { request_id, .. }
            | Event::MethodExit { request_id, .. }
            | Event::MethodExitWithReturnValue { request_id, .. }
            | Event::MonitorContendedEnter { request_id, .. }
            | Event::MonitorContendedEntered { request_id, .. }
            | Event::MonitorWait { request_id, .. }
            | Event::MonitorWaited { request_id, .. }
            | Event::VmStart { request_id, .. }
            | Event::VmDeath { request_id } => Some(*request_id),
            Event::FramePop
            | Event::UserDefined
            | Event::ClassLoad
            | Event::ExceptionCatch
            | Event::VmDisconnected => None,
        }
    }

    /// The thread the event occurred in, when the event kind carries one
    pub fn thread(&self) -> Option<ThreadId> {
        match self {
            Event::SingleStep { thread, .. }
            | Event::Breakpoint { thread, .. }
            | Event::Exception { thread, .. }
            | Event::ThreadStart { thread, .. }
            | Event::ThreadDeath { thread, .. }
            | Event::ClassPrepare { thread, .. }
            | Event::FieldAccess { thread, .. }
            | Event::FieldModification { thread, .. }
            | Event::MethodEntry { thread, .. }
            | Event::MethodExit { thread, .. }
            | Event::MethodExitWithReturnValue { thread, .. }
            | Event::MonitorContendedEnter { thread, .. }
            | Event::MonitorContendedEntered { thread, .. }
            | Event::MonitorWait { thread, .. }
            | Event::MonitorWaited { thread, .. }
            | Event::VmStart { thread, .. } => Some(*thread),
            _ => None,
        }
    }

    /// The location the event occurred at, when the event kind carries one
    pub fn location(&self) -> Option<Location> {
        match self {
            Event::SingleStep { location, .. }
            | Event::Breakpoint { location, .. }
            | Event::Exception { location, .. }
            | Event::FieldAccess { location, .. }
            | Event::FieldModification { location, .. }
            | Event::MethodEntry { location, .. }
            | Event::MethodExit { location, .. }
            | Event::MethodExitWithReturnValue { location, .. }
            | Event::MonitorContendedEnter { location, .. }
            | Event::MonitorContendedEntered { location, .. }
            | Event::MonitorWait { location, .. }
            | Event::MonitorWaited { location, .. } => Some(*location),
            _ => None,
        }
    }
}

/// Decodes a raw Event.Composite packet into a [Composite]
pub(crate) fn to_composite(
    command: RawCommandPacket,
    codec: &JdwpCodec,
) -> Result<Composite, DecodeCompositeError> {
    if !command.header().command().is_composite_event() {
        return Err(DecodeCompositeError::NotAnEvent {
            command_set: command.header().command().command_set(),
            command: command.header().command().command(),
        });
    }
    let mut decoder = JdwpDecoder::new(codec, command.data().clone());
    let suspend_policy = decoder.get::<SuspendPolicy>()?;
    let events = decoder.get::<Vec<Event>>()?;
    Ok(Composite {
        suspend_policy,
        events,
    })
}

/// An inbound command packet that could not be understood as an Event.Composite
#[derive(Debug, Error)]
pub enum DecodeCompositeError {
    /// The VM sent a command this client never expects
    #[error("unexpected command {command_set}/{command} from the VM")]
    NotAnEvent { command_set: u8, command: u8 },
    /// The packet was Event.Composite but its body did not decode
    #[error(transparent)]
    Decode(#[from] DecodeJdwpDataError),
}

impl JdwpDecodable for Event {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let event_kind = decoder.get::<EventKind>()?;
        let event: Event = match event_kind {
            EventKind::SingleStep => Event::SingleStep {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::Breakpoint => Event::Breakpoint {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::FramePop => Event::FramePop,
            EventKind::Exception => Event::Exception {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                exception: decoder.get()?,
                catch_location: decoder.get()?,
            },
            EventKind::UserDefined => Event::UserDefined,
            EventKind::ThreadStart => Event::ThreadStart {
                request_id: decoder.get()?,
                thread: decoder.get()?,
            },
            EventKind::ThreadDeath => Event::ThreadDeath {
                request_id: decoder.get()?,
                thread: decoder.get()?,
            },
            EventKind::ClassPrepare => Event::ClassPrepare {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                signature: decoder.get()?,
                status: decoder.get()?,
            },
            EventKind::ClassUnload => Event::ClassUnload {
                request_id: decoder.get()?,
                signature: decoder.get()?,
            },
            EventKind::ClassLoad => Event::ClassLoad,
            EventKind::FieldAccess => Event::FieldAccess {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                field_id: decoder.get()?,
                object: decoder.get()?,
            },
            EventKind::FieldModification => Event::FieldModification {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                field_id: decoder.get()?,
                object: decoder.get()?,
                value_to_be: decoder.get()?,
            },
            EventKind::ExceptionCatch => Event::ExceptionCatch,
            EventKind::MethodEntry => Event::MethodEntry {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::MethodExit => Event::MethodExit {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::MethodExitWithReturnValue => Event::MethodExitWithReturnValue {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                value: decoder.get()?,
            },
            EventKind::MonitorContendedEnter => Event::MonitorContendedEnter {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::MonitorContendedEntered => Event::MonitorContendedEntered {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::MonitorWait => Event::MonitorWait {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
                timeout: decoder.get()?,
            },
            EventKind::MonitorWaited => Event::MonitorWaited {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
                timed_out: decoder.get()?,
            },
            EventKind::VmStart => Event::VmStart {
                request_id: decoder.get()?,
                thread: decoder.get()?,
            },
            EventKind::VmDeath => Event::VmDeath {
                request_id: decoder.get()?,
            },
            EventKind::VmDisconnected => Event::VmDisconnected,
        };
        Ok(event)
    }
}
