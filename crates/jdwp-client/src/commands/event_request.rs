//! The EventRequest command set (15)

use crate::codec::{JdwpEncodable, JdwpEncoder};
use crate::commands::command;
use jdwp_types::{
    EventKind, FieldId, Int, Location, ModifierKind, ObjectId, ReferenceTypeId, RequestId,
    StepDepth, StepSize, SuspendPolicy, ThreadId,
};

/// A constraint on when a requested event is reported.
///
/// Modifiers are applied in the order given; an event is reported only if it satisfies all of
/// them. Each variant encodes as its [ModifierKind] byte followed by the variant's payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// Report the event only on the `count`-th occurrence, then never again. A deferred
    /// breakpoint's CLASS_PREPARE uses `Count(1)`; a breakpoint that should skip k hits uses
    /// `Count(k + 1)`.
    Count(Int),
    /// Conditional on an expression id (reserved for future use)
    Conditional { expr_id: Int },
    /// Report only events in the given thread
    ThreadOnly(ThreadId),
    /// Report only events whose location is in the given reference type or its subtypes
    ClassOnly(ReferenceTypeId),
    /// Report only events for classes whose java-form name matches the pattern; exact match, or
    /// a leading/trailing `*`
    ClassMatch(String),
    /// Report only events for classes whose java-form name does not match the pattern
    ClassExclude(String),
    /// Report only events at the given location
    LocationOnly(Location),
    /// Restrict reported exceptions by type and by whether they are caught
    ExceptionOnly {
        exception: ReferenceTypeId,
        caught: bool,
        uncaught: bool,
    },
    /// Report only events touching the given field
    FieldOnly(ReferenceTypeId, FieldId),
    /// Restrict step events to the given thread, granularity, and call-stack relation
    Step(ThreadId, StepSize, StepDepth),
    /// Report only events whose `this` is the given object
    InstanceOnly(ObjectId),
    /// Restrict class prepare events by source name pattern
    SourceNameMatch(String),
    /// Report only events on platform (non-virtual) threads
    PlatformThreadsOnly(bool),
}

impl Modifier {
    /// The discriminator byte this modifier encodes under
    pub fn kind(&self) -> ModifierKind {
        match self {
            Modifier::Count(_) => ModifierKind::Count,
            Modifier::Conditional { .. } => ModifierKind::Conditional,
            Modifier::ThreadOnly(_) => ModifierKind::ThreadOnly,
            Modifier::ClassOnly(_) => ModifierKind::ClassOnly,
            Modifier::ClassMatch(_) => ModifierKind::ClassMatch,
            Modifier::ClassExclude(_) => ModifierKind::ClassExclude,
            Modifier::LocationOnly(_) => ModifierKind::LocationOnly,
            Modifier::ExceptionOnly { .. } => ModifierKind::ExceptionOnly,
            Modifier::FieldOnly(..) => ModifierKind::FieldOnly,
            Modifier::Step(..) => ModifierKind::Step,
            Modifier::InstanceOnly(_) => ModifierKind::InstanceOnly,
            Modifier::SourceNameMatch(_) => ModifierKind::SourceNameMatch,
            Modifier::PlatformThreadsOnly(_) => ModifierKind::PlatformThreadsOnly,
        }
    }
}

impl JdwpEncodable for Modifier {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.kind());
        match self {
            Modifier::Count(count) => encoder.put(count),
            Modifier::Conditional { expr_id } => encoder.put(expr_id),
            Modifier::ThreadOnly(thread) => encoder.put(thread),
            Modifier::ClassOnly(class) => encoder.put(class),
            Modifier::ClassMatch(pattern) => encoder.put(pattern),
            Modifier::ClassExclude(pattern) => encoder.put(pattern),
            Modifier::LocationOnly(location) => encoder.put(location),
            Modifier::ExceptionOnly {
                exception,
                caught,
                uncaught,
            } => {
                encoder.put(exception);
                encoder.put(caught);
                encoder.put(uncaught);
            }
            Modifier::FieldOnly(declaring, field) => {
                encoder.put(declaring);
                encoder.put(field);
            }
            Modifier::Step(thread, size, depth) => {
                encoder.put(thread);
                // size and depth go over the wire as ints, not bytes
                encoder.put(&(u8::from(*size) as Int));
                encoder.put(&(u8::from(*depth) as Int));
            }
            Modifier::InstanceOnly(object) => encoder.put(object),
            Modifier::SourceNameMatch(pattern) => encoder.put(pattern),
            Modifier::PlatformThreadsOnly(only) => encoder.put(only),
        }
    }
}

command! {
    command_set: EventRequest = 15;
    command: 1;
    /// Sets an event request. When the described event occurs a composite event carrying the
    /// returned request id is sent from the target VM.
    #[derive(Debug)]
    pub struct Set {
        pub event_kind: EventKind,
        pub suspend_policy: SuspendPolicy,
        pub modifiers: Vec<Modifier>,
    } -> {
        pub request_id: RequestId
    }
}

command! {
    command_set: EventRequest = 15;
    command: 2;
    /// Clears an event request. Only the request matching both the event kind and the request id
    /// is cleared; clearing an absent request is a no-op.
    #[derive(Debug)]
    pub struct Clear {
        pub event_kind: EventKind,
        pub request_id: RequestId,
    };
}

command! {
    command_set: EventRequest = 15;
    command: 3;
    /// Removes all set breakpoints
    #[derive(Debug)]
    pub struct ClearAllBreakpoints;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JdwpCodec, JdwpEncoder};
    use jdwp_types::{ClassId, MethodId, TypeTag};

    #[test]
    fn test_location_only_modifier_layout() {
        let codec = JdwpCodec::default();
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&Modifier::LocationOnly(Location {
            tag: TypeTag::Class,
            class: ClassId::new(2),
            method: MethodId::new(3),
            index: 4,
        }));
        let data = encoder.data.freeze();
        // kind byte + tag byte + three 8-byte ids/index
        assert_eq!(data.len(), 1 + 1 + 8 * 3);
        assert_eq!(data[0], u8::from(ModifierKind::LocationOnly));
        assert_eq!(data[1], u8::from(TypeTag::Class));
    }

    #[test]
    fn test_step_modifier_encodes_ints() {
        let codec = JdwpCodec::default();
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&Modifier::Step(
            ThreadId::new(9),
            StepSize::Min,
            StepDepth::Over,
        ));
        let data = encoder.data.freeze();
        // kind byte + 8-byte thread + two 4-byte ints
        assert_eq!(data.len(), 1 + 8 + 4 + 4);
        assert_eq!(data[data.len() - 1], 1, "depth Over is 1");
        assert_eq!(data[data.len() - 5], 0, "size Min is 0");
    }
}
