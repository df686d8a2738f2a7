//! Shared scaffolding: a scripted world the mock VM answers startup (and beyond) from.
#![allow(dead_code)]

use bytes::{Buf, Bytes};
use dalvik_debug::Debugger;
use jdwp_client::codec::{JdwpCodec, JdwpDecoder};
use jdwp_client::raw::packet::CommandData;
use jdwp_mock::replies::{ClassEntry, FieldEntry, MethodEntry};
use jdwp_mock::{replies, MockAnswer, MockCtx, MockVm};
use jdwp_types::{
    EventKind, Location, ReferenceTypeId, SuspendPolicy, ThreadId,
};
use std::collections::HashMap;
use std::time::Duration;

/// One scripted class: identity plus what Methods/Fields/Superclass should answer
#[derive(Debug, Clone, Default)]
pub struct WorldClass {
    pub signature: String,
    pub methods: Vec<MethodEntry>,
    pub fields: Vec<FieldEntry>,
    /// typeID of the superclass, 0 for none
    pub super_id: u64,
    /// whether the bulk startup listing includes this class
    pub listed: bool,
}

/// The classes and threads a [MockVm] should know about
#[derive(Debug, Clone, Default)]
pub struct World {
    pub classes: HashMap<u64, WorldClass>,
    pub threads: Vec<ThreadId>,
}

impl World {
    pub fn handler(
        self,
    ) -> impl Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync + 'static {
        move |data, body, ctx| self.answer(data, body, ctx)
    }

    fn listed_classes(&self) -> Vec<ClassEntry> {
        self.classes
            .iter()
            .filter(|(_, class)| class.listed)
            .map(|(&type_id, class)| ClassEntry {
                type_id: ReferenceTypeId::new(type_id),
                signature: class.signature.clone(),
            })
            .collect()
    }

    fn answer(&self, data: CommandData, body: &Bytes, ctx: &MockCtx) -> MockAnswer {
        match (data.command_set(), data.command()) {
            // Suspend and Resume are fire-and-forget
            (1, 8) | (1, 9) => MockAnswer::Ignore,
            (1, 7) => MockAnswer::Reply(replies::id_sizes()),
            (1, 1) => MockAnswer::Reply(replies::version("Dalvik", "2.1.0")),
            (1, 20) => MockAnswer::Reply(replies::all_classes_with_generic(
                &self.listed_classes(),
            )),
            (1, 4) => MockAnswer::Reply(replies::all_threads(&self.threads)),
            (15, 1) => MockAnswer::Reply(replies::request_id(ctx.next_request_id())),
            (15, 2) => MockAnswer::Ignore,
            (2, 5) => match self.class_of(body) {
                Some(class) => MockAnswer::Reply(replies::methods(&class.methods)),
                None => MockAnswer::Error(21), // INVALID_CLASS
            },
            (2, 4) => match self.class_of(body) {
                Some(class) => MockAnswer::Reply(replies::fields(&class.fields)),
                None => MockAnswer::Error(21),
            },
            (3, 1) => match self.class_of(body) {
                Some(class) => MockAnswer::Reply(replies::superclass(class.super_id)),
                None => MockAnswer::Error(21),
            },
            _ => MockAnswer::Error(99), // NOT_IMPLEMENTED
        }
    }

    /// The scripted class a `{typeID}`-bodied command refers to
    fn class_of(&self, body: &Bytes) -> Option<&WorldClass> {
        let mut body = body.clone();
        if body.len() < 8 {
            return None;
        }
        let id = body.get_u64();
        self.classes.get(&id)
    }
}

/// Attaches a debugger to the mock and waits for startup to finish
pub async fn start_debugger(mock: &MockVm) -> Debugger {
    let addr = mock.addr();
    Debugger::start(&addr.ip().to_string(), addr.port())
        .await
        .expect("debugger starts against the mock")
}

/// Polls `probe` until it answers true, failing the test after two seconds
pub async fn wait_until(what: &str, mut probe: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if probe() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A decoded `EventRequest.Set` body
#[derive(Debug)]
pub struct ParsedSet {
    pub event_kind: EventKind,
    pub suspend_policy: SuspendPolicy,
    pub modifiers: Vec<ParsedModifier>,
}

/// The modifier kinds these tests care about
#[derive(Debug)]
pub enum ParsedModifier {
    Count(i32),
    ClassMatch(String),
    LocationOnly(Location),
    Step { thread: ThreadId, size: i32, depth: i32 },
    Other(u8),
}

/// Decodes an `EventRequest.Set` request body as captured by the mock
pub fn parse_set_body(body: &Bytes) -> ParsedSet {
    let codec = JdwpCodec::default();
    let mut decoder = JdwpDecoder::new(&codec, body.clone());
    let event_kind: EventKind = decoder.get().expect("event kind");
    let suspend_policy: SuspendPolicy = decoder.get().expect("suspend policy");
    let count: i32 = decoder.get().expect("modifier count");
    let mut modifiers = Vec::new();
    for _ in 0..count {
        let kind: u8 = decoder.get().expect("modifier kind");
        let parsed = match kind {
            1 => ParsedModifier::Count(decoder.get().expect("count")),
            5 => ParsedModifier::ClassMatch(decoder.get().expect("pattern")),
            7 => ParsedModifier::LocationOnly(decoder.get().expect("location")),
            10 => ParsedModifier::Step {
                thread: decoder.get().expect("thread"),
                size: decoder.get().expect("size"),
                depth: decoder.get().expect("depth"),
            },
            other => ParsedModifier::Other(other),
        };
        modifiers.push(parsed);
    }
    ParsedSet {
        event_kind,
        suspend_policy,
        modifiers,
    }
}
