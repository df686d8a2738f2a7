//! Frame loading and the Dalvik slot-probing quirk.

mod common;

use bytes::{Buf, Bytes};
use common::{start_debugger, World, WorldClass};
use jdwp_client::raw::packet::CommandData;
use jdwp_mock::{encode_with, replies, MockAnswer, MockCtx, MockVm};
use jdwp_types::{
    ClassId, ErrorConstant, Location, MethodId, Tag, ThreadId, TypeTag, Value,
};

const THREAD: ThreadId = ThreadId::new(0x1001);
const FRAME: u64 = 0xF1;
const CLASS: u64 = 0x4001;
const METHOD: u64 = 0x5001;

fn frame_location() -> Location {
    Location {
        tag: TypeTag::Class,
        class: ClassId::new(CLASS),
        method: MethodId::new(METHOD),
        index: 2,
    }
}

/// Scripts one frame whose slots are: v0 an int, v1 an object, and nothing past v1.
fn frame_handler(
    world: World,
) -> impl Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync + 'static {
    let base = world.handler();
    move |data, body, ctx| match (data.command_set(), data.command()) {
        // ThreadReference.Frames: the whole stack is one frame
        (11, 6) => MockAnswer::Reply(encode_with(|encoder| {
            encoder.put(&1i32);
            encoder.put(&jdwp_types::FrameId::new(FRAME));
            encoder.put(&frame_location());
        })),
        // StackFrame.ThisObject: a null `this`
        (16, 3) => MockAnswer::Reply(encode_with(|encoder| {
            encoder.put(&Tag::Object);
            encoder.put(&0u64);
        })),
        // StackFrame.GetValues: answer by (slot, sigbyte)
        (16, 1) => {
            let mut cursor = body.clone();
            let _thread = cursor.get_u64();
            let _frame = cursor.get_u64();
            let count = cursor.get_i32();
            assert_eq!(count, 1, "the prober asks for one slot at a time");
            let slot = cursor.get_i32();
            let sigbyte = cursor.get_u8();
            match (slot, sigbyte) {
                (0, b'I') => MockAnswer::Reply(replies::object_values(&[Value::Int(7)])),
                (0, _) => MockAnswer::Error(u16::from(ErrorConstant::TypeMismatch)),
                (1, b'L') => MockAnswer::Reply(replies::object_values(&[Value::Object(
                    jdwp_types::ObjectId::new(0x123),
                )])),
                (1, _) => MockAnswer::Error(u16::from(ErrorConstant::TypeMismatch)),
                (_, _) => MockAnswer::Error(u16::from(ErrorConstant::InvalidSlot)),
            }
        }
        _ => base(data, body, ctx),
    }
}

fn frame_world() -> World {
    let mut world = World {
        threads: vec![THREAD],
        ..World::default()
    };
    world.classes.insert(
        CLASS,
        WorldClass {
            signature: "Lsh/kau/playground/X;".into(),
            listed: true,
            ..WorldClass::default()
        },
    );
    world
}

#[test_log::test(tokio::test)]
async fn test_slot_probing_classifies_and_short_circuits() {
    let mock = MockVm::spawn(frame_handler(frame_world())).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let thread = dbg.thread(THREAD).await.unwrap();
    let frames = thread.frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.frame_id().get(), FRAME);
    assert_eq!(frame.location(), frame_location());
    assert!(frame.this_object().is_none(), "null `this` stays absent");

    // v0 classified as int after walking the candidates, v1 as object on the first try
    assert_eq!(frame.slots().len(), 2);
    let v0 = frame.slot(0).unwrap();
    assert_eq!(v0.sigbyte, b'I');
    assert!(matches!(v0.value, Value::Int(7)));
    let v1 = frame.slot(1).unwrap();
    assert_eq!(v1.sigbyte, b'L');
    assert!(matches!(v1.value, Value::Object(id) if id.get() == 0x123));

    // the probe order is load-bearing: L [ s t g I for v0, then L for v1, then the
    // INVALID_SLOT that stops everything
    let probes: Vec<(i32, u8)> = mock
        .commands_matching(16, 1)
        .iter()
        .map(|body| {
            let mut cursor = body.clone();
            let _thread = cursor.get_u64();
            let _frame = cursor.get_u64();
            let _count = cursor.get_i32();
            (cursor.get_i32(), cursor.get_u8())
        })
        .collect();
    let expected: Vec<(i32, u8)> = [b'L', b'[', b's', b't', b'g', b'I']
        .into_iter()
        .map(|sig| (0, sig))
        .chain([(1, b'L'), (2, b'L')])
        .collect();
    assert_eq!(probes, expected);
}

#[test_log::test(tokio::test)]
async fn test_frame_accessor_reloads() -> eyre::Result<()> {
    let mock = MockVm::spawn(frame_handler(frame_world())).await?;
    let dbg = start_debugger(&mock).await;

    let frame = dbg.frame(THREAD, 0).await?;
    assert_eq!(frame.thread_id(), THREAD);
    let missing = dbg.frame(THREAD, 5).await.expect_err("only one frame");
    assert!(missing.to_string().contains("no frame 5"));
    Ok(())
}
