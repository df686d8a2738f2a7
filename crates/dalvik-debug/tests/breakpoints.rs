//! Deferred and immediate breakpoint arming, firing, and stepping.

mod common;

use bytes::Buf;
use common::{parse_set_body, start_debugger, wait_until, ParsedModifier, World, WorldClass};
use dalvik_debug::BreakpointSpec;
use jdwp_client::events::Event;
use jdwp_mock::replies::MethodEntry;
use jdwp_mock::{replies, MockVm};
use jdwp_types::{
    EventKind, Location, MethodId, ReferenceTypeId, SuspendPolicy, ThreadId, TypeTag,
};
use tokio::sync::mpsc::unbounded_channel;

const THREAD: ThreadId = ThreadId::new(0x1001);
const TARGET_CLASS: u64 = 0x4001;
const TARGET_METHOD: u64 = 0x5001;

fn world(listed: bool) -> World {
    let mut world = World {
        threads: vec![THREAD],
        ..World::default()
    };
    world.classes.insert(
        0x3001,
        WorldClass {
            signature: "Ljava/lang/Object;".into(),
            listed: true,
            ..WorldClass::default()
        },
    );
    world.classes.insert(
        TARGET_CLASS,
        WorldClass {
            signature: "Lsh/kau/playground/X;".into(),
            methods: vec![MethodEntry {
                method_id: MethodId::new(TARGET_METHOD),
                name: "onCreate".into(),
                signature: "()V".into(),
            }],
            super_id: 0x3001,
            listed,
            ..WorldClass::default()
        },
    );
    world
}

fn spec() -> BreakpointSpec {
    BreakpointSpec {
        class_signature: "Lsh/kau/playground/X;".into(),
        method_name: "onCreate".into(),
        method_signature: "()V".into(),
        ..BreakpointSpec::default()
    }
}

#[test_log::test(tokio::test)]
async fn test_deferred_breakpoint_arms_on_class_prepare() {
    let mock = MockVm::spawn(world(false).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let bp = dbg.create_breakpoint(spec()).unwrap();
    let (fired_tx, mut fired_rx) = unbounded_channel();
    bp.set_callback(move |event, composite, _bp| {
        let fired_tx = fired_tx.clone();
        async move {
            fired_tx.send((event, composite)).unwrap();
        }
    });

    bp.arm().await.unwrap();
    assert!(!bp.is_armed(), "class is unknown, must defer");
    let prepare_request = bp.request_id().expect("deferred request id");

    // the deferral is a one-shot CLASS_PREPARE watch filtered on the java-form name
    let sets = mock.commands_matching(15, 1);
    assert_eq!(sets.len(), 5, "4 lifecycle subscriptions + 1 deferral");
    let deferral = parse_set_body(&sets[4]);
    assert_eq!(deferral.event_kind, EventKind::ClassPrepare);
    assert_eq!(deferral.suspend_policy, SuspendPolicy::None);
    assert!(matches!(
        &deferral.modifiers[0],
        ParsedModifier::ClassMatch(pattern) if pattern == "sh.kau.playground.X"
    ));
    assert!(matches!(deferral.modifiers[1], ParsedModifier::Count(1)));

    mock.send_composite(
        SuspendPolicy::None,
        &[replies::class_prepare_event(
            prepare_request,
            THREAD,
            ReferenceTypeId::new(TARGET_CLASS),
            "Lsh/kau/playground/X;",
        )],
    );

    let probe = bp.clone();
    wait_until("the deferred breakpoint to arm", move || probe.is_armed()).await;

    // the watch was cleared exactly once
    let clears: Vec<_> = mock
        .commands_matching(15, 2)
        .iter()
        .map(|body| {
            let mut body = body.clone();
            (body.get_u8(), body.get_i32())
        })
        .collect();
    assert_eq!(
        clears,
        vec![(u8::from(EventKind::ClassPrepare), prepare_request.get())]
    );

    // and replaced by a BREAKPOINT request targeting the freshly prepared method
    let sets = mock.commands_matching(15, 1);
    assert_eq!(sets.len(), 6);
    let armed = parse_set_body(&sets[5]);
    assert_eq!(armed.event_kind, EventKind::Breakpoint);
    assert_eq!(armed.suspend_policy, SuspendPolicy::All);
    let ParsedModifier::LocationOnly(location) = &armed.modifiers[0] else {
        panic!("first modifier must be LocationOnly, got {:?}", armed.modifiers);
    };
    assert_eq!(location.class.get(), TARGET_CLASS);
    assert_eq!(location.method.get(), TARGET_METHOD);
    assert_eq!(location.index, 0);
    assert!(matches!(armed.modifiers[1], ParsedModifier::Count(1)));

    // firing it reaches the user callback with the originating event and its composite
    let hit_location = Location {
        tag: TypeTag::Class,
        class: jdwp_types::ClassId::new(TARGET_CLASS),
        method: MethodId::new(TARGET_METHOD),
        index: 0,
    };
    let armed_request = bp.request_id().unwrap();
    mock.send_composite(
        SuspendPolicy::All,
        &[replies::breakpoint_event(armed_request, THREAD, hit_location)],
    );

    let (event, composite) = tokio::time::timeout(std::time::Duration::from_secs(2), fired_rx.recv())
        .await
        .expect("breakpoint fires")
        .expect("channel open");
    assert!(matches!(
        event,
        Event::Breakpoint { request_id, thread, location }
            if request_id == armed_request && thread == THREAD && location == hit_location
    ));
    assert_eq!(composite.suspend_policy, SuspendPolicy::All);
}

#[test_log::test(tokio::test)]
async fn test_immediate_breakpoint_encodes_skip_count() {
    let mock = MockVm::spawn(world(true).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let bp = dbg
        .create_breakpoint(BreakpointSpec {
            bytecode_index: 4,
            skip_count: 3,
            ..spec()
        })
        .unwrap();
    bp.arm().await.unwrap();
    assert!(bp.is_armed(), "class was in the bulk listing");

    let sets = mock.commands_matching(15, 1);
    let armed = parse_set_body(sets.last().unwrap());
    assert_eq!(armed.event_kind, EventKind::Breakpoint);
    let ParsedModifier::LocationOnly(location) = &armed.modifiers[0] else {
        panic!("first modifier must be LocationOnly");
    };
    assert_eq!(location.index, 4);
    // skipping k hits means a count filter of k + 1
    assert!(matches!(armed.modifiers[1], ParsedModifier::Count(4)));
}

#[test_log::test(tokio::test)]
async fn test_missing_method_is_an_error() {
    let mock = MockVm::spawn(world(true).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let bp = dbg
        .create_breakpoint(BreakpointSpec {
            method_name: "noSuchMethod".into(),
            ..spec()
        })
        .unwrap();
    let error = bp.arm().await.expect_err("method does not exist");
    assert!(error.to_string().contains("noSuchMethod"));
}

#[test_log::test(tokio::test)]
async fn test_stepping_encodes_depth_and_resumes() {
    let mock = MockVm::spawn(world(true).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let bp = dbg.create_breakpoint(spec()).unwrap();
    bp.arm().await.unwrap();
    assert_eq!(mock.commands_matching(1, 9).len(), 0);

    bp.step_over(THREAD).await.unwrap();
    let sets = mock.commands_matching(15, 1);
    let step = parse_set_body(sets.last().unwrap());
    assert_eq!(step.event_kind, EventKind::SingleStep);
    assert_eq!(step.suspend_policy, SuspendPolicy::All);
    assert!(matches!(
        step.modifiers[0],
        ParsedModifier::Step { thread, size: 0, depth: 1 } if thread == THREAD
    ));
    // stepping resumes the VM
    wait_until("the resume to hit the wire", || {
        !mock.commands_matching(1, 9).is_empty()
    })
    .await;

    bp.step_into(THREAD).await.unwrap();
    let sets = mock.commands_matching(15, 1);
    let step = parse_set_body(sets.last().unwrap());
    assert!(matches!(
        step.modifiers[0],
        ParsedModifier::Step { size: 0, depth: 0, .. }
    ));

    bp.step_out(THREAD).await.unwrap();
    let sets = mock.commands_matching(15, 1);
    let step = parse_set_body(sets.last().unwrap());
    assert!(matches!(
        step.modifiers[0],
        ParsedModifier::Step { size: 0, depth: 2, .. }
    ));
}

#[test_log::test(tokio::test)]
async fn test_cancel_clears_the_subscription() {
    let mock = MockVm::spawn(world(true).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let bp = dbg.create_breakpoint(spec()).unwrap();
    bp.arm().await.unwrap();
    let request = bp.request_id().unwrap();

    bp.cancel().await.unwrap();
    assert!(bp.request_id().is_none());
    wait_until("the clear to hit the wire", || {
        !mock.commands_matching(15, 2).is_empty()
    })
    .await;
    let mut body = mock.commands_matching(15, 2)[0].clone();
    assert_eq!(body.get_u8(), u8::from(EventKind::Breakpoint));
    assert_eq!(body.get_i32(), request.get());
}

#[test_log::test(tokio::test)]
async fn test_poke_releases_wait() {
    let mock = MockVm::spawn(world(true).handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;
    let bp = dbg.create_breakpoint(spec()).unwrap();

    let waiter = bp.clone();
    let parked = tokio::spawn(async move { waiter.wait().await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    bp.poke();
    tokio::time::timeout(std::time::Duration::from_secs(2), parked)
        .await
        .expect("poke releases the waiter")
        .unwrap();
}
