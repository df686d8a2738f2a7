//! Startup population and lifecycle-event tracking against a scripted VM.

mod common;

use common::{start_debugger, wait_until, World, WorldClass};
use jdwp_mock::{replies, MockVm};
use jdwp_types::{ReferenceTypeId, SuspendPolicy, ThreadId};

fn small_world() -> World {
    let mut world = World {
        threads: vec![ThreadId::new(0x1001), ThreadId::new(0x1002)],
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
        0x3002,
        WorldClass {
            signature: "Lsh/kau/playground/Main;".into(),
            super_id: 0x3001,
            listed: true,
            ..WorldClass::default()
        },
    );
    world
}

#[test_log::test(tokio::test)]
async fn test_startup_population() {
    let mock = MockVm::spawn(small_world().handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    assert_eq!(dbg.versions().vm_name, "Dalvik");
    assert_eq!(dbg.id_sizes().object_id_size, 8);
    assert_eq!(dbg.class_count(), 2);
    assert_eq!(dbg.thread_count(), 2);

    // the four lifecycle subscriptions were registered with suspend policy NONE and no modifiers
    let sets = mock.commands_matching(15, 1);
    assert_eq!(sets.len(), 4);
    for body in &sets {
        let parsed = common::parse_set_body(body);
        assert_eq!(parsed.suspend_policy, SuspendPolicy::None);
        assert!(parsed.modifiers.is_empty());
    }
    let lifecycle = dbg.lifecycle_requests().expect("registered at startup");
    assert!(lifecycle.class_prepare.is_some());
    assert!(lifecycle.thread_death.is_some());

    // startup leaves the VM suspended: exactly one Suspend, no Resume
    assert_eq!(mock.commands_matching(1, 8).len(), 1);
    assert_eq!(mock.commands_matching(1, 9).len(), 0);

    // classes from the bulk listing are cached but unloaded
    let class = dbg
        .class_by_signature("Lsh/kau/playground/Main;")
        .expect("bulk-listed class is cached");
    assert!(!class.is_loaded());
    assert_eq!(
        dbg.class_by_id(class.type_id()).unwrap().signature(),
        "Lsh/kau/playground/Main;"
    );

    let summary = dbg.summary();
    assert!(summary.contains("VM Name: Dalvik"));
    assert!(summary.contains("Class Count: 2"));
}

#[test_log::test(tokio::test)]
async fn test_class_prepare_tracking() {
    let mock = MockVm::spawn(small_world().handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let prepare_id = dbg
        .lifecycle_requests()
        .unwrap()
        .class_prepare
        .expect("class prepare subscription");

    let type_id = ReferenceTypeId::new(0x9999);
    mock.send_composite(
        SuspendPolicy::None,
        &[replies::class_prepare_event(
            prepare_id,
            ThreadId::new(0x1001),
            type_id,
            "Lsh/kau/playground/X;",
        )],
    );

    let probe = dbg.clone();
    wait_until("CLASS_PREPARE to land in the cache", move || {
        probe.class_by_signature("Lsh/kau/playground/X;").is_some()
    })
    .await;

    let class = dbg.class_by_signature("Lsh/kau/playground/X;").unwrap();
    assert_eq!(class.type_id(), type_id);
    assert_eq!(
        dbg.class_by_id(type_id).unwrap().signature(),
        "Lsh/kau/playground/X;"
    );
    // freshly prepared classes are unloaded until someone needs their members
    assert!(!class.is_loaded());
}

#[test_log::test(tokio::test)]
async fn test_class_unload_moves_to_forensic_list() {
    let mock = MockVm::spawn(small_world().handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let unload_id = dbg
        .lifecycle_requests()
        .unwrap()
        .class_unload
        .expect("class unload subscription");

    mock.send_composite(
        SuspendPolicy::None,
        &[replies::class_unload_event(
            unload_id,
            "Lsh/kau/playground/Main;",
        )],
    );

    let probe = dbg.clone();
    wait_until("CLASS_UNLOAD to empty the cache", move || {
        probe.class_by_signature("Lsh/kau/playground/Main;").is_none()
    })
    .await;

    assert!(dbg.class_by_id(ReferenceTypeId::new(0x3002)).is_none());
    let unloaded = dbg.unloaded_classes();
    assert_eq!(unloaded.len(), 1);
    assert_eq!(unloaded[0].signature(), "Lsh/kau/playground/Main;");
}

#[test_log::test(tokio::test)]
async fn test_thread_lifecycle_tracking() {
    let mock = MockVm::spawn(small_world().handler()).await.unwrap();
    let dbg = start_debugger(&mock).await;
    let lifecycle = dbg.lifecycle_requests().unwrap();

    let newcomer = ThreadId::new(0x1003);
    mock.send_composite(
        SuspendPolicy::None,
        &[replies::thread_start_event(
            lifecycle.thread_start.unwrap(),
            newcomer,
        )],
    );
    let probe = dbg.clone();
    wait_until("THREAD_START to land", move || {
        probe.thread_by_id(newcomer).is_some()
    })
    .await;
    assert_eq!(dbg.thread_count(), 3);

    mock.send_composite(
        SuspendPolicy::None,
        &[replies::thread_death_event(
            lifecycle.thread_death.unwrap(),
            newcomer,
        )],
    );
    let probe = dbg.clone();
    wait_until("THREAD_DEATH to land", move || {
        probe.thread_by_id(newcomer).is_none()
    })
    .await;
    assert_eq!(dbg.thread_count(), 2);
    assert_eq!(dbg.dead_threads().len(), 1);
}
