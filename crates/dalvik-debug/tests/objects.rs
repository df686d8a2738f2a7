//! Object dereferencing: the superclass walk, field shadowing, and the unsafe-field fence.

mod common;

use bytes::{Buf, Bytes};
use common::{start_debugger, World, WorldClass};
use dalvik_debug::DebugError;
use jdwp_client::raw::packet::CommandData;
use jdwp_mock::replies::FieldEntry;
use jdwp_mock::{replies, MockAnswer, MockCtx, MockVm};
use jdwp_types::{FieldId, ObjectId, ReferenceTypeId, ThreadId, Value};

const CLASS_A: u64 = 0xA0;
const CLASS_B: u64 = 0xB0;
const CLASS_C: u64 = 0xC0;
const OBJECT: u64 = 0x5001;

fn chain_world() -> World {
    let mut world = World {
        threads: vec![ThreadId::new(0x1001)],
        ..World::default()
    };
    world.classes.insert(
        CLASS_A,
        WorldClass {
            signature: "LA;".into(),
            fields: vec![FieldEntry {
                field_id: FieldId::new(0xA1),
                name: "y".into(),
                signature: "I".into(),
            }],
            listed: true,
            ..WorldClass::default()
        },
    );
    world.classes.insert(
        CLASS_B,
        WorldClass {
            signature: "LB;".into(),
            fields: vec![FieldEntry {
                field_id: FieldId::new(0xB1),
                name: "x".into(),
                signature: "I".into(),
            }],
            super_id: CLASS_A,
            listed: true,
            ..WorldClass::default()
        },
    );
    world.classes.insert(
        CLASS_C,
        WorldClass {
            signature: "LC;".into(),
            fields: vec![FieldEntry {
                field_id: FieldId::new(0xC1),
                name: "x".into(),
                signature: "I".into(),
            }],
            super_id: CLASS_B,
            listed: true,
            ..WorldClass::default()
        },
    );
    world
}

/// Field values by field id, for scripting `ObjectReference.GetValues`
fn value_of(field_id: u64) -> Value {
    match field_id {
        0xC1 => Value::Int(1),
        0xB1 => Value::Int(2),
        0xA1 => Value::Int(3),
        0x71 => Value::Long(0x7EE7_BEEF),
        other => panic!("mock has no value for field {other:#x}"),
    }
}

fn object_handler(
    world: World,
    concrete: u64,
) -> impl Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync + 'static {
    let base = world.handler();
    move |data, body, ctx| match (data.command_set(), data.command()) {
        (9, 1) => MockAnswer::Reply(replies::object_reference_type(ReferenceTypeId::new(
            concrete,
        ))),
        (9, 2) => {
            let mut cursor = body.clone();
            let _object = cursor.get_u64();
            let count = cursor.get_i32();
            let values: Vec<Value> = (0..count).map(|_| value_of(cursor.get_u64())).collect();
            MockAnswer::Reply(replies::object_values(&values))
        }
        _ => base(data, body, ctx),
    }
}

#[test_log::test(tokio::test)]
async fn test_superclass_walk_is_concrete_first() {
    let mock = MockVm::spawn(object_handler(chain_world(), CLASS_C))
        .await
        .unwrap();
    let dbg = start_debugger(&mock).await;

    let object = dbg.deref(ObjectId::new(OBJECT)).await.unwrap();
    let levels = object.subobjects().expect("loaded");
    let signatures: Vec<_> = levels.iter().map(|s| s.class_signature()).collect();
    assert_eq!(signatures, vec!["LC;", "LB;", "LA;"]);

    // deref again answers the canonical cached instance
    let again = dbg.deref(ObjectId::new(OBJECT)).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&object, &again));
    // and does not refetch: one ReferenceType call, three GetValues calls total
    assert_eq!(mock.commands_matching(9, 1).len(), 1);
    assert_eq!(mock.commands_matching(9, 2).len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_field_shadowing_resolves_by_class_signature() {
    let mock = MockVm::spawn(object_handler(chain_world(), CLASS_C))
        .await
        .unwrap();
    let dbg = start_debugger(&mock).await;

    let object = dbg.deref(ObjectId::new(OBJECT)).await.unwrap();
    // C shadows B's x; naming the level picks the right one
    assert_eq!(object.field_value("LC;", "x"), Some(Value::Int(1)));
    assert_eq!(object.field_value("LB;", "x"), Some(Value::Int(2)));
    assert_eq!(object.field_value("LA;", "y"), Some(Value::Int(3)));
    assert_eq!(object.field_value("LA;", "x"), None);
    assert_eq!(object.field_value("LB;", "y"), None);
}

#[test_log::test(tokio::test)]
async fn test_unsafe_thread_fields_are_fenced_off() {
    let mut world = World {
        threads: vec![ThreadId::new(0x1001)],
        ..World::default()
    };
    world.classes.insert(
        0x70,
        WorldClass {
            signature: "Ljava/lang/Thread;".into(),
            fields: vec![
                FieldEntry {
                    field_id: FieldId::new(0x71),
                    name: "nativePeer".into(),
                    signature: "J".into(),
                },
                FieldEntry {
                    field_id: FieldId::new(0x72),
                    name: "uncaughtExceptionHandler".into(),
                    signature: "Ljava/lang/Thread$UncaughtExceptionHandler;".into(),
                },
                FieldEntry {
                    field_id: FieldId::new(0x73),
                    name: "inheritedPermissions".into(),
                    signature: "Ljava/lang/RuntimePermission;".into(),
                },
            ],
            listed: true,
            ..WorldClass::default()
        },
    );

    let mock = MockVm::spawn(object_handler(world, 0x70)).await.unwrap();
    let dbg = start_debugger(&mock).await;

    let object = dbg.deref(ObjectId::new(OBJECT)).await.unwrap();

    // only the safe field was ever asked for
    let requests = mock.commands_matching(9, 2);
    assert_eq!(requests.len(), 1);
    let mut cursor = requests[0].clone();
    let _object = cursor.get_u64();
    assert_eq!(cursor.get_i32(), 1);
    assert_eq!(cursor.get_u64(), 0x71);

    assert_eq!(
        object.field_value("Ljava/lang/Thread;", "nativePeer"),
        Some(Value::Long(0x7EE7_BEEF))
    );
    assert_eq!(
        object.field_value("Ljava/lang/Thread;", "uncaughtExceptionHandler"),
        None
    );
    let refused = object
        .checked_field_value("Ljava/lang/Thread;", "uncaughtExceptionHandler")
        .expect_err("crash-prone field must be refused");
    assert!(matches!(refused, DebugError::UnsafeField { .. }));
    let refused = object
        .checked_field_value("Ljava/lang/Thread;", "inheritedPermissions")
        .expect_err("crash-prone field must be refused");
    assert!(matches!(refused, DebugError::UnsafeField { .. }));
}
