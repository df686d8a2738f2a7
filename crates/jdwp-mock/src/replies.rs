//! Canned reply bodies and event payloads for scripting a [crate::MockVm].

use crate::encode_with;
use bytes::Bytes;
use jdwp_types::{
    ClassStatus, EventKind, Location, MethodId, ReferenceTypeId, RequestId, ThreadId, TypeTag,
};

/// `VirtualMachine.IDSizes` with every width 8
pub fn id_sizes() -> Bytes {
    encode_with(|encoder| {
        for _ in 0..5 {
            encoder.put(&8i32);
        }
    })
}

/// `VirtualMachine.Version` as a Dalvik target answers it
pub fn version(vm_name: &str, vm_version: &str) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&"Java Debug Wire Protocol (Reference Implementation)");
        encoder.put(&1i32);
        encoder.put(&8i32);
        encoder.put(&vm_version);
        encoder.put(&vm_name);
    })
}

/// One class entry for [all_classes_with_generic]
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub type_id: ReferenceTypeId,
    pub signature: String,
}

/// `VirtualMachine.AllClassesWithGeneric` over the given classes
pub fn all_classes_with_generic(classes: &[ClassEntry]) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&(classes.len() as i32));
        for class in classes {
            encoder.put(&TypeTag::Class);
            encoder.put(&class.type_id);
            encoder.put(&class.signature);
            encoder.put(&String::new());
            encoder.data.extend_from_slice(&ClassStatus::from_bits(7).bits().to_be_bytes());
        }
    })
}

/// `VirtualMachine.AllThreads`
pub fn all_threads(threads: &[ThreadId]) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&(threads.len() as i32));
        for thread in threads {
            encoder.put(thread);
        }
    })
}

/// `EventRequest.Set`'s reply: the allocated request id
pub fn request_id(id: i32) -> Bytes {
    encode_with(|encoder| encoder.put(&id))
}

/// One method row for [methods]
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub method_id: MethodId,
    pub name: String,
    pub signature: String,
}

/// `ReferenceType.Methods`
pub fn methods(declared: &[MethodEntry]) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&(declared.len() as i32));
        for method in declared {
            encoder.put(&method.method_id);
            encoder.put(&method.name);
            encoder.put(&method.signature);
            encoder.put(&0i32);
        }
    })
}

/// One field row for [fields]
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub field_id: jdwp_types::FieldId,
    pub name: String,
    pub signature: String,
}

/// `ReferenceType.Fields`
pub fn fields(declared: &[FieldEntry]) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&(declared.len() as i32));
        for field in declared {
            encoder.put(&field.field_id);
            encoder.put(&field.name);
            encoder.put(&field.signature);
            encoder.put(&0i32);
        }
    })
}

/// `ClassType.Superclass`; pass the null id for java.lang.Object
pub fn superclass(super_id: u64) -> Bytes {
    encode_with(|encoder| encoder.put(&jdwp_types::ClassId::new(super_id)))
}

/// `ObjectReference.ReferenceType`
pub fn object_reference_type(type_id: ReferenceTypeId) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&TypeTag::Class);
        encoder.put(&type_id);
    })
}

/// `ObjectReference.GetValues` over already-encoded tagged values
pub fn object_values(values: &[jdwp_types::Value]) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&(values.len() as i32));
        for value in values {
            encoder.put(value);
        }
    })
}

/// A CLASS_PREPARE event payload for a composite
pub fn class_prepare_event(
    request_id: RequestId,
    thread: ThreadId,
    type_id: ReferenceTypeId,
    signature: &str,
) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&EventKind::ClassPrepare);
        encoder.put(&request_id);
        encoder.put(&thread);
        encoder.put(&TypeTag::Class);
        encoder.put(&type_id);
        encoder.put(&signature);
        encoder.data.extend_from_slice(&ClassStatus::from_bits(3).bits().to_be_bytes());
    })
}

/// A CLASS_UNLOAD event payload for a composite
pub fn class_unload_event(request_id: RequestId, signature: &str) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&EventKind::ClassUnload);
        encoder.put(&request_id);
        encoder.put(&signature);
    })
}

/// A THREAD_START event payload for a composite
pub fn thread_start_event(request_id: RequestId, thread: ThreadId) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&EventKind::ThreadStart);
        encoder.put(&request_id);
        encoder.put(&thread);
    })
}

/// A THREAD_DEATH event payload for a composite
pub fn thread_death_event(request_id: RequestId, thread: ThreadId) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&EventKind::ThreadDeath);
        encoder.put(&request_id);
        encoder.put(&thread);
    })
}

/// A BREAKPOINT event payload for a composite
pub fn breakpoint_event(request_id: RequestId, thread: ThreadId, location: Location) -> Bytes {
    encode_with(|encoder| {
        encoder.put(&EventKind::Breakpoint);
        encoder.put(&request_id);
        encoder.put(&thread);
        encoder.put(&location);
    })
}
