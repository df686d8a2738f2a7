//! The VirtualMachine command set (1)

use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpDecoder, JdwpEncodable, JdwpEncoder};
use crate::commands::command;
use jdwp_types::{
    Boolean, Byte, ClassStatus, Int, Long, ObjectId, ReferenceTypeId, StringId, ThreadGroupId,
    ThreadId, TypeTag,
};

command! {
    command_set: VirtualMachine = 1;
    command: 1;
    /// Returns the JDWP version implemented by the target VM, plus the VM's own idea of its name
    /// and version ("Dalvik" on the targets this crate cares about)
    #[derive(Debug, Clone)]
    pub struct Version -> {
        pub description: String,
        pub jdwp_major: Int,
        pub jdwp_minor: Int,
        pub vm_version: String,
        pub vm_name: String,
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 2;
    /// Returns reference types for all loaded classes matching the given JNI signature
    #[derive(Debug)]
    pub struct ClassesBySignature {
        pub signature: String,
    } -> {
        pub classes: Vec<ClassStatusRef>
    }
}

/// An untyped reference-type entry without its signature (the caller asked by signature)
#[derive(Debug, Clone)]
pub struct ClassStatusRef {
    pub ref_type_tag: TypeTag,
    pub type_id: ReferenceTypeId,
    pub status: ClassStatus,
}

impl JdwpDecodable for ClassStatusRef {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            ref_type_tag: decoder.get()?,
            type_id: decoder.get()?,
            status: decoder.get()?,
        })
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 3;
    /// Returns all loaded reference types
    #[derive(Debug)]
    pub struct AllClasses -> {
        pub classes: Vec<ClassRef>
    }
}

/// A reference-type entry as returned by [AllClasses]
#[derive(Debug, Clone)]
pub struct ClassRef {
    pub ref_type_tag: TypeTag,
    pub type_id: ReferenceTypeId,
    pub signature: String,
    pub status: ClassStatus,
}

impl JdwpDecodable for ClassRef {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            ref_type_tag: decoder.get()?,
            type_id: decoder.get()?,
            signature: decoder.get()?,
            status: decoder.get()?,
        })
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 4;
    /// Returns all threads currently running in the target VM
    #[derive(Debug)]
    pub struct AllThreads -> {
        pub threads: Vec<ThreadId>
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 5;
    #[derive(Debug)]
    pub struct TopLevelThreadGroups -> {
        pub groups: Vec<ThreadGroupId>
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 6;
    /// Invalidates this virtual machine mirror
    #[derive(Debug)]
    pub struct Dispose;
}

command! {
    command_set: VirtualMachine = 1;
    command: 7;
    /// Returns the sizes of variably-sized data types in the target VM; must be issued before any
    /// id crosses the wire in either direction
    #[derive(Debug, Clone)]
    pub struct IdSizes -> {
        pub field_id_size: Int,
        pub method_id_size: Int,
        pub object_id_size: Int,
        pub reference_type_id_size: Int,
        pub frame_id_size: Int,
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 8;
    /// Suspends the execution of the application running in the target VM
    #[derive(Debug)]
    pub struct Suspend;
}

command! {
    command_set: VirtualMachine = 1;
    command: 9;
    /// Resumes execution of the application after the suspend command or an event has stopped it
    #[derive(Debug)]
    pub struct Resume;
}

command! {
    command_set: VirtualMachine = 1;
    command: 10;
    /// Terminates the target VM with the given exit code
    #[derive(Debug)]
    pub struct Exit {
        pub exit_code: Int,
    };
}

command! {
    command_set: VirtualMachine = 1;
    command: 11;
    /// Creates a new string object in the target VM
    #[derive(Debug)]
    pub struct CreateString {
        pub utf: String,
    } -> {
        pub string: StringId
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 12;
    /// Retrieves the original JDWP 1.0 capability set
    #[derive(Debug)]
    pub struct Capabilities -> {
        pub can_watch_field_modification: Boolean,
        pub can_watch_field_access: Boolean,
        pub can_get_bytecodes: Boolean,
        pub can_get_synthetic_attribute: Boolean,
        pub can_get_owned_monitor_info: Boolean,
        pub can_get_current_contended_monitor: Boolean,
        pub can_get_monitor_info: Boolean,
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 13;
    /// Retrieves the classpath and bootclasspath of the target VM
    #[derive(Debug)]
    pub struct ClassPaths -> {
        pub classpaths: Vec<String>,
        pub bootclasspaths: Vec<String>,
    }
}

/// One batched object disposal, pairing an object with how many times it was referenced
#[derive(Debug, Clone)]
pub struct DisposeEntry {
    pub object: ObjectId,
    pub ref_cnt: Int,
}

impl JdwpEncodable for DisposeEntry {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.object);
        encoder.put(&self.ref_cnt);
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 14;
    /// Releases a list of object ids for garbage collection
    #[derive(Debug)]
    pub struct DisposeObjects {
        pub requests: Vec<DisposeEntry>,
    };
}

command! {
    command_set: VirtualMachine = 1;
    command: 15;
    /// Tells the target VM to stop sending events, holding them until released
    #[derive(Debug)]
    pub struct HoldEvents;
}

command! {
    command_set: VirtualMachine = 1;
    command: 16;
    /// Tells the target VM to continue sending events
    #[derive(Debug)]
    pub struct ReleaseEvents;
}

/// Retrieves all of the capabilities of the target VM, new-style.
///
/// The reply is 32 flag bytes; only the first 21 mean anything, the rest are reserved and
/// skipped on decode.
#[derive(Debug)]
pub struct CapabilitiesNew;

impl JdwpEncodable for CapabilitiesNew {}

impl crate::packet::JdwpCommand for CapabilitiesNew {
    type Reply = CapabilitiesNewReply;

    const NAME: &'static str = "VirtualMachine.CapabilitiesNew";

    fn command_data() -> crate::raw::packet::CommandData {
        crate::raw::packet::CommandData::new(1, 17)
    }
}

/// The new-style capability set
#[derive(Debug, Clone)]
pub struct CapabilitiesNewReply {
    pub can_watch_field_modification: Boolean,
    pub can_watch_field_access: Boolean,
    pub can_get_bytecodes: Boolean,
    pub can_get_synthetic_attribute: Boolean,
    pub can_get_owned_monitor_info: Boolean,
    pub can_get_current_contended_monitor: Boolean,
    pub can_get_monitor_info: Boolean,
    pub can_redefine_classes: Boolean,
    pub can_add_method: Boolean,
    pub can_unrestrictedly_redefine_classes: Boolean,
    pub can_pop_frames: Boolean,
    pub can_use_instance_filters: Boolean,
    pub can_get_source_debug_extension: Boolean,
    pub can_request_vm_death_event: Boolean,
    pub can_set_default_stratum: Boolean,
    pub can_get_instance_info: Boolean,
    pub can_request_monitor_events: Boolean,
    pub can_get_monitor_frame_info: Boolean,
    pub can_use_source_name_filters: Boolean,
    pub can_get_constant_pool: Boolean,
    pub can_force_early_return: Boolean,
}

impl JdwpDecodable for CapabilitiesNewReply {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let reply = Self {
            can_watch_field_modification: decoder.get()?,
            can_watch_field_access: decoder.get()?,
            can_get_bytecodes: decoder.get()?,
            can_get_synthetic_attribute: decoder.get()?,
            can_get_owned_monitor_info: decoder.get()?,
            can_get_current_contended_monitor: decoder.get()?,
            can_get_monitor_info: decoder.get()?,
            can_redefine_classes: decoder.get()?,
            can_add_method: decoder.get()?,
            can_unrestrictedly_redefine_classes: decoder.get()?,
            can_pop_frames: decoder.get()?,
            can_use_instance_filters: decoder.get()?,
            can_get_source_debug_extension: decoder.get()?,
            can_request_vm_death_event: decoder.get()?,
            can_set_default_stratum: decoder.get()?,
            can_get_instance_info: decoder.get()?,
            can_request_monitor_events: decoder.get()?,
            can_get_monitor_frame_info: decoder.get()?,
            can_use_source_name_filters: decoder.get()?,
            can_get_constant_pool: decoder.get()?,
            can_force_early_return: decoder.get()?,
        };
        // reserved22 through reserved32
        for _ in 0..11 {
            let _ = decoder.get::<Byte>()?;
        }
        Ok(reply)
    }
}

/// One class redefinition: the reference type and its replacement class file bytes
#[derive(Debug, Clone)]
pub struct ClassRedefinition {
    pub ref_type: ReferenceTypeId,
    pub classfile: Vec<Byte>,
}

impl JdwpEncodable for ClassRedefinition {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.ref_type);
        encoder.put(&self.classfile);
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 18;
    /// Installs new class definitions
    #[derive(Debug)]
    pub struct RedefineClasses {
        pub classes: Vec<ClassRedefinition>,
    };
}

command! {
    command_set: VirtualMachine = 1;
    command: 19;
    /// Sets the default stratum
    #[derive(Debug)]
    pub struct SetDefaultStratum {
        pub stratum: String,
    };
}

command! {
    command_set: VirtualMachine = 1;
    command: 20;
    /// Returns all loaded reference types together with their generic signatures; the bulk load
    /// the class cache is primed from at startup
    #[derive(Debug)]
    pub struct AllClassesWithGeneric -> {
        pub classes: Vec<GenericClassRef>
    }
}

/// A reference-type entry as returned by [AllClassesWithGeneric]
#[derive(Debug, Clone)]
pub struct GenericClassRef {
    pub ref_type_tag: TypeTag,
    pub type_id: ReferenceTypeId,
    pub signature: String,
    pub generic_signature: String,
    pub status: ClassStatus,
}

impl JdwpDecodable for GenericClassRef {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            ref_type_tag: decoder.get()?,
            type_id: decoder.get()?,
            signature: decoder.get()?,
            generic_signature: decoder.get()?,
            status: decoder.get()?,
        })
    }
}

command! {
    command_set: VirtualMachine = 1;
    command: 21;
    /// Returns the number of reachable instances of each given reference type
    #[derive(Debug)]
    pub struct InstanceCounts {
        pub ref_types: Vec<ReferenceTypeId>,
    } -> {
        pub counts: Vec<Long>
    }
}
