//! The debugger facade: owns the connection, the caches, and the lifecycle subscriptions.

use crate::breakpoint::{Breakpoint, BreakpointSpec};
use crate::class::ClassInfo;
use crate::error::DebugError;
use crate::native::{NativeAgent, VregDump};
use crate::object::ObjectInfo;
use crate::thread::{FrameInfo, ThreadInfo};
use dalvik_dex::DexHeader;
use jdwp_client::commands::{event_request, reference_type, string_reference, virtual_machine};
use jdwp_client::events::Event;
use jdwp_client::{JdwpClient, JdwpError};
use jdwp_types::{
    EventKind, Location, MethodId, ObjectId, ReferenceTypeId, RequestId, SuspendPolicy, ThreadId,
    TypeTag, Value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

/// The request ids of the always-on lifecycle subscriptions, as handed out by the VM at startup.
/// A `None` means the VM refused that subscription (logged, not fatal).
#[derive(Debug, Clone, Copy)]
pub struct LifecycleRequests {
    pub class_prepare: Option<RequestId>,
    pub class_unload: Option<RequestId>,
    pub thread_start: Option<RequestId>,
    pub thread_death: Option<RequestId>,
}

pub(crate) struct DebuggerInner {
    client: JdwpClient,
    native: Option<Arc<dyn NativeAgent>>,
    versions: virtual_machine::VersionReply,
    id_sizes: virtual_machine::IdSizesReply,
    lifecycle: OnceLock<LifecycleRequests>,

    classes_by_id: Mutex<HashMap<ReferenceTypeId, Arc<ClassInfo>>>,
    classes_by_signature: Mutex<HashMap<String, Arc<ClassInfo>>>,
    unloaded_classes: Mutex<Vec<Arc<ClassInfo>>>,
    threads_by_id: Mutex<HashMap<ThreadId, Arc<ThreadInfo>>>,
    dead_threads: Mutex<Vec<Arc<ThreadInfo>>>,
    objects_by_id: Mutex<HashMap<ObjectId, Arc<ObjectInfo>>>,
}

impl DebuggerInner {
    pub(crate) fn client(&self) -> &JdwpClient {
        &self.client
    }

    pub(crate) fn native(&self) -> Option<&Arc<dyn NativeAgent>> {
        self.native.as_ref()
    }

    pub(crate) fn class_by_id(&self, id: ReferenceTypeId) -> Option<Arc<ClassInfo>> {
        self.classes_by_id
            .lock()
            .expect("class cache poisoned")
            .get(&id)
            .cloned()
    }

    pub(crate) fn class_by_signature(&self, signature: &str) -> Option<Arc<ClassInfo>> {
        self.classes_by_signature
            .lock()
            .expect("class cache poisoned")
            .get(signature)
            .cloned()
    }

    /// Creates the unloaded [ClassInfo] for a type id if it is new, and indexes it both ways.
    /// Always answers with the canonical instance.
    pub(crate) fn intern_class(
        &self,
        type_id: ReferenceTypeId,
        ref_type_tag: TypeTag,
        signature: &str,
        generic: Option<String>,
    ) -> Arc<ClassInfo> {
        let mut by_id = self.classes_by_id.lock().expect("class cache poisoned");
        if let Some(existing) = by_id.get(&type_id) {
            return existing.clone();
        }
        let info = Arc::new(ClassInfo::new(
            type_id,
            ref_type_tag,
            signature.to_string(),
            generic,
        ));
        by_id.insert(type_id, info.clone());
        drop(by_id);
        self.classes_by_signature
            .lock()
            .expect("class cache poisoned")
            .insert(signature.to_string(), info.clone());
        info
    }

    pub(crate) fn thread_info(&self, thread: ThreadId) -> Arc<ThreadInfo> {
        self.threads_by_id
            .lock()
            .expect("thread cache poisoned")
            .entry(thread)
            .or_insert_with(|| Arc::new(ThreadInfo::new(thread)))
            .clone()
    }

    pub(crate) fn object_info(&self, object: ObjectId) -> Arc<ObjectInfo> {
        self.objects_by_id
            .lock()
            .expect("object cache poisoned")
            .entry(object)
            .or_insert_with(|| Arc::new(ObjectInfo::new(object)))
            .clone()
    }

    /// Applies a CLASS_PREPARE event to the cache. Also called by deferred breakpoints, whose
    /// filtered subscription can observe the prepare before the global one does.
    pub(crate) fn observe_class_prepare(&self, event: &Event) {
        if let Event::ClassPrepare {
            ref_type_tag,
            type_id,
            signature,
            ..
        } = event
        {
            self.intern_class(*type_id, *ref_type_tag, signature, None);
        }
    }

    fn observe_class_unload(&self, signature: &str) {
        let removed = self
            .classes_by_signature
            .lock()
            .expect("class cache poisoned")
            .remove(signature);
        if let Some(info) = removed {
            self.classes_by_id
                .lock()
                .expect("class cache poisoned")
                .remove(&info.type_id());
            info!("CLASS_UNLOAD: {:.60}", info.signature());
            self.unloaded_classes
                .lock()
                .expect("class cache poisoned")
                .push(info);
        }
    }

    fn observe_thread_start(&self, thread: ThreadId) {
        self.thread_info(thread);
    }

    fn observe_thread_death(&self, thread: ThreadId) {
        let removed = self
            .threads_by_id
            .lock()
            .expect("thread cache poisoned")
            .remove(&thread);
        if let Some(info) = removed {
            self.dead_threads
                .lock()
                .expect("thread cache poisoned")
                .push(info);
        }
    }

    /// The canonical, loaded [ClassInfo] for a type id, with its whole superclass chain loaded.
    ///
    /// A cache miss asks the VM for the signature and interns the result before loading, so
    /// classes that slipped past the lifecycle events still resolve.
    pub(crate) async fn class_info(
        &self,
        id: ReferenceTypeId,
    ) -> Result<Arc<ClassInfo>, DebugError> {
        let root = self.ensure_class(id).await?;
        let mut current = root.clone();
        loop {
            let super_id = current.load(self).await?.super_class();
            match super_id {
                Some(super_id) => current = self.ensure_class(super_id).await?,
                None => break,
            }
        }
        Ok(root)
    }

    async fn ensure_class(&self, id: ReferenceTypeId) -> Result<Arc<ClassInfo>, DebugError> {
        if let Some(info) = self.class_by_id(id) {
            return Ok(info);
        }
        debug!("class {} missed the cache, asking the VM", id.get());
        match self
            .client
            .send(reference_type::SignatureWithGeneric { ref_type: id })
            .await
        {
            Ok(reply) => {
                let tag = if reply.signature.starts_with('[') {
                    TypeTag::Array
                } else {
                    TypeTag::Class
                };
                let generic = (!reply.generic_signature.is_empty())
                    .then_some(reply.generic_signature);
                Ok(self.intern_class(id, tag, &reply.signature, generic))
            }
            Err(e @ JdwpError::Protocol { .. }) => {
                warn!("typeID {} unknown to the VM: {e}", id.get());
                Err(DebugError::UnknownClass(format!("typeID {}", id.get())))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn load_thread(
        &self,
        thread: ThreadId,
    ) -> Result<Arc<ThreadInfo>, DebugError> {
        let info = self.thread_info(thread);
        info.load(self).await?;
        Ok(info)
    }

    pub(crate) async fn load_method_bytecode(
        &self,
        class: ReferenceTypeId,
        method: MethodId,
    ) -> Result<Arc<Vec<u8>>, DebugError> {
        let class_info = self.class_info(class).await?;
        let members = class_info.members().expect("class_info loads members");
        let method_info = members
            .method_by_id(method)
            .cloned()
            .ok_or_else(|| DebugError::MethodNotFound {
                class_signature: class_info.signature().to_string(),
                name: format!("#{}", method.get()),
                signature: String::new(),
            })?;
        class_info.load_method_bytecode(self, &method_info).await
    }

    /// Clears an event subscription on the VM and drops its handler, so a stale in-flight event
    /// cannot reach it
    pub(crate) async fn clear_event(&self, kind: EventKind, request_id: RequestId) {
        self.client.dispatcher().remove(request_id);
        if let Err(e) = self
            .client
            .send(event_request::Clear {
                event_kind: kind,
                request_id,
            })
            .await
        {
            warn!("could not clear {kind:?} request {request_id}: {e}");
        }
    }

    pub(crate) async fn resume_vm(&self) -> Result<(), DebugError> {
        self.client.send(virtual_machine::Resume).await?;
        Ok(())
    }

    /// Subscribes to a lifecycle event kind with suspend policy NONE and no modifiers
    async fn subscribe_lifecycle(&self, kind: EventKind) -> Result<Option<RequestId>, DebugError> {
        match self
            .client
            .send(event_request::Set {
                event_kind: kind,
                suspend_policy: SuspendPolicy::None,
                modifiers: Vec::new(),
            })
            .await
        {
            Ok(reply) => Ok(Some(reply.request_id)),
            Err(e @ JdwpError::Protocol { .. }) => {
                warn!("could not enable {kind:?} events: {e}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn enable_lifecycle_events(self: &Arc<Self>) -> Result<(), DebugError> {
        let class_prepare = self.subscribe_lifecycle(EventKind::ClassPrepare).await?;
        if let Some(request_id) = class_prepare {
            let weak = Arc::downgrade(self);
            self.client.dispatcher().register_fn(request_id, move |event, _composite| {
                let weak = weak.clone();
                async move {
                    if let Some(dbg) = weak.upgrade() {
                        dbg.observe_class_prepare(&event);
                    }
                }
            });
        }

        let class_unload = self.subscribe_lifecycle(EventKind::ClassUnload).await?;
        if let Some(request_id) = class_unload {
            let weak = Arc::downgrade(self);
            self.client.dispatcher().register_fn(request_id, move |event, _composite| {
                let weak = weak.clone();
                async move {
                    let Some(dbg) = weak.upgrade() else { return };
                    if let Event::ClassUnload { signature, .. } = &event {
                        dbg.observe_class_unload(signature);
                    }
                }
            });
        }

        let thread_start = self.subscribe_lifecycle(EventKind::ThreadStart).await?;
        if let Some(request_id) = thread_start {
            let weak = Arc::downgrade(self);
            self.client.dispatcher().register_fn(request_id, move |event, _composite| {
                let weak = weak.clone();
                async move {
                    let Some(dbg) = weak.upgrade() else { return };
                    if let Some(thread) = event.thread() {
                        dbg.observe_thread_start(thread);
                    }
                }
            });
        }

        let thread_death = self.subscribe_lifecycle(EventKind::ThreadDeath).await?;
        if let Some(request_id) = thread_death {
            let weak = Arc::downgrade(self);
            self.client.dispatcher().register_fn(request_id, move |event, _composite| {
                let weak = weak.clone();
                async move {
                    let Some(dbg) = weak.upgrade() else { return };
                    if let Some(thread) = event.thread() {
                        dbg.observe_thread_death(thread);
                    }
                }
            });
        }

        let _ = self.lifecycle.set(LifecycleRequests {
            class_prepare,
            class_unload,
            thread_start,
            thread_death,
        });
        Ok(())
    }

    async fn request_all_classes(&self) -> Result<(), DebugError> {
        let reply = self
            .client
            .send(virtual_machine::AllClassesWithGeneric)
            .await?;
        for class in reply.classes {
            let generic = (!class.generic_signature.is_empty()).then_some(class.generic_signature);
            self.intern_class(class.type_id, class.ref_type_tag, &class.signature, generic);
        }
        Ok(())
    }

    async fn request_all_threads(&self) -> Result<(), DebugError> {
        let reply = self.client.send(virtual_machine::AllThreads).await?;
        for thread in reply.threads {
            // created unloaded; frames only load when broken
            self.thread_info(thread);
        }
        Ok(())
    }
}

/// The top-level debugger.
///
/// Exclusively owns the class/thread/object caches; every lookup answers with the canonical
/// cached instance. Cheap to clone, and everything spawned (event handlers, breakpoints) holds
/// only weak references back, so dropping the last handle tears the session down.
#[derive(Clone)]
pub struct Debugger {
    inner: Arc<DebuggerInner>,
}

impl Debugger {
    /// Attaches to `host:port` and primes the session:
    ///
    /// 1. handshake, then an immediate `VirtualMachine.Suspend`
    /// 2. IDSizes negotiation and the Version banner
    /// 3. lifecycle subscriptions (class prepare/unload, thread start/death), suspend policy NONE
    /// 4. the bulk class listing and thread listing
    ///
    /// The VM is left suspended; call [Debugger::resume_vm] when ready.
    pub async fn start(host: &str, port: u16) -> Result<Debugger, DebugError> {
        Self::start_inner(host, port, None).await
    }

    /// Like [Debugger::start], with a native introspection agent attached
    pub async fn start_with_agent(
        host: &str,
        port: u16,
        agent: Arc<dyn NativeAgent>,
    ) -> Result<Debugger, DebugError> {
        Self::start_inner(host, port, Some(agent)).await
    }

    async fn start_inner(
        host: &str,
        port: u16,
        native: Option<Arc<dyn NativeAgent>>,
    ) -> Result<Debugger, DebugError> {
        let client = JdwpClient::attach((host, port)).await?;

        // Keep the VM still while the caches prime.
        client.send(virtual_machine::Suspend).await?;
        let id_sizes = client.negotiate_id_sizes().await?;
        let versions = client.send(virtual_machine::Version).await?;

        let inner = Arc::new(DebuggerInner {
            client,
            native,
            versions,
            id_sizes,
            lifecycle: OnceLock::new(),
            classes_by_id: Mutex::new(HashMap::new()),
            classes_by_signature: Mutex::new(HashMap::new()),
            unloaded_classes: Mutex::new(Vec::new()),
            threads_by_id: Mutex::new(HashMap::new()),
            dead_threads: Mutex::new(Vec::new()),
            objects_by_id: Mutex::new(HashMap::new()),
        });

        inner.enable_lifecycle_events().await?;
        info!("fetching all classes, this can take a moment");
        inner.request_all_classes().await?;
        inner.request_all_threads().await?;
        info!(
            "attached to {} ({} classes, {} threads)",
            inner.versions.vm_name,
            inner.classes_by_id.lock().expect("class cache poisoned").len(),
            inner.threads_by_id.lock().expect("thread cache poisoned").len(),
        );

        Ok(Debugger { inner })
    }

    /// The underlying command transport
    pub fn client(&self) -> &JdwpClient {
        &self.inner.client
    }

    /// The VM's version banner, fetched at startup
    pub fn versions(&self) -> &virtual_machine::VersionReply {
        &self.inner.versions
    }

    /// The negotiated id widths
    pub fn id_sizes(&self) -> &virtual_machine::IdSizesReply {
        &self.inner.id_sizes
    }

    /// The lifecycle subscriptions registered at startup
    pub fn lifecycle_requests(&self) -> Option<LifecycleRequests> {
        self.inner.lifecycle.get().copied()
    }

    pub fn class_count(&self) -> usize {
        self.inner
            .classes_by_id
            .lock()
            .expect("class cache poisoned")
            .len()
    }

    pub fn thread_count(&self) -> usize {
        self.inner
            .threads_by_id
            .lock()
            .expect("thread cache poisoned")
            .len()
    }

    /// The cached class with this type id, without loading it
    pub fn class_by_id(&self, id: ReferenceTypeId) -> Option<Arc<ClassInfo>> {
        self.inner.class_by_id(id)
    }

    /// The cached class with this JNI signature, without loading it
    pub fn class_by_signature(&self, signature: &str) -> Option<Arc<ClassInfo>> {
        self.inner.class_by_signature(signature)
    }

    /// Classes removed by CLASS_UNLOAD, kept around for post-mortem inspection
    pub fn unloaded_classes(&self) -> Vec<Arc<ClassInfo>> {
        self.inner
            .unloaded_classes
            .lock()
            .expect("class cache poisoned")
            .clone()
    }

    /// The cached thread, without loading its frames
    pub fn thread_by_id(&self, thread: ThreadId) -> Option<Arc<ThreadInfo>> {
        self.inner
            .threads_by_id
            .lock()
            .expect("thread cache poisoned")
            .get(&thread)
            .cloned()
    }

    /// Threads that have died since attach
    pub fn dead_threads(&self) -> Vec<Arc<ThreadInfo>> {
        self.inner
            .dead_threads
            .lock()
            .expect("thread cache poisoned")
            .clone()
    }

    /// The canonical class for a type id, loaded (methods, the field partition and the whole
    /// superclass chain)
    pub async fn class_info(&self, id: ReferenceTypeId) -> Result<Arc<ClassInfo>, DebugError> {
        self.inner.class_info(id).await
    }

    /// Dereferences an object: resolves its concrete class and every superclass level's fields.
    /// Always answers with the canonical cached [ObjectInfo].
    pub async fn deref(&self, object: ObjectId) -> Result<Arc<ObjectInfo>, DebugError> {
        let info = self.inner.object_info(object);
        info.load(&self.inner).await?;
        Ok(info)
    }

    /// Dereferences the object held by a tagged value
    pub async fn deref_value(&self, value: &Value) -> Result<Arc<ObjectInfo>, DebugError> {
        let id = value
            .object_id()
            .ok_or(DebugError::NotAnObject(value.tag()))?;
        self.deref(id.retag()).await
    }

    /// Loads a thread's frames and slots. Only meaningful while the VM is suspended for it.
    pub async fn thread(&self, thread: ThreadId) -> Result<Arc<ThreadInfo>, DebugError> {
        self.inner.load_thread(thread).await
    }

    /// Reloads a thread and returns one of its frames
    pub async fn frame(
        &self,
        thread: ThreadId,
        index: usize,
    ) -> Result<Arc<FrameInfo>, DebugError> {
        self.inner.load_thread(thread).await?.frame(index)
    }

    /// The characters of a VM string object
    pub async fn string(&self, string_object: ObjectId) -> Result<String, DebugError> {
        Ok(self
            .inner
            .client
            .send(string_reference::Value { string_object })
            .await?
            .value)
    }

    /// Fetches (and caches) a method's bytecode
    pub async fn load_method_bytecode(
        &self,
        class: ReferenceTypeId,
        method: MethodId,
    ) -> Result<Arc<Vec<u8>>, DebugError> {
        self.inner.load_method_bytecode(class, method).await
    }

    /// Resumes the whole VM. Frame and slot snapshots loaded during the pause stop being valid.
    pub async fn resume_vm(&self) -> Result<(), DebugError> {
        self.inner.resume_vm().await
    }

    /// Builds a breakpoint from a spec. Arm it with [Breakpoint::arm]; if the class is not yet
    /// prepared the arming defers itself on a filtered CLASS_PREPARE.
    pub fn create_breakpoint(
        &self,
        spec: BreakpointSpec,
    ) -> Result<Arc<Breakpoint>, DebugError> {
        if spec.class_signature.is_empty()
            || spec.method_name.is_empty()
            || spec.method_signature.is_empty()
        {
            return Err(DebugError::IncompleteBreakpoint);
        }
        Ok(Breakpoint::new(Arc::downgrade(&self.inner), spec))
    }

    /// One-screen summary of the session
    pub fn summary(&self) -> String {
        let versions = &self.inner.versions;
        format!(
            "-- VM Info --\n\
             Description: {}\n\
             JDWP Version: {}.{}\n\
             VM Version: {}\n\
             VM Name: {}\n\
             \n\
             -- Cache Info --\n\
             Class Count: {}\n\
             Thread Count: {}",
            versions.description,
            versions.jdwp_major,
            versions.jdwp_minor,
            versions.vm_version,
            versions.vm_name,
            self.class_count(),
            self.thread_count(),
        )
    }

    /// Prints [Debugger::summary] to stdout
    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }

    /// Reads and parses the DEX header backing `location`'s class, through the native agent:
    /// `Class.dexCache`, then `DexCache.dexFile`, then the header bytes at that address.
    pub async fn dex_header(&self, location: &Location) -> Result<DexHeader, DebugError> {
        let agent = self
            .inner
            .native()
            .cloned()
            .ok_or(DebugError::NativeUnavailable)?;

        let class_object = self
            .deref(ObjectId::new(location.class.get()))
            .await?;
        let dex_cache = class_object
            .field_value("Ljava/lang/Class;", "dexCache")
            .ok_or_else(|| DebugError::FieldNotFound {
                class_signature: "Ljava/lang/Class;".into(),
                name: "dexCache".into(),
            })?;
        let dex_cache = self.deref_value(&dex_cache).await?;
        let dex_file = dex_cache
            .field_value("Ljava/lang/DexCache;", "dexFile")
            .ok_or_else(|| DebugError::FieldNotFound {
                class_signature: "Ljava/lang/DexCache;".into(),
                name: "dexFile".into(),
            })?;
        let addr = pointer_value(&dex_file).ok_or_else(|| DebugError::NotAPointer {
            class_signature: "Ljava/lang/DexCache;".into(),
            name: "dexFile".into(),
        })?;

        let dump = agent.fetch_dex_header(addr).await?;
        Ok(DexHeader::parse(&dump.header)?)
    }

    /// Dumps a thread's interpreter shadow-frame registers through the native agent, via the
    /// thread object's `nativePeer`
    pub async fn vregs(&self, thread: ThreadId) -> Result<VregDump, DebugError> {
        let agent = self
            .inner
            .native()
            .cloned()
            .ok_or(DebugError::NativeUnavailable)?;

        let thread_object = self.deref(ObjectId::new(thread.get())).await?;
        let peer = thread_object
            .field_value("Ljava/lang/Thread;", "nativePeer")
            .ok_or_else(|| DebugError::FieldNotFound {
                class_signature: "Ljava/lang/Thread;".into(),
                name: "nativePeer".into(),
            })?;
        let peer = pointer_value(&peer).ok_or_else(|| DebugError::NotAPointer {
            class_signature: "Ljava/lang/Thread;".into(),
            name: "nativePeer".into(),
        })?;

        Ok(agent.dump_vregs(peer).await?)
    }
}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("vm", &self.inner.versions.vm_name)
            .field("classes", &self.class_count())
            .field("threads", &self.thread_count())
            .finish()
    }
}

/// The raw pointer a `long`-typed VM-internal field carries
fn pointer_value(value: &Value) -> Option<u64> {
    match value {
        Value::Long(v) => Some(*v as u64),
        Value::Int(v) => Some(*v as u32 as u64),
        _ => None,
    }
}
