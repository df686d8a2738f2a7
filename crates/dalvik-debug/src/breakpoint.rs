//! Breakpoints and stepping.
//!
//! A breakpoint is keyed on `(class signature, method name, method signature, bytecode index)`.
//! Arming it while the class is already prepared installs the BREAKPOINT request directly;
//! otherwise a one-shot CLASS_PREPARE subscription filtered on the class name waits for the
//! class and finishes the arming from its handler.

use crate::class::{ClassInfo, MethodInfo};
use crate::debugger::DebuggerInner;
use crate::error::DebugError;
use dalvik_dex::disassemble;
use futures::future::BoxFuture;
use jdwp_client::commands::event_request::{self, Modifier};
use jdwp_client::events::{Composite, Event};
use jdwp_types::{
    EventKind, Location, RequestId, StepDepth, StepSize, SuspendPolicy, ThreadId, TypeTag,
};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Converts a JNI class signature (`Lsome/pkg/Name;`) to its java-form name (`some.pkg.Name`),
/// which is what ClassMatch patterns speak
pub fn jvm_to_java(signature: &str) -> Result<String, DebugError> {
    let inner = signature
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .ok_or_else(|| DebugError::BadSignature(signature.to_string()))?;
    Ok(inner.replace('/', "."))
}

/// What a breakpoint is keyed on
#[derive(Debug, Clone, Default)]
pub struct BreakpointSpec {
    /// JNI signature of the class to break in
    pub class_signature: String,
    /// Name of the method to break within
    pub method_name: String,
    /// JNI signature of the method to break within
    pub method_signature: String,
    /// 16-bit-code-unit offset into the method to break at
    pub bytecode_index: u64,
    /// How many times to pass the breakpoint without breaking
    pub skip_count: i32,
}

/// The async callback run when the breakpoint (or one of its steps) fires.
///
/// It receives the originating event, the composite it arrived in, and the breakpoint itself.
/// The VM stays suspended per the request's suspend policy until the callback (or whoever it
/// hands off to) resumes it.
pub type BreakpointCallback =
    Arc<dyn Fn(Event, Arc<Composite>, Arc<Breakpoint>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Inactive,
    /// Waiting on a filtered CLASS_PREPARE
    Deferred(RequestId),
    /// The BREAKPOINT request is live
    Armed(RequestId),
}

/// An immediate or deferred breakpoint.
///
/// Holds only a weak reference back to the debugger; a breakpoint cannot keep a torn-down
/// session alive.
pub struct Breakpoint {
    dbg: Weak<DebuggerInner>,
    spec: BreakpointSpec,
    callback: Mutex<BreakpointCallback>,
    state: Mutex<State>,
    /// One-shot release valve for callbacks that park themselves in [Breakpoint::wait]
    notify: Notify,
}

impl Breakpoint {
    pub(crate) fn new(dbg: Weak<DebuggerInner>, spec: BreakpointSpec) -> Arc<Breakpoint> {
        Arc::new(Breakpoint {
            dbg,
            spec,
            callback: Mutex::new(default_break_callback()),
            state: Mutex::new(State::Inactive),
            notify: Notify::new(),
        })
    }

    pub fn spec(&self) -> &BreakpointSpec {
        &self.spec
    }

    /// The request id currently backing this breakpoint, deferred or armed
    pub fn request_id(&self) -> Option<RequestId> {
        match *self.state.lock().expect("breakpoint state poisoned") {
            State::Inactive => None,
            State::Deferred(id) | State::Armed(id) => Some(id),
        }
    }

    /// Whether the BREAKPOINT request itself is installed (as opposed to still deferred)
    pub fn is_armed(&self) -> bool {
        matches!(
            *self.state.lock().expect("breakpoint state poisoned"),
            State::Armed(_)
        )
    }

    /// Replaces the callback run on fire. The default one loads the thread, logs the location
    /// and the disassembled instruction, and leaves the VM suspended.
    pub fn set_callback<F, Fut>(&self, callback: F)
    where
        F: Fn(Event, Arc<Composite>, Arc<Breakpoint>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        *self.callback.lock().expect("breakpoint callback poisoned") =
            Arc::new(move |event, composite, bp| Box::pin(callback(event, composite, bp)));
    }

    fn callback(&self) -> BreakpointCallback {
        self.callback
            .lock()
            .expect("breakpoint callback poisoned")
            .clone()
    }

    /// Installs the breakpoint: immediately if the class is prepared, deferred otherwise
    pub async fn arm(self: &Arc<Self>) -> Result<(), DebugError> {
        let dbg = self.dbg.upgrade().ok_or(DebugError::Gone)?;
        match dbg.class_by_signature(&self.spec.class_signature) {
            Some(class) => {
                // load members before looking the method up
                let class = dbg.class_info(class.type_id()).await?;
                let method = self.find_method(&class)?;
                self.enable(&dbg, &class, &method).await
            }
            None => self.defer(&dbg).await,
        }
    }

    /// Clears whatever subscription currently backs the breakpoint
    pub async fn cancel(&self) -> Result<(), DebugError> {
        let dbg = self.dbg.upgrade().ok_or(DebugError::Gone)?;
        let state = std::mem::replace(
            &mut *self.state.lock().expect("breakpoint state poisoned"),
            State::Inactive,
        );
        match state {
            State::Inactive => {}
            State::Deferred(id) => dbg.clear_event(EventKind::ClassPrepare, id).await,
            State::Armed(id) => dbg.clear_event(EventKind::Breakpoint, id).await,
        }
        Ok(())
    }

    /// Parks until someone calls [Breakpoint::poke]. Meant for callbacks that want an external
    /// nudge (a REPL command, typically) before resuming the VM; reusable across fires.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    /// Releases one parked [Breakpoint::wait]
    pub fn poke(&self) {
        self.notify.notify_one();
    }

    fn find_method(&self, class: &ClassInfo) -> Result<Arc<MethodInfo>, DebugError> {
        let members = class.members().expect("class_info loads members");
        members
            .method_by_key(&self.spec.method_name, &self.spec.method_signature)
            .cloned()
            .ok_or_else(|| DebugError::MethodNotFound {
                class_signature: self.spec.class_signature.clone(),
                name: self.spec.method_name.clone(),
                signature: self.spec.method_signature.clone(),
            })
    }

    /// Issues the BREAKPOINT request (suspend-all, location filter, skip count) and routes its
    /// events to the callback
    async fn enable(
        self: &Arc<Self>,
        dbg: &Arc<DebuggerInner>,
        class: &Arc<ClassInfo>,
        method: &Arc<MethodInfo>,
    ) -> Result<(), DebugError> {
        let location = Location {
            tag: TypeTag::Class,
            class: class.type_id().retag(),
            method: method.method_id,
            index: self.spec.bytecode_index,
        };
        let reply = dbg
            .client()
            .send(event_request::Set {
                event_kind: EventKind::Breakpoint,
                suspend_policy: SuspendPolicy::All,
                modifiers: vec![
                    Modifier::LocationOnly(location),
                    // a count of one fires on the first hit
                    Modifier::Count(self.spec.skip_count + 1),
                ],
            })
            .await?;

        *self.state.lock().expect("breakpoint state poisoned") = State::Armed(reply.request_id);

        let bp = self.clone();
        dbg.client()
            .dispatcher()
            .register_fn(reply.request_id, move |event, composite| {
                let bp = bp.clone();
                async move {
                    let callback = bp.callback();
                    callback(event, composite, bp.clone()).await;
                }
            });

        info!(
            "breakpoint set for {}.{}{} (reqid {})",
            jvm_to_java(&self.spec.class_signature)?,
            self.spec.method_name,
            self.spec.method_signature,
            reply.request_id,
        );
        Ok(())
    }

    /// Installs the one-shot CLASS_PREPARE watch that finishes the arming once the class shows up
    async fn defer(self: &Arc<Self>, dbg: &Arc<DebuggerInner>) -> Result<(), DebugError> {
        let pattern = jvm_to_java(&self.spec.class_signature)?;
        let reply = dbg
            .client()
            .send(event_request::Set {
                event_kind: EventKind::ClassPrepare,
                suspend_policy: SuspendPolicy::None,
                modifiers: vec![Modifier::ClassMatch(pattern.clone()), Modifier::Count(1)],
            })
            .await?;

        *self.state.lock().expect("breakpoint state poisoned") =
            State::Deferred(reply.request_id);

        let bp = self.clone();
        dbg.client()
            .dispatcher()
            .register_fn(reply.request_id, move |event, composite| {
                let bp = bp.clone();
                async move {
                    bp.on_deferred_class_prepare(event, composite).await;
                }
            });

        info!(
            "deferring breakpoint for {pattern}.{}{} (reqid {})",
            self.spec.method_name, self.spec.method_signature, reply.request_id,
        );
        Ok(())
    }

    async fn on_deferred_class_prepare(self: Arc<Self>, event: Event, _composite: Arc<Composite>) {
        let Some(dbg) = self.dbg.upgrade() else {
            return;
        };
        let Event::ClassPrepare {
            request_id,
            type_id,
            ..
        } = &event
        else {
            return;
        };

        // our filtered subscription can beat the global CLASS_PREPARE handler to it
        dbg.observe_class_prepare(&event);

        // one-shot: drop the watch before re-running the immediate path
        dbg.clear_event(EventKind::ClassPrepare, *request_id).await;
        *self.state.lock().expect("breakpoint state poisoned") = State::Inactive;

        let class = match dbg.class_info(*type_id).await {
            Ok(class) => class,
            Err(e) => {
                warn!("deferred breakpoint could not load prepared class: {e}");
                return;
            }
        };
        let method = match self.find_method(&class) {
            Ok(method) => method,
            Err(e) => {
                warn!("deferred breakpoint has no target: {e}");
                return;
            }
        };
        if let Err(e) = self.enable(&dbg, &class, &method).await {
            warn!("deferred breakpoint failed to arm: {e}");
        }
    }

    /// Issues a SINGLE_STEP request for `thread` and resumes the VM. The handler (the default
    /// one unless `step_handler` is given) clears the request when it fires.
    async fn single_step(
        self: &Arc<Self>,
        thread: ThreadId,
        depth: StepDepth,
        step_handler: Option<BreakpointCallback>,
    ) -> Result<RequestId, DebugError> {
        let dbg = self.dbg.upgrade().ok_or(DebugError::Gone)?;
        let reply = dbg
            .client()
            .send(event_request::Set {
                event_kind: EventKind::SingleStep,
                suspend_policy: SuspendPolicy::All,
                // MIN, not LINE: a line is several bytecode instructions on Dalvik
                modifiers: vec![Modifier::Step(thread, StepSize::Min, depth)],
            })
            .await?;

        let callback = step_handler.unwrap_or_else(default_step_callback);
        let bp = self.clone();
        dbg.client()
            .dispatcher()
            .register_fn(reply.request_id, move |event, composite| {
                let bp = bp.clone();
                let callback = callback.clone();
                async move {
                    callback(event, composite, bp).await;
                }
            });

        dbg.resume_vm().await?;
        Ok(reply.request_id)
    }

    /// Steps into the next instruction, following calls inward
    pub async fn step_into(self: &Arc<Self>, thread: ThreadId) -> Result<RequestId, DebugError> {
        self.single_step(thread, StepDepth::Into, None).await
    }

    /// Steps over the next instruction, skipping through any callee
    pub async fn step_over(self: &Arc<Self>, thread: ThreadId) -> Result<RequestId, DebugError> {
        self.single_step(thread, StepDepth::Over, None).await
    }

    /// Steps out of the current method
    pub async fn step_out(self: &Arc<Self>, thread: ThreadId) -> Result<RequestId, DebugError> {
        self.single_step(thread, StepDepth::Out, None).await
    }

    /// Like [Breakpoint::step_into] with a custom handler
    pub async fn step_into_with(
        self: &Arc<Self>,
        thread: ThreadId,
        handler: BreakpointCallback,
    ) -> Result<RequestId, DebugError> {
        self.single_step(thread, StepDepth::Into, Some(handler)).await
    }
}

impl std::fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breakpoint")
            .field("spec", &self.spec)
            .field("state", &*self.state.lock().expect("breakpoint state poisoned"))
            .finish_non_exhaustive()
    }
}

/// `Thread-N: pkg / Class.method(signature)` for a paused location
pub(crate) async fn break_location_str(
    dbg: &DebuggerInner,
    thread: u64,
    location: Location,
) -> Result<String, DebugError> {
    let class = dbg.class_info(location.class.retag()).await?;
    let members = class.members().expect("class_info loads members");
    let method = members
        .method_by_id(location.method)
        .ok_or_else(|| DebugError::MethodNotFound {
            class_signature: class.signature().to_string(),
            name: format!("#{}", location.method.get()),
            signature: String::new(),
        })?;

    let class_name = jvm_to_java(class.signature())?;
    let (package, short_name) = match class_name.rsplit_once('.') {
        Some((package, short_name)) => (package.to_string(), short_name.to_string()),
        None => (String::new(), class_name.clone()),
    };

    Ok(format!(
        "Thread-{thread}:  {package}\n  {short_name}.{}(\n  {}",
        method.name, method.signature
    ))
}

/// `NNNN: mnemonic [bytecode: hex]` for the instruction at a paused location
pub(crate) async fn instruction_str(
    dbg: &DebuggerInner,
    location: Location,
) -> Result<String, DebugError> {
    let bytecode = dbg
        .load_method_bytecode(location.class.retag(), location.method)
        .await?;

    let offset = location.index as usize * 2;
    let (text, next) = disassemble(&bytecode, offset)?;
    let hex: String = bytecode[offset..next]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Ok(format!("{:04x}: {text} [bytecode: {hex}]", location.index))
}

/// The stock breakpoint handler: one-shot the request, snapshot the thread, log where we are
pub(crate) fn default_break_callback() -> BreakpointCallback {
    Arc::new(|event, composite, bp| {
        Box::pin(async move {
            let Some(dbg) = bp.dbg.upgrade() else {
                return;
            };
            if let Some(request_id) = event.request_id() {
                dbg.clear_event(EventKind::Breakpoint, request_id).await;
            }
            let (Some(thread_id), Some(location)) = (event.thread(), event.location()) else {
                return;
            };
            match dbg.load_thread(thread_id).await {
                Ok(thread) => thread.set_event_context(event.clone(), composite.clone()),
                Err(e) => warn!("could not load broken thread: {e}"),
            }
            match break_location_str(&dbg, thread_id.get(), location).await {
                Ok(text) => info!("Bkpt@ {text}"),
                Err(e) => warn!("could not describe breakpoint location: {e}"),
            }
            match instruction_str(&dbg, location).await {
                Ok(text) => info!("{text}"),
                Err(e) => info!("bytecode instruction not available: {e}"),
            }
        })
    })
}

/// The stock step handler, identical to the break handler but clearing the step request
pub(crate) fn default_step_callback() -> BreakpointCallback {
    Arc::new(|event, composite, bp| {
        Box::pin(async move {
            let Some(dbg) = bp.dbg.upgrade() else {
                return;
            };
            if let Some(request_id) = event.request_id() {
                dbg.clear_event(EventKind::SingleStep, request_id).await;
            }
            let (Some(thread_id), Some(location)) = (event.thread(), event.location()) else {
                return;
            };
            match dbg.load_thread(thread_id).await {
                Ok(thread) => thread.set_event_context(event.clone(), composite.clone()),
                Err(e) => warn!("could not load stepped thread: {e}"),
            }
            match break_location_str(&dbg, thread_id.get(), location).await {
                Ok(text) => info!("Step@ {text}"),
                Err(e) => warn!("could not describe step location: {e}"),
            }
            match instruction_str(&dbg, location).await {
                Ok(text) => info!("{text}"),
                Err(e) => info!("bytecode instruction not available: {e}"),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jvm_to_java() {
        assert_eq!(
            jvm_to_java("Lsh/kau/playground/X;").unwrap(),
            "sh.kau.playground.X"
        );
        jvm_to_java("I").expect_err("primitive signatures are not class signatures");
        jvm_to_java("Lunterminated").expect_err("missing semicolon");
    }
}
