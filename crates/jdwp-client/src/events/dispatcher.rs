use crate::events::{Composite, Event};
use futures::future::BoxFuture;
use jdwp_types::RequestId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A handler subscribed to one event-request id.
///
/// Handlers are cooperative: they run to completion on the dispatch task, one event at a time, in
/// the order the VM reported them. A handler is free to issue commands (those are serviced by the
/// reader task) and to register or clear further subscriptions.
pub trait EventHook: Send + Sync {
    fn handle(&self, event: Event, composite: Arc<Composite>) -> BoxFuture<'static, ()>;
}

impl<F, Fut> EventHook for F
where
    F: Fn(Event, Arc<Composite>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, event: Event, composite: Arc<Composite>) -> BoxFuture<'static, ()> {
        Box::pin(self(event, composite))
    }
}

/// The per-request-id handler registry.
///
/// `EventRequest.Set` hands out a request id; registering that id here routes every event the
/// subscription produces to the hook. Entries are removed when the subscription is cleared so a
/// stale in-flight event cannot reach a dead handler.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Mutex<HashMap<RequestId, Arc<dyn EventHook>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes events for `request_id` to `hook`, replacing any previous registration
    pub fn register(&self, request_id: RequestId, hook: Arc<dyn EventHook>) {
        self.handlers
            .lock()
            .expect("handler registry poisoned")
            .insert(request_id, hook);
    }

    /// Convenience wrapper over [EventDispatcher::register] for closures
    pub fn register_fn<F, Fut>(&self, request_id: RequestId, hook: F)
    where
        F: Fn(Event, Arc<Composite>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(request_id, Arc::new(hook));
    }

    /// Drops the registration for `request_id`, returning the hook if one was present
    pub fn remove(&self, request_id: RequestId) -> Option<Arc<dyn EventHook>> {
        self.handlers
            .lock()
            .expect("handler registry poisoned")
            .remove(&request_id)
    }

    /// The hook currently registered for `request_id`
    pub fn get(&self, request_id: RequestId) -> Option<Arc<dyn EventHook>> {
        self.handlers
            .lock()
            .expect("handler registry poisoned")
            .get(&request_id)
            .cloned()
    }

    /// How many subscriptions currently have handlers
    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .expect("handler registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp_types::SuspendPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_register_dispatch_remove() {
        let dispatcher = EventDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = RequestId::new(11);

        let counted = hits.clone();
        dispatcher.register_fn(id, move |_event, _composite| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });

        let composite = Arc::new(Composite {
            suspend_policy: SuspendPolicy::None,
            events: vec![],
        });
        let event = Event::VmDeath { request_id: id };
        dispatcher
            .get(id)
            .expect("registered")
            .handle(event.clone(), composite.clone())
            .await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        dispatcher.remove(id);
        assert!(dispatcher.get(id).is_none());
    }
}
