//! Shell event bus collaborator (spec.md §6): `subscribe`/`unsubscribe`
//! over `chpwd`/`precmd`/`preexec`. The real bus lives in the hosting
//! shell; this module defines the trait contract the composer consumes,
//! plus an in-memory implementation so [`crate::composer`]'s
//! `register_shell_events`/`unregister_shell_events` path is testable
//! without one.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellEvent {
    Chpwd,
    Precmd,
    Preexec,
}

/// Opaque subscription handle. The event bus holds no owning reference back
/// to the subscriber (spec.md §9 "Pointer graphs") — only this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

pub type EventHandler = Box<dyn Fn() + Send + 'static>;

pub trait ShellEventBus {
    fn subscribe(&mut self, event: ShellEvent, handler: EventHandler) -> SubscriptionHandle;
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
    /// Fire every handler subscribed to `event`, in subscription order.
    /// Not part of spec.md §6's named contract — the real bus calls
    /// handlers directly from shell hooks — but needed for the in-memory
    /// bus to be exercisable in tests.
    fn fire(&self, event: ShellEvent);
}

struct Subscription {
    id: u64,
    event: ShellEvent,
    handler: EventHandler,
}

/// An in-memory bus usable in tests and by the demo binary (spec.md §6
/// names the bus abstractly; the real one is a shell-hosted singleton).
#[derive(Default)]
pub struct InMemoryEventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShellEventBus for InMemoryEventBus {
    fn subscribe(&mut self, event: ShellEvent, handler: EventHandler) -> SubscriptionHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.subscriptions.push(Subscription { id, event, handler });
        SubscriptionHandle(id)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscriptions.retain(|s| s.id != handle.0);
    }

    fn fire(&self, event: ShellEvent) {
        for sub in &self.subscriptions {
            if sub.event == event {
                (sub.handler)();
            }
        }
    }
}
