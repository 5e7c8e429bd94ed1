//! Hook registration API for stream execution.
//!
//! The [`HooksAPI`] is a registry of lifecycle observers, keyed by schedule.
//! Plugins register into it while the executor is being built; the executor
//! invokes it between rounds.
//!
//! # Multi-Schedule Registration
//!
//! ```ignore
//! hooks.register_observer::<(OnNodeExecuted, OnNodeFinished)>(
//!     "tracker",
//!     |event: &StreamEvent| match event {
//!         StreamEvent::NodeExecuted { label, value, .. } => println!("{label}: {value:?}"),
//!         StreamEvent::NodeFinished { label, .. } => println!("{label} done"),
//!         _ => {}
//!     },
//! )?;
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::events::StreamEvent;
use super::schedule::{IntoScheduleIds, ScheduleId};

/// Type-erased hook that receives `&StreamEvent`.
///
/// Most users should use [`HooksAPI::register_observer`] instead of creating
/// a `BoxedHook` directly.
pub struct BoxedHook {
    handler: Box<dyn Fn(&StreamEvent) + Send + Sync>,
}

impl BoxedHook {
    /// Wraps a handler.
    #[must_use]
    pub fn new(handler: impl Fn(&StreamEvent) + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Invokes the hook with the given event.
    pub fn invoke(&self, event: &StreamEvent) {
        (self.handler)(event);
    }
}

/// Errors that can occur during hook registration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HookRegistrationError {
    /// A hook with this name already exists on the schedule.
    #[error("hook '{name}' already registered for schedule '{}'", .schedule.type_name())]
    DuplicateName {
        /// The schedule where the duplicate was found.
        schedule: ScheduleId,
        /// The duplicate hook name.
        name: String,
    },
}

struct HookEntry {
    name: String,
    hook: BoxedHook,
}

/// API for registering and invoking stream execution hooks.
///
/// Uses interior mutability so that registration only needs `&self`.
#[derive(Default)]
pub struct HooksAPI {
    hooks: RwLock<HashMap<ScheduleId, Vec<HookEntry>>>,
}

impl HooksAPI {
    /// Creates a new empty hooks registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for one or more schedules.
    ///
    /// When `S` is a tuple, the hook is registered once per schedule under
    /// the name `"{name}@{schedule}"`.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is
    /// already taken on one of the schedules.
    pub fn register_observer<S, F>(
        &self,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        S: IntoScheduleIds,
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        let schedules = S::schedule_ids();
        let name = name.into();
        let hook = Arc::new(hook);
        let qualify = schedules.len() > 1;

        for schedule in schedules {
            let hook_name = if qualify {
                format!("{name}@{}", schedule.type_name())
            } else {
                name.clone()
            };
            let shared = Arc::clone(&hook);
            self.register_boxed(
                schedule,
                hook_name,
                BoxedHook::new(move |event: &StreamEvent| shared(event)),
            )?;
        }
        Ok(self)
    }

    /// Registers a pre-built [`BoxedHook`] for the given schedule.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is
    /// already taken on this schedule.
    pub fn register_boxed(
        &self,
        schedule: ScheduleId,
        name: impl Into<String>,
        hook: BoxedHook,
    ) -> Result<(), HookRegistrationError> {
        let name = name.into();

        let mut hooks = self.hooks.write();
        let entries = hooks.entry(schedule).or_default();

        if entries.iter().any(|entry| entry.name == name) {
            return Err(HookRegistrationError::DuplicateName { schedule, name });
        }

        entries.push(HookEntry { name, hook });
        Ok(())
    }

    /// Invokes all hooks registered for the given schedule, in registration
    /// order.
    ///
    /// Hooks must not register or remove hooks on this registry while being
    /// invoked.
    pub fn invoke(&self, schedule: ScheduleId, event: &StreamEvent) {
        let hooks = self.hooks.read();
        for entry in hooks.get(&schedule).into_iter().flatten() {
            entry.hook.invoke(event);
        }
    }

    /// Returns the number of hooks registered for the given schedule.
    #[must_use]
    pub fn hook_count(&self, schedule: ScheduleId) -> usize {
        self.hooks.read().get(&schedule).map_or(0, Vec::len)
    }

    /// Checks if a hook with the given name exists on the schedule.
    #[must_use]
    pub fn contains_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        self.hooks
            .read()
            .get(&schedule)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }

    /// Removes the named hook from the schedule. Returns false if it was not
    /// registered.
    pub fn remove_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(&schedule) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        let removed = entries.len() < before;
        if entries.is_empty() {
            hooks.remove(&schedule);
        }
        removed
    }

    /// Returns true if no hook is registered on any schedule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }
}

impl fmt::Debug for HooksAPI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        f.debug_map()
            .entries(hooks.iter().map(|(schedule, entries)| {
                (
                    schedule.type_name(),
                    entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
                )
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::schedule::{OnNodeExecuted, OnNodeFinished, OnRunStart};
    use crate::node::NodeId;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn finished(id: usize) -> StreamEvent {
        StreamEvent::NodeFinished {
            node_id: NodeId::new(id),
            label: "Src#abcde".into(),
        }
    }

    #[test]
    fn register_increments_count() {
        let api = HooksAPI::new();
        let schedule = ScheduleId::of::<OnRunStart>();

        api.register_observer::<OnRunStart, _>("first", |_: &StreamEvent| {})
            .expect("registration should succeed");
        api.register_observer::<OnRunStart, _>("second", |_: &StreamEvent| {})
            .expect("registration should succeed");

        assert_eq!(api.hook_count(schedule), 2);
    }

    #[test]
    fn invoke_calls_hooks_in_order() {
        let api = HooksAPI::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            let name_owned = name.to_owned();
            api.register_observer::<OnNodeFinished, _>(name, move |_: &StreamEvent| {
                order.lock().unwrap().push(name_owned.clone());
            })
            .unwrap();
        }

        api.invoke(ScheduleId::of::<OnNodeFinished>(), &finished(0));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn invoke_unknown_schedule_is_noop() {
        let api = HooksAPI::new();
        assert!(api.is_empty());
        api.invoke(ScheduleId::of::<OnRunStart>(), &finished(0));
    }

    #[test]
    fn removed_hooks_are_not_invoked() {
        let api = HooksAPI::new();
        let schedule = ScheduleId::of::<OnNodeFinished>();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        api.register_observer::<OnNodeFinished, _>("count", move |_: &StreamEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(api.remove_hook(schedule, "count"));
        assert!(!api.remove_hook(schedule, "count"));
        api.invoke(schedule, &finished(3));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(api.is_empty());
    }

    #[test]
    fn duplicate_error_names_the_schedule() {
        let err = HookRegistrationError::DuplicateName {
            schedule: ScheduleId::of::<OnRunStart>(),
            name: "log".into(),
        };
        let message = err.to_string();
        assert!(message.starts_with("hook 'log' already registered"));
        assert!(message.contains("OnRunStart"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let api = HooksAPI::new();
        let schedule = ScheduleId::of::<OnRunStart>();

        api.register_boxed(schedule, "my_hook", BoxedHook::new(|_| {}))
            .unwrap();
        let result = api.register_boxed(schedule, "my_hook", BoxedHook::new(|_| {}));

        match result {
            Err(HookRegistrationError::DuplicateName { name, .. }) => assert_eq!(name, "my_hook"),
            Ok(()) => panic!("expected DuplicateName error"),
        }
    }

    #[test]
    fn same_name_on_different_schedules_is_allowed() {
        let api = HooksAPI::new();
        api.register_observer::<OnRunStart, _>("logger", |_: &StreamEvent| {})
            .unwrap()
            .register_observer::<OnNodeFinished, _>("logger", |_: &StreamEvent| {})
            .unwrap();

        assert!(api.contains_hook(ScheduleId::of::<OnRunStart>(), "logger"));
        assert!(api.contains_hook(ScheduleId::of::<OnNodeFinished>(), "logger"));
        assert!(!api.contains_hook(ScheduleId::of::<OnNodeExecuted>(), "logger"));
    }

    #[test]
    fn tuple_registration_covers_every_schedule() {
        let api = HooksAPI::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        api.register_observer::<(OnNodeExecuted, OnNodeFinished), _>(
            "tracker",
            move |_: &StreamEvent| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        assert_eq!(api.hook_count(ScheduleId::of::<OnNodeExecuted>()), 1);
        assert_eq!(api.hook_count(ScheduleId::of::<OnNodeFinished>()), 1);

        api.invoke(ScheduleId::of::<OnNodeFinished>(), &finished(1));
        api.invoke(
            ScheduleId::of::<OnNodeExecuted>(),
            &StreamEvent::NodeExecuted {
                node_id: NodeId::new(1),
                label: "Src#abcde".into(),
                value: 1.into(),
            },
        );
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
