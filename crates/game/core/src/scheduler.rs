//! Delayed callbacks on the engine clock and the interface lock.
//!
//! A callback is created unstarted, configured (`set_delay`, `set_args`), then
//! started, which queues it at `now + delay`. The queue is keyed by
//! `(due, start sequence)`, so callbacks fire strictly by due time and, for
//! equal due times, in the order they were started. A fired callback is gone;
//! nothing can run twice.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ability::SlotRef;
use crate::engine::GameEngine;
use crate::events::GameEvent;
use crate::ledger::DamageType;
use crate::state::{EffectId, EntityId, Position};

/// Upper bound on callbacks fired by one drain, including ones queued while draining.
const MAX_DRAIN: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallbackId(pub u64);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackOwner {
    Ability(SlotRef),
    Effect(EffectId),
    Engine,
}

/// Arguments bound to a callback when it is configured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallbackArgs {
    pub caster: Option<EntityId>,
    pub targets: Vec<EntityId>,
    pub point: Option<Position>,
    pub amount: i32,
    pub damage_type: Option<DamageType>,
    pub dc: i32,
    pub slot: Option<SlotRef>,
}

pub trait DeferredTask: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, engine: &mut GameEngine, args: &CallbackArgs);
}

#[derive(Clone)]
pub struct DelayedCallback {
    id: CallbackId,
    owner: CallbackOwner,
    task: Arc<dyn DeferredTask>,
    delay_ms: u64,
    args: CallbackArgs,
}

impl DelayedCallback {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    pub fn owner(&self) -> CallbackOwner {
        self.owner
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn args(&self) -> &CallbackArgs {
        &self.args
    }

    /// Single-shot delay in seconds. Negative and non-finite values mean "now".
    pub fn set_delay(&mut self, seconds: f32) -> &mut Self {
        self.delay_ms = seconds_to_ms(seconds);
        self
    }

    pub fn set_args(&mut self, args: CallbackArgs) -> &mut Self {
        self.args = args;
        self
    }
}

impl fmt::Debug for DelayedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedCallback")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("task", &self.task.name())
            .field("delay_ms", &self.delay_ms)
            .finish()
    }
}

fn seconds_to_ms(seconds: f32) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Whether player input is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputState {
    Accepting,
    Locked,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
    created: BTreeMap<CallbackId, DelayedCallback>,
    queue: BTreeMap<(u64, u64), DelayedCallback>,
    lock_until: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Started callbacks that have not fired yet.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_until.is_some_and(|until| until > self.now_ms)
    }

    /// Locked while an explicit lock is running or any callback is in flight.
    pub fn input_state(&self) -> InputState {
        if self.is_locked() || !self.queue.is_empty() {
            InputState::Locked
        } else {
            InputState::Accepting
        }
    }

    fn create(&mut self, owner: CallbackOwner, task: Arc<dyn DeferredTask>) -> CallbackId {
        self.next_id += 1;
        let id = CallbackId(self.next_id);
        self.created.insert(
            id,
            DelayedCallback {
                id,
                owner,
                task,
                delay_ms: 0,
                args: CallbackArgs::default(),
            },
        );
        id
    }

    fn start(&mut self, id: CallbackId) -> Option<u64> {
        let callback = self.created.remove(&id)?;
        let due = self.now_ms.saturating_add(callback.delay_ms);
        self.next_seq += 1;
        self.queue.insert((due, self.next_seq), callback);
        Some(due)
    }

    /// Drops unstarted callbacks belonging to `owner`. Started ones still fire.
    fn discard_unstarted(&mut self, owner: CallbackOwner) -> usize {
        let before = self.created.len();
        self.created.retain(|_, callback| callback.owner != owner);
        before - self.created.len()
    }

    /// Callbacks created but not started yet.
    pub fn unstarted(&self) -> usize {
        self.created.len()
    }

    /// Takes the earliest callback due at or before `deadline`, moving the clock to its due time.
    fn pop_due(&mut self, deadline: Option<u64>) -> Option<DelayedCallback> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if deadline.is_some_and(|deadline| due > deadline) {
            return None;
        }
        self.now_ms = self.now_ms.max(due);
        self.queue.remove(&(due, seq))
    }
}

impl GameEngine {
    /// Creates an unstarted callback. Configure it with [`Self::callback_mut`], then start it.
    pub fn create_delayed_callback(&mut self, owner: CallbackOwner, task: Arc<dyn DeferredTask>) -> CallbackId {
        self.scheduler.create(owner, task)
    }

    /// An unstarted callback, for configuration.
    pub fn callback_mut(&mut self, id: CallbackId) -> Option<&mut DelayedCallback> {
        self.scheduler.created.get_mut(&id)
    }

    /// Queues a configured callback. Returns `false` if it was unknown or already started.
    pub fn start_callback(&mut self, id: CallbackId) -> bool {
        match self.scheduler.start(id) {
            Some(due) => {
                debug!(target: "game_core::scheduler", callback = %id, due, "callback started");
                true
            }
            None => false,
        }
    }

    /// Drops a callback that was created but never started.
    ///
    /// Returns `false` if it was unknown or already started.
    pub fn discard_callback(&mut self, id: CallbackId) -> bool {
        let discarded = self.scheduler.created.remove(&id).is_some();
        if discarded {
            debug!(target: "game_core::scheduler", callback = %id, "callback discarded");
        }
        discarded
    }

    /// Drops every unstarted callback owned by `owner`.
    pub fn discard_callbacks_of(&mut self, owner: CallbackOwner) -> usize {
        self.scheduler.discard_unstarted(owner)
    }

    /// Creates, configures and starts a callback in one go.
    pub fn schedule(
        &mut self,
        owner: CallbackOwner,
        task: Arc<dyn DeferredTask>,
        delay_seconds: f32,
        args: CallbackArgs,
    ) -> CallbackId {
        let id = self.create_delayed_callback(owner, task);
        if let Some(callback) = self.callback_mut(id) {
            callback.set_delay(delay_seconds).set_args(args);
        }
        self.start_callback(id);
        id
    }

    /// Seconds a projectile needs to fly from `from` to `to`.
    pub fn projectile_delay(&self, from: Position, to: Position) -> f32 {
        if self.config.projectile_speed <= 0.0 {
            return 0.0;
        }
        from.euclidean(to) / self.config.projectile_speed
    }

    /// Advances the clock, firing every callback that comes due on the way.
    pub fn advance_clock(&mut self, seconds: f32) -> usize {
        let deadline = self.scheduler.now_ms.saturating_add(seconds_to_ms(seconds));
        let fired = self.drain_callbacks(Some(deadline));
        self.scheduler.now_ms = self.scheduler.now_ms.max(deadline);
        self.expire_lock();
        fired
    }

    /// Fires everything queued, in order, moving the clock forward as needed.
    pub fn run_pending_callbacks(&mut self) -> usize {
        let fired = self.drain_callbacks(None);
        self.expire_lock();
        fired
    }

    fn drain_callbacks(&mut self, deadline: Option<u64>) -> usize {
        let mut fired = 0;
        while let Some(callback) = self.scheduler.pop_due(deadline) {
            let at_ms = self.scheduler.now_ms;
            debug!(target: "game_core::scheduler", callback = %callback.id, task = callback.task.name(), at_ms, "callback fired");
            callback.task.run(self, &callback.args);
            self.emit(GameEvent::CallbackFired {
                name: callback.task.name().to_string(),
                at_ms,
            });
            fired += 1;
            if fired >= MAX_DRAIN {
                warn!(target: "game_core::scheduler", pending = self.scheduler.pending(), "callback drain limit reached");
                break;
            }
        }
        fired
    }

    /// Blocks player input for `seconds`. Overlapping locks keep the later deadline.
    pub fn lock_interface(&mut self, seconds: f32) {
        let until = self.scheduler.now_ms.saturating_add(seconds_to_ms(seconds));
        self.scheduler.lock_until = Some(self.scheduler.lock_until.map_or(until, |current| current.max(until)));
    }

    pub fn unlock_interface(&mut self) {
        self.scheduler.lock_until = None;
    }

    pub fn input_state(&self) -> InputState {
        self.scheduler.input_state()
    }

    pub fn accepts_input(&self) -> bool {
        self.input_state() == InputState::Accepting
    }

    fn expire_lock(&mut self) {
        if self
            .scheduler
            .lock_until
            .is_some_and(|until| until <= self.scheduler.now_ms)
        {
            self.scheduler.lock_until = None;
        }
    }
}
