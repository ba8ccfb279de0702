pub mod event;

use delegate::delegate;
use tracing::{debug, trace, warn};

use crate::{
    clock::Clock,
    config::{PeekMode, SchedulerConfig},
    error::Error,
    ident::{NodeId, SeqId},
    store::{Iter, Natural, SplayTree},
    time::{Delta, Time},
};

use self::event::{Event, Expired};

/// Identifies a live event for [`Scheduler::cancel`] and friends. Stops resolving once the
/// event leaves the scheduler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct EventId(NodeId);

/// A time-ordered queue of pending events.
///
/// Events fire strictly after their deadline: `pop_if_expired(now)` hands out an event only once
/// `deadline < now`. Events sharing a deadline come out in the order they were added.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = "P: std::fmt::Debug"))]
pub struct Scheduler<P> {
    tree: SplayTree<Event<P>, Natural>,
    last_seq: SeqId,
    peek: PeekMode,
}

impl<P> Default for Scheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Scheduler<P> {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(cfg: SchedulerConfig) -> Self {
        Self {
            tree: SplayTree::with_capacity(Natural, cfg.capacity),
            last_seq: SeqId::ZERO,
            peek: cfg.peek,
        }
    }

    /// Like [`with_config`](Self::with_config), but events still pending when the scheduler is
    /// shut down or dropped are passed to `hook` instead of being dropped silently.
    pub fn with_teardown(cfg: SchedulerConfig, hook: impl FnMut(Event<P>) + 'static) -> Self {
        let mut sched = Self::with_config(cfg);
        sched.tree.set_teardown(Box::new(hook));
        sched
    }

    delegate! {
        to self.tree {
            /// Number of pending events.
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
        }
    }

    /// The most recently assigned sequence id, or zero if nothing was ever added.
    pub fn last_seq(&self) -> SeqId {
        self.last_seq
    }

    /// Schedules `event`, assigning it the next sequence id.
    ///
    /// Fails if the event already carries a sequence id, i.e. it came back from
    /// [`cancel`](Self::cancel) or [`pop_if_expired`](Self::pop_if_expired) and was not
    /// [`reset`](Event::reset).
    pub fn add(&mut self, event: Event<P>) -> Result<EventId, Error> {
        if event.seq().is_assigned() {
            warn!(seq = %event.seq(), "attempted to add an event that is already sequenced");
            return Err(Error::AlreadyScheduled(event.seq()));
        }
        Ok(self.insert(event))
    }

    /// Schedules a new event carrying `payload` at `deadline`.
    pub fn schedule(&mut self, deadline: Time, payload: P) -> EventId {
        self.insert(Event::new(deadline, payload))
    }

    fn insert(&mut self, mut event: Event<P>) -> EventId {
        let seq = self.last_seq.next();
        event.assign(seq);
        let deadline = event.deadline();
        match self.tree.insert(event) {
            Ok(id) => {
                self.last_seq = seq;
                trace!(%id, %seq, %deadline, "event added");
                EventId(id)
            }
            // Sequence ids are unique, so no two events ever compare equal.
            Err(_) => unreachable!("duplicate sequence id {seq}"),
        }
    }

    /// Withdraws a pending event and hands it back to the caller.
    pub fn cancel(&mut self, id: EventId) -> Result<Event<P>, Error> {
        match self.tree.remove(id.0) {
            Ok(event) => {
                trace!(%id, seq = %event.seq(), "event cancelled");
                Ok(event)
            }
            Err(e) => {
                warn!(%id, "attempted to cancel an event that is not pending");
                Err(e)
            }
        }
    }

    /// Moves a pending event to a new deadline. The event gets a fresh sequence id, so it queues
    /// behind anything already scheduled for that instant.
    pub fn reschedule(&mut self, id: EventId, deadline: Time) -> Result<EventId, Error> {
        let mut event = self.cancel(id)?;
        event.reset(deadline);
        Ok(self.insert(event))
    }

    pub fn get(&self, id: EventId) -> Option<&Event<P>> {
        self.tree.get(id.0)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.tree.contains(id.0)
    }

    /// Mutable access to a pending event's payload. The deadline stays fixed.
    pub fn payload_mut(&mut self, id: EventId) -> Option<&mut P> {
        self.tree.get_mut(id.0).map(|ev| &mut ev.payload)
    }

    /// Removes and returns the earliest event if its deadline is strictly before `now`.
    pub fn pop_if_expired(&mut self, now: Time) -> Option<Event<P>> {
        let deadline = self.front()?.deadline();
        if deadline >= now {
            return None;
        }
        let event = self.tree.pop_min()?;
        trace!(seq = %event.seq(), %deadline, %now, "event expired");
        Some(event)
    }

    /// Removes every event whose deadline is strictly before `now`, earliest first.
    pub fn drain_expired(&mut self, now: Time) -> Expired<P> {
        let mut expired = Expired::new();
        while let Some(event) = self.pop_if_expired(now) {
            expired.push(event);
        }
        expired
    }

    /// Makes every pending event due at `now`.
    ///
    /// If the latest deadline is not already in the past, every deadline is moved back by the
    /// same amount so that the latest one lands on `now - 1`. Relative order and spacing are
    /// unchanged. Returns the shift applied, if any.
    ///
    /// Fails with [`Error::FlushOverflow`], leaving every deadline untouched, if the shift or any
    /// shifted deadline does not fit in a [`Time`].
    pub fn flush_to_now(&mut self, now: Time) -> Result<Option<Delta>, Error> {
        let Some(latest) = self.back().map(Event::deadline) else {
            return Ok(None);
        };
        if latest < now {
            return Ok(None);
        }
        // The earliest deadline moves furthest below zero; if it fits, every other one does.
        let earliest = self.tree.peek_min().map_or(latest, Event::deadline);
        let shift = latest
            .checked_since(now)
            .and_then(|span| span.checked_add(Delta::ONE))
            .filter(|&shift| earliest.checked_sub(shift).is_some())
            .ok_or_else(|| {
                warn!(%latest, %earliest, %now, "flush shift out of range");
                Error::FlushOverflow { latest, now }
            })?;
        self.tree.for_each_mut(|ev| ev.shift_back(shift));
        debug!(%shift, %now, pending = self.tree.len(), "flushed pending events");
        Ok(Some(shift))
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&mut self) -> Option<Time> {
        self.front().map(Event::deadline)
    }

    /// The earliest pending deadline, without restructuring the tree.
    pub fn peek_deadline(&self) -> Option<Time> {
        self.tree.peek_min().map(Event::deadline)
    }

    /// How long from `now` until the earliest event becomes poppable, or zero if it already is.
    pub fn time_until_next(&mut self, now: Time) -> Option<Delta> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_add(Delta::ONE).saturating_since(now))
    }

    /// Pending events, earliest first.
    pub fn iter(&self) -> Iter<'_, Event<P>, Natural> {
        self.tree.iter()
    }

    pub fn pop_expired_with(&mut self, clock: &impl Clock) -> Option<Event<P>> {
        self.pop_if_expired(clock.now())
    }

    pub fn flush_with(&mut self, clock: &impl Clock) -> Result<Option<Delta>, Error> {
        self.flush_to_now(clock.now())
    }

    /// Tears the scheduler down, returning how many events were still pending.
    pub fn shutdown(self) -> usize {
        let pending = self.tree.len();
        debug!(pending, last_seq = %self.last_seq, "scheduler shut down");
        pending
    }

    fn front(&mut self) -> Option<&Event<P>> {
        match self.peek {
            PeekMode::Splay => self.tree.min(),
            PeekMode::ReadOnly => self.tree.peek_min(),
        }
    }

    fn back(&mut self) -> Option<&Event<P>> {
        match self.peek {
            PeekMode::Splay => self.tree.max(),
            PeekMode::ReadOnly => self.tree.peek_max(),
        }
    }
}
