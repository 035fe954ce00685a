//! Actor and tick-group registries.
//!
//! Both live in one [`Registry`] guarded by the manager's `RwLock`:
//!
//! - `actors` maps each actor to the interval of the group it belongs to;
//! - `groups` maps each interval to its [`TickGroup`] and member set.
//!
//! `Duration::ZERO` keys the every-frame group, which has no timer.
//! Creating or retiring a group posts a topology signal so the scheduler
//! rebuilds its wait-set.

use crate::actor::{ActorId, ActorRef};
use crate::error::{Error, Result};
use crossbeam_channel::{tick, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Actors sharing one tick interval.
///
/// Groups are shared with the scheduler's wait-set, so a group retired from
/// the registry stays alive until the scheduler drops its last reference.
#[derive(Debug)]
pub(crate) struct TickGroup {
    /// Interval key (`Duration::ZERO` for every-frame).
    interval: Duration,
    /// Timer channel, absent for the every-frame group.
    timer: Option<Receiver<Instant>>,
    /// When the group last fired, or when it was created.
    last_tick: Mutex<Instant>,
}

impl TickGroup {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: (!interval.is_zero()).then(|| tick(interval)),
            last_tick: Mutex::new(Instant::now()),
        }
    }

    pub(crate) const fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) const fn is_every_frame(&self) -> bool {
        self.interval.is_zero()
    }

    pub(crate) const fn timer(&self) -> Option<&Receiver<Instant>> {
        self.timer.as_ref()
    }

    /// Record a firing at `now` and return the time since the previous one.
    pub(crate) fn advance(&self, now: Instant) -> Duration {
        let mut last = self.last_tick.lock();
        let delta = now.saturating_duration_since(*last);
        *last = now;
        delta
    }
}

struct GroupEntry {
    group: Arc<TickGroup>,
    members: HashMap<ActorId, ActorRef>,
}

/// Registries of actors and tick groups.
pub(crate) struct Registry {
    actors: HashMap<ActorId, Duration>,
    groups: HashMap<Duration, GroupEntry>,
    /// Actors whose `begin_play` is running; they count as present.
    pending: HashSet<ActorId>,
    topology: Sender<()>,
}

impl Registry {
    pub(crate) fn new(topology: Sender<()>) -> Self {
        Self {
            actors: HashMap::new(),
            groups: HashMap::new(),
            pending: HashSet::new(),
            topology,
        }
    }

    pub(crate) fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id) || self.pending.contains(&id)
    }

    /// Claim `id` while its `begin_play` runs outside the lock.
    pub(crate) fn reserve(&mut self, id: ActorId) -> Result<()> {
        if self.contains(id) {
            return Err(Error::ActorAlreadyAdded);
        }
        self.pending.insert(id);
        Ok(())
    }

    pub(crate) fn release_reservation(&mut self, id: ActorId) {
        self.pending.remove(&id);
    }

    /// Record `actor` as a member of the group for `interval`.
    pub(crate) fn insert(&mut self, id: ActorId, actor: ActorRef, interval: Duration) -> Result<()> {
        if self.actors.contains_key(&id) {
            return Err(Error::ActorAlreadyAdded);
        }
        self.resolve_group(interval).members.insert(id, actor);
        self.actors.insert(id, interval);
        Ok(())
    }

    /// Detach an actor, retiring its group if it was the last member.
    pub(crate) fn remove(&mut self, id: ActorId) -> Result<ActorRef> {
        let interval = self.actors.remove(&id).ok_or(Error::ActorNotFound)?;
        let actor = self
            .groups
            .get_mut(&interval)
            .and_then(|entry| entry.members.remove(&id))
            .ok_or(Error::ActorNotFound)?;
        self.release_if_empty(interval);
        Ok(actor)
    }

    /// Existing group for `interval`, or a new empty one.
    fn resolve_group(&mut self, interval: Duration) -> &mut GroupEntry {
        let topology = &self.topology;
        self.groups.entry(interval).or_insert_with(|| {
            debug!(?interval, "creating tick group");
            signal(topology);
            GroupEntry {
                group: Arc::new(TickGroup::new(interval)),
                members: HashMap::new(),
            }
        })
    }

    /// Retire the group for `interval` if it has no members left.
    fn release_if_empty(&mut self, interval: Duration) {
        let empty = self
            .groups
            .get(&interval)
            .is_some_and(|entry| entry.members.is_empty());
        if empty {
            // Dropping the entry drops the registry's handle on the timer.
            self.groups.remove(&interval);
            debug!(?interval, "retiring tick group");
            signal(&self.topology);
        }
    }

    /// Copy of the current members of `group`.
    ///
    /// Empty if the group has been retired, even if a new group now exists
    /// for the same interval.
    pub(crate) fn members_of(&self, group: &Arc<TickGroup>) -> Vec<ActorRef> {
        self.groups
            .get(&group.interval())
            .filter(|entry| Arc::ptr_eq(&entry.group, group))
            .map(|entry| entry.members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// All live groups.
    pub(crate) fn groups(&self) -> impl Iterator<Item = &Arc<TickGroup>> {
        self.groups.values().map(|entry| &entry.group)
    }

    pub(crate) fn interval_of(&self, id: ActorId) -> Option<Duration> {
        self.actors.get(&id).copied()
    }

    pub(crate) fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub(crate) fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Take every registered actor and clear both registries.
    pub(crate) fn drain(&mut self) -> Vec<ActorRef> {
        self.actors.clear();
        let actors = self
            .groups
            .drain()
            .flat_map(|(_, entry)| entry.members.into_values())
            .collect();
        signal(&self.topology);
        actors
    }
}

/// Post a coalesced topology-changed signal.
fn signal(topology: &Sender<()>) {
    // Full means a rebuild is already pending.
    let _ = topology.try_send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;
    use crossbeam_channel::bounded;

    struct Dummy;

    impl Actor for Dummy {}

    fn actor() -> (ActorId, ActorRef) {
        let actor: ActorRef = Arc::new(Dummy);
        (ActorId::of(&actor), actor)
    }

    fn registry() -> (Registry, Receiver<()>) {
        let (tx, rx) = bounded(1);
        (Registry::new(tx), rx)
    }

    const MS_50: Duration = Duration::from_millis(50);

    #[test]
    fn test_same_interval_shares_group() {
        let (mut reg, topology) = registry();
        let (a_id, a) = actor();
        let (b_id, b) = actor();

        reg.insert(a_id, a, MS_50).unwrap();
        assert!(topology.try_recv().is_ok());

        reg.insert(b_id, b, MS_50).unwrap();
        // no new group, no new signal
        assert!(topology.try_recv().is_err());
        assert_eq!(reg.group_count(), 1);
        assert_eq!(reg.actor_count(), 2);

        reg.remove(a_id).unwrap();
        assert_eq!(reg.group_count(), 1);
        assert!(topology.try_recv().is_err());

        reg.remove(b_id).unwrap();
        assert_eq!(reg.group_count(), 0);
        assert!(topology.try_recv().is_ok());
    }

    #[test]
    fn test_distinct_intervals_get_distinct_groups() {
        let (mut reg, _topology) = registry();
        let (a_id, a) = actor();
        let (b_id, b) = actor();
        let (c_id, c) = actor();

        reg.insert(a_id, a, MS_50).unwrap();
        reg.insert(b_id, b, Duration::from_millis(100)).unwrap();
        reg.insert(c_id, c, Duration::ZERO).unwrap();
        assert_eq!(reg.group_count(), 3);
        assert_eq!(reg.interval_of(c_id), Some(Duration::ZERO));

        let every_frame: Vec<_> = reg.groups().filter(|g| g.is_every_frame()).collect();
        assert_eq!(every_frame.len(), 1);
        assert!(every_frame[0].timer().is_none());
        assert_eq!(reg.groups().filter(|g| g.timer().is_some()).count(), 2);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let (mut reg, _topology) = registry();
        let (a_id, a) = actor();

        reg.insert(a_id, a.clone(), MS_50).unwrap();
        assert!(matches!(
            reg.insert(a_id, a, Duration::from_secs(1)),
            Err(Error::ActorAlreadyAdded)
        ));
        assert_eq!(reg.interval_of(a_id), Some(MS_50));
        assert_eq!(reg.group_count(), 1);

        reg.remove(a_id).unwrap();
        assert!(matches!(reg.remove(a_id), Err(Error::ActorNotFound)));
    }

    #[test]
    fn test_reservation_counts_as_present() {
        let (mut reg, _topology) = registry();
        let (a_id, _a) = actor();

        reg.reserve(a_id).unwrap();
        assert!(reg.contains(a_id));
        assert!(matches!(reg.reserve(a_id), Err(Error::ActorAlreadyAdded)));
        // not a member yet
        assert_eq!(reg.actor_count(), 0);

        reg.release_reservation(a_id);
        assert!(!reg.contains(a_id));
    }

    #[test]
    fn test_retired_group_has_no_members() {
        let (mut reg, _topology) = registry();
        let (a_id, a) = actor();

        reg.insert(a_id, a.clone(), MS_50).unwrap();
        let old = reg.groups().next().unwrap().clone();
        assert_eq!(reg.members_of(&old).len(), 1);

        reg.remove(a_id).unwrap();
        reg.insert(a_id, a, MS_50).unwrap();

        // same interval, different group object
        assert!(reg.members_of(&old).is_empty());
        let new = reg.groups().next().unwrap().clone();
        assert_eq!(reg.members_of(&new).len(), 1);
    }

    #[test]
    fn test_drain() {
        let (mut reg, _topology) = registry();
        for interval in [MS_50, MS_50, Duration::ZERO] {
            let (id, actor) = actor();
            reg.insert(id, actor, interval).unwrap();
        }

        let drained = reg.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(reg.actor_count(), 0);
        assert_eq!(reg.group_count(), 0);
    }

    #[test]
    fn test_advance() {
        let group = TickGroup::new(MS_50);
        let later = Instant::now() + Duration::from_millis(30);
        assert!(group.advance(later) >= Duration::from_millis(30));
        assert_eq!(group.advance(later), Duration::ZERO);
    }
}
