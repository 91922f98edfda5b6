//! Template-keyed object pool
//!
//! Instances are cloned from a registered prototype the first time they are
//! needed and recycled afterwards. Every instance is bound to the template it
//! was created from and sits in exactly one of two places: its template's free
//! queue, or the active set. Membership is tracked per instance, so releasing
//! something that is already free can never enqueue it twice.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Identity of a registered prototype (the "prefab")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// Handle to a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Free,
    Active,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    template: TemplateId,
    membership: Membership,
    value: T,
}

/// Reuse cache of instances keyed by template identity
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    /// Prototype per template (index = template id)
    prototypes: Vec<T>,
    /// Free queue per template (index = template id)
    free: Vec<VecDeque<InstanceId>>,
    /// Every instance ever created (index = instance id)
    entries: Vec<Entry<T>>,
    active: usize,
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        Self {
            prototypes: Vec::new(),
            free: Vec::new(),
            entries: Vec::new(),
            active: 0,
        }
    }
}

impl<T: Clone> ObjectPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prototype and return the template handle bound to it
    pub fn register(&mut self, prototype: T) -> TemplateId {
        let id = TemplateId(self.prototypes.len() as u32);
        self.prototypes.push(prototype);
        self.free.push(VecDeque::new());
        id
    }

    /// Create `count` inactive instances of `template` and queue them as free
    pub fn prewarm(&mut self, template: TemplateId, count: usize) -> SimResult<()> {
        let slot = self.template_index(template)?;
        self.entries.reserve(count);
        for _ in 0..count {
            let id = self.push_entry(template, Membership::Free);
            self.free[slot].push_back(id);
        }
        log::debug!("Prewarmed {} instances of {}", count, template);
        Ok(())
    }

    /// Take an instance of `template`, reusing a free one when possible.
    ///
    /// A reused instance is reset to the template's prototype. When the free
    /// queue is empty a new instance is created, so this never runs dry.
    pub fn get(&mut self, template: TemplateId) -> SimResult<InstanceId> {
        let slot = self.template_index(template)?;
        let id = match self.free[slot].pop_front() {
            Some(id) => {
                let entry = &mut self.entries[id.0 as usize];
                entry.value.clone_from(&self.prototypes[slot]);
                entry.membership = Membership::Active;
                id
            }
            None => {
                let id = self.push_entry(template, Membership::Active);
                log::debug!("Pool grew: {} -> {} instances ({})", id.0, id.0 + 1, template);
                id
            }
        };
        self.active += 1;
        Ok(id)
    }

    fn push_entry(&mut self, template: TemplateId, membership: Membership) -> InstanceId {
        let id = InstanceId(self.entries.len() as u32);
        self.entries.push(Entry {
            template,
            membership,
            value: self.prototypes[template.0 as usize].clone(),
        });
        id
    }
}

impl<T> ObjectPool<T> {
    fn template_index(&self, template: TemplateId) -> SimResult<usize> {
        let index = template.0 as usize;
        if index < self.prototypes.len() {
            Ok(index)
        } else {
            Err(SimError::InvalidTemplate(template))
        }
    }

    /// Return an active instance to its template's free queue.
    ///
    /// Unknown handles and instances that are already free are ignored.
    /// Returns true when the instance actually changed hands.
    pub fn release(&mut self, id: InstanceId) -> bool {
        let Some(entry) = self.entries.get_mut(id.0 as usize) else {
            return false;
        };
        if entry.membership == Membership::Free {
            return false;
        }
        entry.membership = Membership::Free;
        self.free[entry.template.0 as usize].push_back(id);
        self.active -= 1;
        true
    }

    /// Release every active instance
    pub fn release_all(&mut self) {
        for index in 0..self.entries.len() {
            self.release(InstanceId(index as u32));
        }
    }

    /// Borrow an active instance
    pub fn instance(&self, id: InstanceId) -> Option<&T> {
        self.entries
            .get(id.0 as usize)
            .filter(|e| e.membership == Membership::Active)
            .map(|e| &e.value)
    }

    /// Mutably borrow an active instance
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        self.entries
            .get_mut(id.0 as usize)
            .filter(|e| e.membership == Membership::Active)
            .map(|e| &mut e.value)
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.entries
            .get(id.0 as usize)
            .is_some_and(|e| e.membership == Membership::Active)
    }

    /// Template an instance was created from
    pub fn template_of(&self, id: InstanceId) -> Option<TemplateId> {
        self.entries.get(id.0 as usize).map(|e| e.template)
    }

    /// Prototype registered for `template`
    pub fn prototype(&self, template: TemplateId) -> Option<&T> {
        self.prototypes.get(template.0 as usize)
    }

    /// All registered templates, in registration order
    pub fn templates(&self) -> impl Iterator<Item = TemplateId> + '_ {
        (0..self.prototypes.len()).map(|i| TemplateId(i as u32))
    }

    /// Instances created so far (free + active)
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Free instances queued for `template` (0 for unknown templates)
    pub fn free_count(&self, template: TemplateId) -> usize {
        self.free.get(template.0 as usize).map_or(0, VecDeque::len)
    }

    /// Active instances in id order
    pub fn active(&self) -> impl Iterator<Item = (InstanceId, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.membership == Membership::Active)
            .map(|(i, e)| (InstanceId(i as u32), &e.value))
    }

    /// Active instances in id order, mutably
    pub fn active_mut(&mut self) -> impl Iterator<Item = (InstanceId, &mut T)> + '_ {
        self.entries
            .iter_mut()
            .enumerate()
            .filter(|(_, e)| e.membership == Membership::Active)
            .map(|(i, e)| (InstanceId(i as u32), &mut e.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Rock {
        size: f32,
    }

    fn pool_with(templates: usize) -> (ObjectPool<Rock>, Vec<TemplateId>) {
        let mut pool = ObjectPool::new();
        let ids = (0..templates)
            .map(|i| pool.register(Rock { size: i as f32 + 1.0 }))
            .collect();
        (pool, ids)
    }

    #[test]
    fn test_prewarm_then_drain_then_grow() {
        let (mut pool, ids) = pool_with(1);
        let a = ids[0];
        pool.prewarm(a, 5).unwrap();
        assert_eq!(pool.free_count(a), 5);
        assert_eq!(pool.total_count(), 5);

        let taken: HashSet<_> = (0..5).map(|_| pool.get(a).unwrap()).collect();
        assert_eq!(taken.len(), 5);
        assert_eq!(pool.free_count(a), 0);
        assert_eq!(pool.active_count(), 5);

        // Sixth get constructs a fresh instance
        let sixth = pool.get(a).unwrap();
        assert!(!taken.contains(&sixth));
        assert_eq!(pool.total_count(), 6);
    }

    #[test]
    fn test_prewarm_multiple_templates() {
        let (mut pool, ids) = pool_with(3);
        for &t in &ids {
            pool.prewarm(t, 4).unwrap();
        }
        assert_eq!(pool.total_count(), 12);
        assert_eq!(pool.active_count(), 0);
        for &t in &ids {
            assert_eq!(pool.free_count(t), 4);
        }
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let (mut pool, _) = pool_with(1);
        assert!(matches!(
            pool.get(TemplateId(7)),
            Err(SimError::InvalidTemplate(TemplateId(7)))
        ));
        assert!(pool.prewarm(TemplateId(7), 2).is_err());
    }

    #[test]
    fn test_release_returns_to_own_template() {
        let (mut pool, ids) = pool_with(2);
        let a = pool.get(ids[0]).unwrap();
        let b = pool.get(ids[1]).unwrap();
        assert!(pool.release(a));
        assert!(pool.release(b));
        assert_eq!(pool.free_count(ids[0]), 1);
        assert_eq!(pool.free_count(ids[1]), 1);
        assert_eq!(pool.get(ids[1]).unwrap(), b);
    }

    #[test]
    fn test_double_release_is_noop() {
        let (mut pool, ids) = pool_with(1);
        let a = pool.get(ids[0]).unwrap();
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert_eq!(pool.free_count(ids[0]), 1);
    }

    #[test]
    fn test_release_of_never_active_instance_is_noop() {
        let (mut pool, ids) = pool_with(1);
        pool.prewarm(ids[0], 2).unwrap();
        assert!(!pool.release(InstanceId(0)));
        assert_eq!(pool.free_count(ids[0]), 2);
        assert!(!pool.release(InstanceId(99)));
    }

    #[test]
    fn test_reused_instance_is_reset() {
        let (mut pool, ids) = pool_with(1);
        let a = pool.get(ids[0]).unwrap();
        pool.instance_mut(a).unwrap().size = 42.0;
        pool.release(a);
        assert!(pool.instance(a).is_none());
        let again = pool.get(ids[0]).unwrap();
        assert_eq!(again, a);
        assert_eq!(pool.instance(again).unwrap().size, 1.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(usize),
        Release(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3).prop_map(Op::Get),
            (0usize..64).prop_map(Op::Release),
        ]
    }

    proptest! {
        #[test]
        fn prop_get_never_hands_out_an_active_instance(ops in prop::collection::vec(op_strategy(), 1..200)) {
            let (mut pool, ids) = pool_with(3);
            pool.prewarm(ids[0], 2).unwrap();
            let mut held: Vec<InstanceId> = Vec::new();
            let mut last_total = pool.total_count();

            for op in ops {
                match op {
                    Op::Get(t) => {
                        let id = pool.get(ids[t]).unwrap();
                        prop_assert!(!held.contains(&id));
                        prop_assert_eq!(pool.template_of(id), Some(ids[t]));
                        held.push(id);
                    }
                    Op::Release(i) => {
                        if held.is_empty() {
                            continue;
                        }
                        let id = held.swap_remove(i % held.len());
                        prop_assert!(pool.release(id));
                    }
                }
                prop_assert!(pool.total_count() >= last_total);
                last_total = pool.total_count();
                prop_assert_eq!(pool.active_count(), held.len());
                let free: usize = ids.iter().map(|&t| pool.free_count(t)).sum();
                prop_assert_eq!(free + pool.active_count(), pool.total_count());
            }
        }
    }
}
