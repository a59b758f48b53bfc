// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Instance management for polyphonic sound playback.
//!
//! A fixed number of slots hold playing instances. When every slot is busy the
//! instance that started first is stolen.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::decoder::Decoder;
use super::format::PlaybackMode;
use super::sound::SoundAsset;

/// Identifies one playing instance. Handles stay valid until the instance is
/// stopped, finishes or is evicted; after that every operation on them is a
/// no-op, even if the slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId {
    slot: usize,
    id: u64,
}

impl InstanceId {
    /// Slot index in the pool.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Unique, monotonically increasing instance number.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.slot)
    }
}

/// A sound being played.
pub struct Instance {
    id: u64,
    pub(crate) asset: Arc<SoundAsset>,
    pub(crate) decoder: Box<dyn Decoder>,
    pub(crate) volume: u8,
    pub(crate) pan: u8,
    pub(crate) mode: PlaybackMode,
}

impl Instance {
    pub(crate) fn new(
        asset: Arc<SoundAsset>,
        decoder: Box<dyn Decoder>,
        volume: u8,
        pan: u8,
        mode: PlaybackMode,
    ) -> Self {
        Self {
            id: 0,
            asset,
            decoder,
            volume,
            pan,
            mode,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("asset", &self.asset)
            .field("volume", &self.volume)
            .field("pan", &self.pan)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Fixed-capacity slot table. Not synchronized; the engine wraps it in a mutex.
pub struct InstancePool {
    slots: Vec<Option<Instance>>,
    next_id: u64,
}

impl InstancePool {
    /// Creates a pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.resize_with(capacity.max(1), || None);
        Self { slots, next_id: 1 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Picks the first free slot, or the slot holding the oldest instance.
    fn claim_slot(&self) -> usize {
        if let Some(free) = self.slots.iter().position(|slot| slot.is_none()) {
            return free;
        }
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|instance| (index, instance.id)))
            .min_by_key(|&(_, id)| id)
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    /// Stores a new instance, evicting the oldest one if the pool is full.
    pub(crate) fn insert(&mut self, mut instance: Instance) -> InstanceId {
        let slot = self.claim_slot();
        if let Some(evicted) = self.slots[slot].take() {
            warn!(
                id = evicted.id,
                slot,
                path = evicted.asset.path(),
                "Pool full, evicting oldest instance"
            );
        }

        instance.id = self.next_id;
        self.next_id += 1;

        let handle = InstanceId {
            slot,
            id: instance.id,
        };
        debug!(instance = %handle, path = instance.asset.path(), "Instance started");
        self.slots[slot] = Some(instance);
        handle
    }

    /// Returns the instance a handle refers to, if it is still live.
    pub(crate) fn get_mut(&mut self, handle: InstanceId) -> Option<&mut Instance> {
        self.slots
            .get_mut(handle.slot)
            .and_then(|slot| slot.as_mut())
            .filter(|instance| instance.id == handle.id)
    }

    pub fn is_playing(&self, handle: InstanceId) -> bool {
        self.slots
            .get(handle.slot)
            .and_then(|slot| slot.as_ref())
            .is_some_and(|instance| instance.id == handle.id)
    }

    /// Frees the slot a handle refers to. Returns the instance if it was live.
    pub(crate) fn remove(&mut self, handle: InstanceId) -> Option<Instance> {
        if !self.is_playing(handle) {
            return None;
        }
        self.slots[handle.slot].take()
    }

    /// Frees every instance playing `asset`. Returns how many were stopped.
    pub(crate) fn remove_asset(&mut self, asset: &Arc<SoundAsset>) -> usize {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|instance| Arc::ptr_eq(&instance.asset, asset))
            {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Frees every slot. Returns how many instances were stopped.
    pub(crate) fn clear(&mut self) -> usize {
        let active = self.active();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        active
    }

    /// Mutable access to every slot, for the mixer.
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (usize, &mut Option<Instance>)> {
        self.slots.iter_mut().enumerate()
    }
}

impl fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstancePool")
            .field("capacity", &self.capacity())
            .field("active", &self.active())
            .field("next_id", &self.next_id)
            .finish()
    }
}
