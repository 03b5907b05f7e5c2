//! Owner registry for binding tasks to host objects
//!
//! Hosts register each object that schedules work (a UI panel, a pooled
//! visual entity, an audio emitter) and destroy the registration when the
//! object goes away. Tasks bound through [`OwnerRegistry::probe`] are then
//! dropped by the scheduler without firing their completion callback.
//!
//! Keys are slotmap keys: a destroyed key never comes back to life, even
//! when its slot is reused by a later registration.
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::{OwnerRegistry, TaskOptions};
//!
//! let owners = OwnerRegistry::new();
//! let panel = owners.register("inventory_panel");
//!
//! scheduler.schedule(
//!     TaskOptions::new(0.3)
//!         .bound_to(owners.probe(panel))
//!         .on_complete(|_| { /* fade finished */ }),
//! )?;
//!
//! // Panel closed before the fade finished: the callback never runs
//! owners.destroy(panel);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::timers::LivenessCheck;

new_key_type! {
    /// Key for registered owners
    pub struct OwnerKey;
}

type OwnerMap = SlotMap<OwnerKey, String>;

/// Shared registry of live owners
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct OwnerRegistry {
    owners: Arc<RwLock<OwnerMap>>,
}

impl OwnerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live owner
    ///
    /// # Arguments
    /// * `label` - Human readable name used in logs
    pub fn register(&self, label: impl Into<String>) -> OwnerKey {
        self.owners.write().insert(label.into())
    }

    /// Mark an owner destroyed
    ///
    /// # Returns
    /// `true` if the owner was registered
    pub fn destroy(&self, key: OwnerKey) -> bool {
        match self.owners.write().remove(key) {
            Some(label) => {
                tracing::debug!("Owner '{}' destroyed", label);
                true
            }
            None => false,
        }
    }

    /// Whether the owner is still registered
    pub fn is_alive(&self, key: OwnerKey) -> bool {
        self.owners.read().contains_key(key)
    }

    /// Label given at registration
    pub fn label(&self, key: OwnerKey) -> Option<String> {
        self.owners.read().get(key).cloned()
    }

    /// Number of live owners
    pub fn len(&self) -> usize {
        self.owners.read().len()
    }

    /// Whether no owners are registered
    pub fn is_empty(&self) -> bool {
        self.owners.read().is_empty()
    }

    /// Liveness check for `key`, suitable for `TaskOptions::bound_to`
    ///
    /// The probe holds only a weak reference; once every clone of the
    /// registry is dropped all probes report their owner gone.
    pub fn probe(&self, key: OwnerKey) -> OwnerProbe {
        OwnerProbe {
            owners: Arc::downgrade(&self.owners),
            key,
        }
    }
}

impl std::fmt::Debug for OwnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerRegistry")
            .field("owners", &self.len())
            .finish()
    }
}

/// Liveness probe for one registered owner
#[derive(Debug, Clone)]
pub struct OwnerProbe {
    owners: Weak<RwLock<OwnerMap>>,
    key: OwnerKey,
}

impl OwnerProbe {
    /// Key this probe watches
    pub fn key(&self) -> OwnerKey {
        self.key
    }
}

impl LivenessCheck for OwnerProbe {
    fn is_alive(&self) -> bool {
        self.owners
            .upgrade()
            .is_some_and(|owners| owners.read().contains_key(self.key))
    }
}
