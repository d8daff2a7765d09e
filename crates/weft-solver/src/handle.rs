//! Thread-safe shared access to a [`ClothInstance`].
//!
//! A simulation thread and a UI or render thread can hold clones of the same
//! handle. Every operation locks the instance for its duration, so a
//! rebuild never overlaps an update.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use weft_contact::Collider;
use weft_math::Vec3;
use weft_types::WeftResult;

use crate::instance::ClothInstance;
use crate::strategy::StepResult;

#[derive(Clone)]
pub struct SimulationHandle {
    inner: Arc<Mutex<ClothInstance>>,
}

impl SimulationHandle {
    pub fn new(instance: ClothInstance) -> Self {
        Self {
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    /// Locks the instance for arbitrary access.
    pub fn lock(&self) -> MutexGuard<'_, ClothInstance> {
        self.inner.lock()
    }

    pub fn update(&self) -> WeftResult<StepResult> {
        self.inner.lock().update()
    }

    pub fn unpin(&self) {
        self.inner.lock().unpin();
    }

    pub fn restart(&self) {
        self.inner.lock().restart();
    }

    pub fn rebuild(&self) -> WeftResult<()> {
        self.inner.lock().rebuild()
    }

    pub fn add_collider(&self, collider: Box<dyn Collider>) {
        self.inner.lock().add_collider(collider);
    }

    /// Recomputes normals and copies out world positions and normals.
    pub fn snapshot(&self) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut instance = self.inner.lock();
        instance.compute_normals();
        let positions = instance.world_positions();
        let normals = instance.cloth().nodes.iter().map(|n| n.normal).collect();
        (positions, normals)
    }
}
