//! Budget mémoire partagé entre les fichiers traités en parallèle

use std::sync::{Condvar, Mutex, MutexGuard};

use tracing::trace;

/// Réserve des octets de tampons pixels, en bloquant tant que le budget est dépassé
///
/// Une demande supérieure au budget total est servie seule.
#[derive(Debug)]
pub struct MemoryBudget {
    capacity: u64,
    in_use: Mutex<u64>,
    released: Condvar,
}

/// Réservation active, rendue au budget à la destruction
#[derive(Debug)]
pub struct Reservation<'a> {
    budget: &'a MemoryBudget,
    bytes: u64,
}

impl MemoryBudget {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            in_use: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Budget exprimé en mégaoctets
    pub fn from_mb(mb: u64) -> Self {
        Self::new(mb.saturating_mul(1024 * 1024))
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.in_use.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Octets actuellement réservés
    pub fn in_use(&self) -> u64 {
        *self.lock()
    }

    /// Réserve `bytes`, en attendant qu'assez de budget soit libéré
    pub fn acquire(&self, bytes: u64) -> Reservation<'_> {
        let bytes = bytes.min(self.capacity);
        let mut in_use = self.lock();
        while *in_use > 0 && *in_use + bytes > self.capacity {
            trace!(bytes, in_use = *in_use, "Waiting for memory budget");
            in_use = self
                .released
                .wait(in_use)
                .unwrap_or_else(|e| e.into_inner());
        }
        *in_use += bytes;
        Reservation {
            budget: self,
            bytes,
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut in_use = self.budget.lock();
        *in_use = in_use.saturating_sub(self.bytes);
        drop(in_use);
        self.budget.released.notify_all();
    }
}
