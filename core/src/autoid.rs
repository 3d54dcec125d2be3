use tracing::{debug, warn};

use crate::{
    entity::Entity,
    error::MutationError,
    key::{Identifier, Key},
};

/// Remembers, in order, which entities of one batch are waiting for a server-generated id.
///
/// A tracker belongs to exactly one batch operation. [`AutoIdTracker::reconcile`] consumes it,
/// so pending registrations can never leak into a later commit and be resolved against the
/// wrong response.
#[derive(Debug, Default)]
pub struct AutoIdTracker {
    pending: Vec<Entity>,
}

impl AutoIdTracker {
    pub fn new() -> Self { Self::default() }

    /// Append `entity` to the pending list. Order of registration is the only thing that ties a
    /// generated id back to its entity.
    pub fn register(&mut self, entity: Entity) { self.pending.push(entity); }

    pub fn len(&self) -> usize { self.pending.len() }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    pub fn contains(&self, entity: &Entity) -> bool { self.pending.iter().any(|pending| pending.same_entity(entity)) }

    /// Assign `generated[i]` to the i-th registered entity by giving it a new, complete key.
    ///
    /// Returns the resolved keys in registration order. If the count of generated ids differs
    /// from the count of registrations, the overlapping prefix is still resolved and
    /// [`MutationError::ProtocolConsistency`] is returned.
    pub fn reconcile(self, generated: Vec<Identifier>) -> Result<Vec<Key>, MutationError> {
        let requested = self.pending.len();
        let returned = generated.len();

        let resolved: Vec<Key> = self
            .pending
            .iter()
            .zip(generated)
            .map(|(entity, identifier)| {
                let key = entity.key().complete_with(identifier);
                entity.set_key(key.clone());
                key
            })
            .collect();

        if requested != returned {
            warn!("AutoIdTracker.reconcile: {} ids generated for {} entities, resolved {}", returned, requested, resolved.len());
            return Err(MutationError::ProtocolConsistency { requested, returned });
        }
        debug!("AutoIdTracker.reconcile: resolved {} keys", resolved.len());
        Ok(resolved)
    }
}
