//! Frame-scoped transient buffer bookkeeping.
//!
//! Every allocation hands out a [`TransientTarget`]. The token is not `Clone`:
//! it ends its life either in a release or in a hand-off to the uber stage,
//! which releases it after all effects for the frame have been recorded.

use std::collections::HashMap;

use log::{trace, warn};

use super::{CommandBuffer, NameId, RenderTarget, TextureDesc};

/// Ownership of one live transient buffer.
///
/// The generation ties the token to a single allocation: once its id has been
/// reallocated the token is stale and releasing it does nothing.
#[must_use = "transient targets must be released or published"]
#[derive(Debug, PartialEq, Eq)]
pub struct TransientTarget {
    id: NameId,
    desc: TextureDesc,
    generation: u64,
}

impl TransientTarget {
    pub fn id(&self) -> NameId {
        self.id
    }

    pub fn desc(&self) -> TextureDesc {
        self.desc
    }

    pub fn target(&self) -> RenderTarget {
        RenderTarget::Temporary(self.id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy)]
struct Allocation {
    desc: TextureDesc,
    generation: u64,
}

/// Tracks which transient ids are live while a frame is recorded.
#[derive(Debug, Default)]
pub struct TransientTracker {
    live: HashMap<NameId, Allocation>,
    next_generation: u64,
    allocated: usize,
    released: usize,
}

impl TransientTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an allocation. A live id is released before it is reallocated,
    /// which leaves the earlier token stale.
    pub fn allocate(
        &mut self,
        cmd: &mut CommandBuffer,
        id: NameId,
        desc: TextureDesc,
    ) -> TransientTarget {
        if let Some(previous) = self.live.remove(&id) {
            warn!(
                "transient {id} reallocated while live ({}x{} -> {}x{}); releasing first",
                previous.desc.width, previous.desc.height, desc.width, desc.height
            );
            cmd.release_temporary_rt(id);
            self.released += 1;
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        cmd.get_temporary_rt(id, desc);
        self.live.insert(id, Allocation { desc, generation });
        self.allocated += 1;
        TransientTarget {
            id,
            desc,
            generation,
        }
    }

    /// Releases the allocation the token owns. Stale tokens are ignored.
    pub fn release(&mut self, cmd: &mut CommandBuffer, target: TransientTarget) {
        match self.live.get(&target.id) {
            Some(current) if current.generation == target.generation => {
                self.live.remove(&target.id);
                cmd.release_temporary_rt(target.id);
                self.released += 1;
            }
            Some(_) => trace!(
                "release of {} ignored: token is stale (generation {})",
                target.id,
                target.generation
            ),
            None => trace!("release of {} ignored: not allocated", target.id),
        }
    }

    /// Releasing an id that is not live is a no-op.
    pub fn release_id(&mut self, cmd: &mut CommandBuffer, id: NameId) {
        if self.live.remove(&id).is_some() {
            cmd.release_temporary_rt(id);
            self.released += 1;
        } else {
            trace!("release of {id} ignored: not allocated");
        }
    }

    pub fn is_live(&self, id: NameId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = NameId> + '_ {
        self.live.keys().copied()
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn released(&self) -> usize {
        self.released
    }
}
