mod id;
mod timeline;

pub use self::{id::StationId, timeline::Timeline};

/// One station attached to the shared bus.
///
/// A station owns its [`Timeline`] of pending transmission attempts
/// and two independent retry counters: one for collisions and one for
/// busy-sensing deferrals (the latter only advances in non-persistent
/// mode). Both counters reset to zero whenever the head packet leaves
/// the timeline, whether it was sent or dropped.
#[derive(Debug, Clone)]
pub(crate) struct Station {
    id: StationId,
    timeline: Timeline,
    collision_retries: u32,
    sensing_retries: u32,
}

impl Station {
    pub(crate) fn new(id: StationId) -> Self {
        Self {
            id,
            timeline: Timeline::new(),
            collision_retries: 0,
            sensing_retries: 0,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> StationId {
        self.id
    }

    #[inline]
    pub(crate) fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[inline]
    pub(crate) fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    #[cfg(test)]
    pub(crate) fn collision_retries(&self) -> u32 {
        self.collision_retries
    }

    #[cfg(test)]
    pub(crate) fn sensing_retries(&self) -> u32 {
        self.sensing_retries
    }

    /// Registers one more collision for the head packet and returns
    /// the new counter value.
    pub(crate) fn next_collision_retry(&mut self) -> u32 {
        self.collision_retries += 1;
        self.collision_retries
    }

    /// Registers one more busy-sensing failure for the head packet and
    /// returns the new counter value.
    pub(crate) fn next_sensing_retry(&mut self) -> u32 {
        self.sensing_retries += 1;
        self.sensing_retries
    }

    /// Both counters go back to `Idle`: the head packet left the
    /// timeline (sent or dropped).
    pub(crate) fn reset_retries(&mut self) {
        self.collision_retries = 0;
        self.sensing_retries = 0;
    }
}
