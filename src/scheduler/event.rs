#![allow(clippy::non_canonical_partial_ord_impl)]

use smallvec::SmallVec;

use crate::{ident::SeqId, time::Time};

// Most loop iterations will not expire very many events
pub type Expired<P> = SmallVec<[Event<P>; 4]>;

/// A pending timed event.
///
/// Events order by deadline, then by the sequence id the scheduler assigned when they were
/// added. The payload never takes part in comparisons.
#[derive(Debug, Clone, derivative::Derivative, derive_new::new)]
#[derivative(
    PartialEq(bound = ""),
    Eq(bound = ""),
    PartialOrd(bound = ""),
    Ord(bound = "")
)]
pub struct Event<P> {
    deadline: Time,
    #[new(default)]
    seq: SeqId,
    #[derivative(PartialEq = "ignore", PartialOrd = "ignore", Ord = "ignore")]
    pub payload: P,
}

impl<P> Event<P> {
    pub fn deadline(&self) -> Time {
        self.deadline
    }

    /// The tie-break id, or [`SeqId::ZERO`] if the event has never been added.
    pub fn seq(&self) -> SeqId {
        self.seq
    }

    /// Clears the sequence id and sets a new deadline so the event can be added again.
    pub fn reset(&mut self, deadline: Time) {
        self.deadline = deadline;
        self.seq = SeqId::ZERO;
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn into_parts(self) -> (Time, P) {
        (self.deadline, self.payload)
    }

    pub(crate) fn assign(&mut self, seq: SeqId) {
        self.seq = seq;
    }

    // Only ever applied uniformly to every live event, which preserves their order.
    pub(crate) fn shift_back(&mut self, by: crate::time::Delta) {
        self.deadline -= by;
    }
}
