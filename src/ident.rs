macro_rules! identifier {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Display,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(u64::MAX);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_u64(self) -> u64 {
                self.0
            }

            /// The identifier following this one.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }
    };
}

// Insertion-order tie-break. Zero means "not yet scheduled"; the first event added gets one.
identifier!(SeqId);

impl SeqId {
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

/// A stable handle to one slot of a [`SplayTree`](crate::store::SplayTree) arena.
///
/// The generation is bumped every time the slot is vacated, so a handle to an item that has
/// since been removed never resolves to whatever now occupies the slot.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_new::new,
)]
#[display(fmt = "{}v{}", index, generation)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}
