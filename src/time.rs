use std::ops::{Add, AddAssign, Sub, SubAssign};

macro_rules! time_unit {
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
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(i64::MAX);

            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn into_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(val: i64) -> Self {
                Self(val)
            }
        }
    };
}

// An absolute timestamp, in whatever unit the clock source uses. Signed like `time_t`, since a
// flush can push deadlines below zero when `now` is small.
time_unit!(Time);

impl Time {
    pub const MIN: Time = Self::new(i64::MIN);

    /// The span from `earlier` to `self`, or zero if `earlier` is not actually earlier.
    pub fn saturating_since(self, earlier: Time) -> Delta {
        Delta::new(self.0.saturating_sub(earlier.0).max(0))
    }

    /// The span from `earlier` to `self`, or `None` if it does not fit in a [`Delta`].
    pub fn checked_since(self, earlier: Time) -> Option<Delta> {
        self.0.checked_sub(earlier.0).map(Delta::new)
    }

    pub fn checked_sub(self, rhs: Delta) -> Option<Time> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Delta) -> Time {
        Self(self.0.saturating_add(rhs.0))
    }
}

// A span between two timestamps. Only ever constructed non-negative by this crate.
time_unit!(Delta);

impl Delta {
    pub fn checked_add(self, rhs: Delta) -> Option<Delta> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl Add<Delta> for Time {
    type Output = Time;

    fn add(self, rhs: Delta) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Delta> for Time {
    type Output = Time;

    fn sub(self, rhs: Delta) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub<Time> for Time {
    type Output = Delta;

    fn sub(self, rhs: Time) -> Self::Output {
        Delta::new(self.0 - rhs.0)
    }
}

impl AddAssign<Delta> for Time {
    fn add_assign(&mut self, rhs: Delta) {
        *self = Self(self.0 + rhs.0)
    }
}

impl SubAssign<Delta> for Time {
    fn sub_assign(&mut self, rhs: Delta) {
        *self = Self(self.0 - rhs.0)
    }
}

impl Add<Delta> for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
