pub mod clock;
pub mod config;
pub mod error;
pub mod ident;
pub mod scheduler;
pub mod store;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{read_config, PeekMode, SchedulerConfig};
pub use error::Error;
pub use ident::{NodeId, SeqId};
pub use scheduler::{
    event::{Event, Expired},
    EventId, Scheduler,
};
pub use store::{Compare, Natural, SplayTree};
pub use time::{Delta, Time};
