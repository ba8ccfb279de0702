use crate::{
    ident::{NodeId, SeqId},
    time::Time,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("item compares equal to a live member of the store")]
    DuplicateKey,

    #[error("handle {0} does not refer to a live member")]
    NotMember(NodeId),

    #[error("event already carries sequence id {0}; reset it before adding it again")]
    AlreadyScheduled(SeqId),

    #[error("cannot shift deadlines back so that {latest} lands before {now}")]
    FlushOverflow { latest: Time, now: Time },

    #[error("serde error")]
    Serde(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}
