//! Domain model (IDs, ownership records, absences, outcomes, notifications, ...).

pub mod absence;
pub mod errors;
pub mod events;
pub mod ids;
pub mod notification;
pub mod outcome;
pub mod ownership;
pub mod report;

pub use self::absence::{AbsenceRecord, distinct_absent_workers};
pub use self::errors::{ErrorKind, HandoverError};
pub use self::events::{DomainEvent, SweepKind};
pub use self::ids::{EntryId, TaskId, WorkerId};
pub use self::notification::{Notification, NotificationKey};
pub use self::outcome::{
    ArchiveEntry, NO_QUALIFIED_SUBSTITUTE, OutcomeRecord, ReallocationOutcome, ReturnOutcome,
};
pub use self::ownership::{OwnershipRow, TaskOwnership};
pub use self::report::{SweepReport, WorkerFailure};
