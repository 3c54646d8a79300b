// ── Coordinator state ──
//
// The published snapshot (immutable, replaced per cycle) and the lock
// table (mutable, reconciled per read).

mod locks;
mod snapshot;

pub(crate) use locks::{LockEntry, LockTable};
pub(crate) use snapshot::{LockRead, SnapshotBuilder};
pub use snapshot::Snapshot;
