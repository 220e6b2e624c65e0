use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a queue entry, used to correlate log lines.
pub type EntryId = u64;

/// Monotonically increasing sequence for entry identifiers.
///
/// Local to the current process and shared by every lock instance.
static ENTRY_SEQ: AtomicU64 = AtomicU64::new(1);

/// Returns next entry identifier.
pub(crate) fn next_entry_id() -> EntryId {
    ENTRY_SEQ.fetch_add(1, Ordering::Relaxed)
}
