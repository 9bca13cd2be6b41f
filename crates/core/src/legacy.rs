//! String-in, string-out wrapper with a process-wide last status.
//!
//! [`strip_limited_source`] keeps the calling convention of older callers
//! that check the outcome after the fact through [`last_status`]. The cell is
//! shared by every thread and holds whichever call finished last, so it is
//! meaningless under concurrent use. New code should call
//! [`strip_str`](crate::strip_str), which returns the status directly.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::state::Status;
use crate::strip::{StripConfig, strip_str, trim_final_newline};

static LAST_STATUS: AtomicU8 = AtomicU8::new(Status::Ok as u8);

/// Strip `source` in memory and drop one trailing newline.
///
/// Non-RTF input is copied through when `return_anyway` is set. The text is
/// returned when `return_anyway` is set or the status is [`Status::Ok`];
/// otherwise `None`. Either way the status is recorded for [`last_status`].
pub fn strip_limited_source(source: &str, return_anyway: bool) -> Option<String> {
    let config = StripConfig::default().copy_if_not_rtf(return_anyway);
    let result = strip_str(source, &config);
    LAST_STATUS.store(result.status.code(), Ordering::Relaxed);
    (return_anyway || result.status.is_ok())
        .then(|| trim_final_newline(&result.text).to_string())
}

/// Status recorded by the most recent [`strip_limited_source`] call.
pub fn last_status() -> Status {
    Status::from_code(LAST_STATUS.load(Ordering::Relaxed)).unwrap_or(Status::Ok)
}
