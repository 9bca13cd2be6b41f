//! Per-document parser state.
//!
//! Everything a parse mutates lives in one [`ParserState`] value owned by the
//! parser loop: the group visibility stack, the active charset, and the
//! running [`Status`].

use serde::{Deserialize, Serialize};

use crate::charset::CharsetResolver;

/// Outcome of a strip operation.
///
/// Numeric values are stable and double as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Status {
    /// The document parsed cleanly.
    Ok = 0,
    /// The document parsed, but malformed input was recovered from.
    Corrupted = 1,
    /// The input does not start with `{\rtf`.
    NotRtf = 2,
}

impl Status {
    /// Stable numeric code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::Corrupted),
            2 => Some(Status::NotRtf),
            _ => None,
        }
    }

    /// Record a corruption signal. Only `Ok` moves; `Corrupted` and `NotRtf`
    /// are kept.
    pub fn degrade(&mut self) {
        if *self == Status::Ok {
            *self = Status::Corrupted;
        }
    }

    /// Whether this is [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        i32::from(status.code())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Ok => "ok",
            Status::Corrupted => "corrupted",
            Status::NotRtf => "not_rtf",
        })
    }
}

/// `}` was met with no open group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("group close with no open group")]
pub struct GroupUnderflow;

/// Visibility flags for the chain of open groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationStack {
    saved: Vec<bool>,
    visible: bool,
}

impl Default for DestinationStack {
    fn default() -> Self {
        Self {
            saved: Vec::new(),
            visible: true,
        }
    }
}

impl DestinationStack {
    /// Enter a group. The new group inherits the current visibility.
    pub fn push(&mut self) {
        self.saved.push(self.visible);
    }

    /// Leave a group, restoring the parent's visibility.
    ///
    /// On an empty stack the visibility is left as it is.
    pub fn pop(&mut self) -> Result<(), GroupUnderflow> {
        self.visible = self.saved.pop().ok_or(GroupUnderflow)?;
        Ok(())
    }

    /// Set the visibility of the current group.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether content of the current group is emitted.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of open groups.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// Mutable state of a single parse.
#[derive(Debug, Clone)]
pub struct ParserState {
    /// Group visibility.
    pub destinations: DestinationStack,
    /// Active charset for hex escapes.
    pub charset: CharsetResolver,
    /// Worst status observed so far.
    pub status: Status,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            destinations: DestinationStack::default(),
            charset: CharsetResolver::new(),
            status: Status::Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Corrupted.code(), 1);
        assert_eq!(Status::NotRtf.code(), 2);
        assert_eq!(i32::from(Status::NotRtf), 2);
        for s in [Status::Ok, Status::Corrupted, Status::NotRtf] {
            assert_eq!(Status::from_code(s.code()), Some(s));
        }
        assert_eq!(Status::from_code(3), None);
    }

    #[test]
    fn degrade_never_improves() {
        let mut s = Status::Ok;
        s.degrade();
        assert_eq!(s, Status::Corrupted);
        s.degrade();
        assert_eq!(s, Status::Corrupted);

        let mut s = Status::NotRtf;
        s.degrade();
        assert_eq!(s, Status::NotRtf);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Status::NotRtf).unwrap(), "\"not_rtf\"");
        assert_eq!(Status::Corrupted.to_string(), "corrupted");
    }

    #[test]
    fn groups_inherit_and_restore_visibility() {
        let mut d = DestinationStack::default();
        assert!(d.is_visible());
        d.push();
        d.set_visible(false);
        d.push();
        assert!(!d.is_visible(), "child inherits hidden parent");
        d.set_visible(true);
        d.pop().unwrap();
        assert!(!d.is_visible());
        d.pop().unwrap();
        assert!(d.is_visible());
        assert_eq!(d.depth(), 0);
    }

    #[test]
    fn pop_on_empty_keeps_visibility() {
        let mut d = DestinationStack::default();
        d.set_visible(false);
        assert_eq!(d.pop(), Err(GroupUnderflow));
        assert!(!d.is_visible());
    }

    #[test]
    fn fresh_state() {
        let s = ParserState::default();
        assert!(s.status.is_ok());
        assert!(s.destinations.is_visible());
        assert!(s.charset.active().is_none());
    }
}
