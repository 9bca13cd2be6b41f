use std::io;

use crate::source::CharSource;

/// Number of characters held in the cursor's window.
pub const WINDOW_SIZE: usize = 100;

/// Failure reported by [`Cursor`] operations.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// The underlying source failed; the cursor is now exhausted.
    #[error("reading the input failed: {0}")]
    Io(#[from] io::Error),
    /// `unread` was called with nothing read since the last refill.
    #[error("nothing to unread at offset {offset}")]
    NothingToUnread {
        /// Characters consumed when the unread was requested.
        offset: usize,
    },
}

/// Buffered reader over a [`CharSource`] with one-step pushback.
///
/// Characters are pulled into a fixed window. When the window is used up the
/// last character of the old block is carried into slot zero before the
/// refill, so an [`unread`](Self::unread) right after a refill boundary still
/// resolves.
pub struct Cursor<S> {
    source: S,
    window: [char; WINDOW_SIZE],
    index: usize,
    len: usize,
    offset: usize,
    exhausted: bool,
    ended: bool,
}

impl<S: CharSource> Cursor<S> {
    /// Wrap `source`. Nothing is read until the first call to
    /// [`read`](Self::read) or [`fill_to`](Self::fill_to).
    pub fn new(source: S) -> Self {
        Self {
            source,
            window: ['\0'; WINDOW_SIZE],
            index: 0,
            len: 0,
            offset: 0,
            exhausted: false,
            ended: false,
        }
    }

    /// Read the next character, or `Ok(None)` at end of input.
    ///
    /// Once end of input has been returned, every later call returns
    /// `Ok(None)` as well. An I/O error is returned once and the cursor is
    /// treated as exhausted from then on.
    pub fn read(&mut self) -> Result<Option<char>, CursorError> {
        if self.ended {
            return Ok(None);
        }
        if self.index >= self.len && !self.refill()? {
            self.ended = true;
            return Ok(None);
        }
        let c = self.window[self.index];
        self.index += 1;
        self.offset += 1;
        Ok(Some(c))
    }

    /// Step back exactly one character.
    ///
    /// Requires at least one [`read`](Self::read) since the last refill; on
    /// violation the cursor is left unchanged and
    /// [`CursorError::NothingToUnread`] is returned.
    pub fn unread(&mut self) -> Result<(), CursorError> {
        if self.index == 0 {
            return Err(CursorError::NothingToUnread {
                offset: self.offset,
            });
        }
        self.index -= 1;
        self.offset -= 1;
        Ok(())
    }

    /// Buffer at least `n` characters (capped at [`WINDOW_SIZE`]) ahead of
    /// the read position, or everything that is left of the input.
    ///
    /// Meant for priming the window before the first read so a prefix can be
    /// inspected through [`buffered`](Self::buffered) without consuming it.
    pub fn fill_to(&mut self, n: usize) -> Result<&[char], CursorError> {
        let want = n.min(WINDOW_SIZE);
        while self.len - self.index < want && self.len < WINDOW_SIZE && !self.exhausted {
            let read = self.read_source(self.len)?;
            if read == 0 {
                self.exhausted = true;
            }
            self.len += read;
        }
        Ok(self.buffered())
    }

    /// Characters already buffered but not yet read.
    pub fn buffered(&self) -> &[char] {
        &self.window[self.index..self.len]
    }

    /// Number of characters consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Refill an exhausted window. Returns `false` at end of input.
    fn refill(&mut self) -> Result<bool, CursorError> {
        if self.exhausted {
            return Ok(false);
        }
        let keep = if self.len > 0 {
            self.window[0] = self.window[self.len - 1];
            1
        } else {
            0
        };
        self.index = keep;
        self.len = keep;
        let read = self.read_source(keep)?;
        if read == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        self.len += read;
        Ok(true)
    }

    /// Read from the source into `window[from..]`, retrying interrupted reads.
    fn read_source(&mut self, from: usize) -> Result<usize, CursorError> {
        loop {
            match self.source.read_chars(&mut self.window[from..]) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.exhausted = true;
                    return Err(CursorError::Io(e));
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for Cursor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("len", &self.len)
            .field("offset", &self.offset)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
