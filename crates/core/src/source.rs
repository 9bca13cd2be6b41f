//! Character sources feeding the stripping engine.
//!
//! The engine consumes an already-decoded character stream. [`StrSource`]
//! serves in-memory text; [`DecodeReader`] adapts any [`io::Read`] by
//! streaming its bytes through an `encoding_rs` decoder, so chunk boundaries
//! that split a multi-byte sequence are handled transparently.

use std::io::{self, Read};
use std::str::Chars;

use encoding_rs::{Decoder, Encoding};

/// A sequential source of decoded characters.
///
/// Modeled on a blocking reader: `read_chars` fills as much of `buf` as it
/// can and returns the count, with `0` meaning end of input.
pub trait CharSource {
    /// Read characters into `buf`, returning how many were written.
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize> {
        (**self).read_chars(buf)
    }
}

/// Character source over a borrowed string.
#[derive(Debug, Clone)]
pub struct StrSource<'a> {
    chars: Chars<'a>,
}

impl<'a> StrSource<'a> {
    /// Create a source yielding the characters of `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
        }
    }
}

impl<'a> From<&'a str> for StrSource<'a> {
    fn from(text: &'a str) -> Self {
        Self::new(text)
    }
}

impl CharSource for StrSource<'_> {
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.chars.next() {
                Some(c) => {
                    *slot = c;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

const READ_CHUNK: usize = 8 * 1024;

/// Character source decoding a byte reader with an `encoding_rs` encoding.
///
/// Malformed byte sequences decode to U+FFFD. A byte order mark matching the
/// encoding is honored and stripped.
pub struct DecodeReader<R> {
    reader: R,
    decoder: Decoder,
    bytes: Box<[u8]>,
    pending: String,
    pos: usize,
    finished: bool,
}

impl<R: Read> DecodeReader<R> {
    /// Decode `reader` with `encoding`.
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder(),
            bytes: vec![0u8; READ_CHUNK].into_boxed_slice(),
            pending: String::new(),
            pos: 0,
            finished: false,
        }
    }

    /// Decode `reader` as UTF-8.
    pub fn utf8(reader: R) -> Self {
        Self::new(reader, encoding_rs::UTF_8)
    }

    /// Read the next chunk of bytes and decode it into `pending`.
    fn refill(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.pos = 0;
        let read = self.reader.read(&mut self.bytes)?;
        let last = read == 0;
        let needed = self
            .decoder
            .max_utf8_buffer_length(read)
            .ok_or_else(|| io::Error::other("decoded chunk length overflows usize"))?;
        self.pending.reserve(needed);
        let (_result, _consumed, _replaced) =
            self.decoder
                .decode_to_string(&self.bytes[..read], &mut self.pending, last);
        if last {
            self.finished = true;
        }
        Ok(())
    }
}

impl<R: Read> CharSource for DecodeReader<R> {
    fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            if let Some(c) = self.pending[self.pos..].chars().next() {
                buf[n] = c;
                n += 1;
                self.pos += c.len_utf8();
                continue;
            }
            if n > 0 || self.finished {
                break;
            }
            self.refill()?;
        }
        Ok(n)
    }
}

impl<R> std::fmt::Debug for DecodeReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeReader")
            .field("encoding", &self.decoder.encoding().name())
            .field("buffered", &(self.pending.len() - self.pos))
            .field("finished", &self.finished)
            .finish()
    }
}
