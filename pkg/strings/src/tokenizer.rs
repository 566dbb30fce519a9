//! Forward-only tokenizer over a byte slice with delimiter and quote
//! sets, used by the header-style parsers built on this crate.
//!
//! Works like an iterator: each call to one of the `next*` methods
//! updates the token span, which `token()` then exposes. Inside a quoted
//! run delimiters lose their meaning and `\` escapes the next byte; a
//! `\` outside a quoted run is an ordinary byte.

use crate::charset::{CharSet, Charset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Report delimiter runs as tokens of their own.
    pub return_delims: bool,
    /// Report empty tokens between adjacent delimiters and at the input
    /// boundaries.
    pub return_empty_tokens: bool,
}

#[derive(Debug, Clone)]
pub struct StringTokenizer<'a> {
    input: &'a [u8],
    token_begin: usize,
    token_end: usize,
    is_delim: bool,
}

#[derive(Default)]
struct AdvanceState {
    quote_char: u8,
    in_quote: bool,
    in_escape: bool,
}

// Returns false when a delimiter (outside quotes) was hit.
fn advance_one(
    delims: &impl CharSet,
    quotes: &impl CharSet,
    state: &mut AdvanceState,
    byte: u8,
) -> bool {
    if state.in_quote {
        if state.in_escape {
            state.in_escape = false;
        } else if byte == b'\\' {
            state.in_escape = true;
        } else if byte == state.quote_char {
            state.in_quote = false;
        }
    } else {
        if delims.contains(byte) {
            return false;
        }
        state.quote_char = byte;
        state.in_quote = quotes.contains(byte);
    }
    true
}

impl<'a> StringTokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            token_begin: 0,
            token_end: 0,
            is_delim: true,
        }
    }

    /// Advance to the next token, treating quotes as ordinary bytes.
    /// Returns false when the input is exhausted.
    pub fn next(&mut self, delims: &impl CharSet) -> bool {
        self.is_delim = false;
        loop {
            self.token_begin = self.token_end;
            if self.token_end == self.input.len() {
                self.is_delim = true;
                return false;
            }
            self.token_end += 1;
            if !delims.contains(self.input[self.token_begin]) {
                break;
            }
            // else: skip over the delimiter.
        }
        while self.token_end < self.input.len() && !delims.contains(self.input[self.token_end]) {
            self.token_end += 1;
        }
        true
    }

    /// Advance to the next token; runs between matching `quotes` bytes
    /// are kept whole even if they contain delimiters.
    pub fn next_quoted(&mut self, delims: &impl CharSet, quotes: &impl CharSet) -> bool {
        self.next_with(TokenizerOptions::default(), delims, quotes)
    }

    pub fn next_with(
        &mut self,
        options: TokenizerOptions,
        delims: &impl CharSet,
        quotes: &impl CharSet,
    ) -> bool {
        loop {
            if self.is_delim {
                // The previous token was a delimiter (or this is the
                // start), so the next one is a content token, possibly
                // empty.
                self.is_delim = false;
                self.token_begin = self.token_end;

                let mut state = AdvanceState::default();
                while self.token_end < self.input.len()
                    && advance_one(delims, quotes, &mut state, self.input[self.token_end])
                {
                    self.token_end += 1;
                }

                if options.return_empty_tokens || self.token_begin != self.token_end {
                    return true;
                }
            }

            // The previous token was content, so the next byte is a
            // delimiter; end-of-input counts as an implicit one.
            self.is_delim = true;
            self.token_begin = self.token_end;
            if self.token_end == self.input.len() {
                return false;
            }
            self.token_end += 1;
            if options.return_delims {
                return true;
            }
        }
    }

    /// Consume bytes in `chars` without producing a token.
    pub fn skip(&mut self, chars: &impl CharSet) {
        while self.token_begin < self.input.len() && chars.contains(self.input[self.token_begin]) {
            self.token_begin += 1;
        }
        self.token_end = self.token_begin;
    }

    pub fn skip_spaces(&mut self) {
        self.skip(&Charset::new([b' ']));
    }

    pub fn skip_token(&mut self) {
        self.token_begin = self.token_end;
    }

    /// Start over from the beginning of the input.
    pub fn reset(&mut self) {
        self.token_begin = 0;
        self.token_end = 0;
        self.is_delim = true;
    }

    /// True when the current token is a delimiter run reported under the
    /// `return_delims` option. Also true before the first `next*` call
    /// and after one returned false.
    pub fn token_is_delim(&self) -> bool {
        self.is_delim
    }

    pub fn token_begin(&self) -> usize {
        self.token_begin
    }

    pub fn token_end(&self) -> usize {
        self.token_end
    }

    pub fn token(&self) -> &'a [u8] {
        &self.input[self.token_begin..self.token_end]
    }
}
