//! Position-tagged URL component store.
//!
//! Seven offsets into the referenced input buffer demarcate the
//! components; the parser emits them left to right and never moves one
//! it has already set. Marker offsets (`user_info_end`, `port_start`,
//! `query_start`, `fragment_start`) point at the delimiter byte itself
//! (`@`, `:`, `?`, `#`); a marker equal to its phrase boundary (or to
//! the buffer length) means the component is absent. A spanned
//! component is absent iff its start equals its end.

use bytes::Bytes;
use net::{Ipv4, Ipv6};

use crate::status::UriStatus;

/// What the host dispatch decided the host is.
#[derive(Debug, Clone, PartialEq)]
pub enum HostKind {
    /// No host (no authority, or an empty one).
    None,
    /// An ASCII registered name, stored in the buffer as-is.
    RegName,
    /// A registered name that went through the IDN encoder; the encoded
    /// ASCII form is carried here, the raw bytes stay in the buffer.
    Idn(Bytes),
    Ipv4(Ipv4),
    Ipv6(Ipv6),
}

#[derive(Debug, Clone)]
pub struct UriComponents {
    buffer: Bytes,
    scheme_end: usize,
    authority_start: usize,
    user_info_end: usize,
    port_start: usize,
    authority_end: usize,
    query_start: usize,
    fragment_start: usize,
    pub status: UriStatus,
    pub host_kind: HostKind,
}

impl UriComponents {
    pub fn new(buffer: Bytes) -> Self {
        let len = buffer.len();
        Self {
            buffer,
            scheme_end: 0,
            authority_start: 0,
            user_info_end: 0,
            port_start: 0,
            authority_end: 0,
            query_start: len,
            fragment_start: len,
            status: UriStatus::new(),
            host_kind: HostKind::None,
        }
    }

    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    pub fn set_scheme_end(&mut self, i: usize) {
        self.scheme_end = i;
    }

    pub fn set_authority_start(&mut self, i: usize) {
        self.authority_start = i;
        self.user_info_end = i;
        self.port_start = i;
        self.authority_end = i;
    }

    pub fn set_user_info_end(&mut self, i: usize) {
        self.user_info_end = i;
    }

    pub fn set_port_start(&mut self, i: usize) {
        self.port_start = i;
    }

    pub fn set_authority_end(&mut self, i: usize) {
        self.authority_end = i;
    }

    pub fn set_query_start(&mut self, i: usize) {
        self.query_start = i;
    }

    pub fn set_fragment_start(&mut self, i: usize) {
        self.fragment_start = i;
        // Keep the emission order monotonic when there was no query.
        if self.query_start > i {
            self.query_start = i;
        }
    }

    /// The seven offsets in emission order, for diagnostics.
    pub fn offsets(&self) -> [usize; 7] {
        [
            self.scheme_end,
            self.authority_start,
            self.user_info_end,
            self.port_start,
            self.authority_end,
            self.query_start,
            self.fragment_start,
        ]
    }

    fn span(&self, start: usize, end: usize) -> &[u8] {
        if start <= end && end <= self.buffer.len() {
            &self.buffer[start..end]
        } else {
            &[]
        }
    }

    fn has_authority(&self) -> bool {
        self.authority_start < self.authority_end
    }

    fn user_info_marker_present(&self) -> bool {
        self.has_authority()
            && self.user_info_end < self.authority_end
            && self.buffer.get(self.user_info_end) == Some(&b'@')
    }

    fn port_marker_present(&self) -> bool {
        self.port_start < self.authority_end && self.buffer.get(self.port_start) == Some(&b':')
    }

    pub fn scheme(&self) -> Option<&[u8]> {
        if self.scheme_end == 0 {
            None
        } else {
            Some(self.span(0, self.scheme_end))
        }
    }

    pub fn authority(&self) -> Option<&[u8]> {
        if self.has_authority() {
            Some(self.span(self.authority_start, self.authority_end))
        } else {
            None
        }
    }

    pub fn user_info(&self) -> Option<&[u8]> {
        if self.user_info_marker_present() {
            Some(self.span(self.authority_start, self.user_info_end))
        } else {
            None
        }
    }

    /// The user-info up to its first `:`.
    pub fn username(&self) -> Option<&[u8]> {
        self.user_info().map(|info| {
            match info.iter().position(|&b| b == b':') {
                Some(i) => &info[..i],
                None => info,
            }
        })
    }

    /// The user-info past its first `:`, when one is present.
    pub fn password(&self) -> Option<&[u8]> {
        let info = self.user_info()?;
        let colon = info.iter().position(|&b| b == b':')?;
        Some(&info[colon + 1..])
    }

    fn host_start(&self) -> usize {
        if self.user_info_marker_present() {
            self.user_info_end + 1
        } else {
            self.authority_start
        }
    }

    fn host_end(&self) -> usize {
        if self.port_marker_present() {
            self.port_start
        } else {
            self.authority_end
        }
    }

    /// The host as spelled in the buffer, brackets included for IPv6
    /// literals.
    pub fn host(&self) -> Option<&[u8]> {
        if !self.has_authority() {
            return None;
        }
        let span = self.span(self.host_start(), self.host_end());
        if span.is_empty() {
            None
        } else {
            Some(span)
        }
    }

    /// The ASCII form of the host: the IDN-encoded bytes when the host
    /// went through the encoder, the raw host otherwise.
    pub fn host_ascii(&self) -> Option<&[u8]> {
        match &self.host_kind {
            HostKind::Idn(encoded) => Some(encoded),
            _ => self.host(),
        }
    }

    pub fn port(&self) -> Option<&[u8]> {
        if !self.port_marker_present() {
            return None;
        }
        let span = self.span(self.port_start + 1, self.authority_end);
        if span.is_empty() {
            None
        } else {
            Some(span)
        }
    }

    pub fn port_number(&self) -> Option<u16> {
        let digits = self.port()?;
        let mut value: u32 = 0;
        for &b in digits {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + (b - b'0') as u32;
            if value > u16::MAX as u32 {
                return None;
            }
        }
        Some(value as u16)
    }

    pub fn path(&self) -> &[u8] {
        if self.status.has_error() {
            return &[];
        }
        let end = self.query_start.min(self.fragment_start).min(self.buffer.len());
        self.span(self.authority_end, end)
    }

    pub fn query(&self) -> Option<&[u8]> {
        if self.buffer.get(self.query_start) != Some(&b'?') {
            return None;
        }
        let end = self.fragment_start.min(self.buffer.len());
        Some(self.span(self.query_start + 1, end))
    }

    pub fn fragment(&self) -> Option<&[u8]> {
        if self.buffer.get(self.fragment_start) != Some(&b'#') {
            return None;
        }
        Some(self.span(self.fragment_start + 1, self.buffer.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::UriStatusCode;

    fn components(input: &str) -> UriComponents {
        crate::parser::parse_uri(
            Bytes::copy_from_slice(input.as_bytes()),
            &crate::parser::UriParseOptions::default(),
        )
    }

    #[test]
    fn spans_of_a_full_url() {
        let c = components("https://user:pw@example.com:8080/a/b?x=1#top");
        assert_eq!(c.scheme(), Some(&b"https"[..]));
        assert_eq!(c.authority(), Some(&b"user:pw@example.com:8080"[..]));
        assert_eq!(c.user_info(), Some(&b"user:pw"[..]));
        assert_eq!(c.username(), Some(&b"user"[..]));
        assert_eq!(c.password(), Some(&b"pw"[..]));
        assert_eq!(c.host(), Some(&b"example.com"[..]));
        assert_eq!(c.port(), Some(&b"8080"[..]));
        assert_eq!(c.port_number(), Some(8080));
        assert_eq!(c.path(), b"/a/b");
        assert_eq!(c.query(), Some(&b"x=1"[..]));
        assert_eq!(c.fragment(), Some(&b"top"[..]));
        assert!(c.status.is_valid());
    }

    #[test]
    fn absent_components() {
        let c = components("http://example.com");
        assert_eq!(c.user_info(), None);
        assert_eq!(c.password(), None);
        assert_eq!(c.port(), None);
        assert_eq!(c.path(), b"");
        assert_eq!(c.query(), None);
        assert_eq!(c.fragment(), None);

        let c = components("http://example.com:/x");
        assert_eq!(c.port(), None);
        assert_eq!(c.path(), b"/x");
    }

    #[test]
    fn empty_query_and_fragment_are_present() {
        let c = components("http://h/p?#");
        assert_eq!(c.query(), Some(&b""[..]));
        assert_eq!(c.fragment(), Some(&b""[..]));
    }

    #[test]
    fn fragment_without_query_stays_monotonic() {
        let c = components("http://h/p#frag");
        assert_eq!(c.query(), None);
        assert_eq!(c.fragment(), Some(&b"frag"[..]));
        let offsets = c.offsets();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]), "{:?}", offsets);
    }

    #[test]
    fn opaque_scheme_has_no_authority() {
        let c = components("mailto:someone@example.com");
        assert!(c.status.is_valid());
        assert_eq!(c.scheme(), Some(&b"mailto"[..]));
        assert_eq!(c.authority(), None);
        assert_eq!(c.host(), None);
        assert_eq!(c.user_info(), None);
        assert_eq!(c.host_kind, HostKind::None);
        assert_eq!(c.path(), b"someone@example.com");
    }

    #[test]
    fn ordering_invariant_over_many_inputs() {
        for input in [
            "http://example.com",
            "https://u@h:1/p?q#f",
            "file:///etc/passwd",
            "ws://h?q",
            "wss://h#f",
            "mailto:a@b",
            "http://[::1]:80/",
            "ftp://example.com/dir/file",
        ] {
            let c = components(input);
            assert!(!c.status.has_error(), "{}", input);
            let offsets = c.offsets();
            assert!(
                offsets.windows(2).all(|w| w[0] <= w[1]),
                "{}: {:?}",
                input,
                offsets
            );
        }
    }

    #[test]
    fn partial_components_survive_an_error() {
        let c = components("http://[::1/path");
        assert_eq!(c.status.error(), Some(UriStatusCode::Ipv6Unclosed));
        assert_eq!(c.scheme(), Some(&b"http"[..]));
        assert_eq!(c.host(), None);
        assert_eq!(c.path(), b"");
    }
}
