//! The URL parser: a tagged loop over an explicit state enum.
//!
//! Errors halt emission; the components set before the error stay
//! readable. Warnings accumulate without halting.

use bytes::Bytes;
use net::Ipv4;
use strings::ascii::{iequals, CaseSide};
use strings::charset::{charset_range, CharMap};

use crate::components::{HostKind, UriComponents};
use crate::host::{self, IdnEncoder};
use crate::status::{UriStatusCode, UriWarning};

/// Parse-time options. The default is the strict WHATWG posture: no
/// whitespace stripping, no empty IPv4 octets, scheme errors are fatal,
/// and no IDN encoder.
#[derive(Clone, Copy, Default)]
pub struct UriParseOptions<'a> {
    /// Tolerate any number of trailing dots in a host before the IPv4
    /// parse instead of just one.
    pub multiple_trailing_empty_ipv4_octets: bool,
    /// Allow empty octet positions (`1..2.3`) with a warning.
    pub allow_ipv4_empty_octets: bool,
    /// Strip leading bytes <= 0x20 before parsing.
    pub strip_leading_c0_and_space: bool,
    /// Remove every ASCII tab, LF and CR from the input first.
    pub strip_tabs_and_newlines: bool,
    /// Record invalid scheme characters as a warning instead of an
    /// error.
    pub tolerate_invalid_scheme_char: bool,
    /// Consulted for registered names carrying non-ASCII bytes.
    pub idn_encoder: Option<&'a dyn IdnEncoder>,
}

static SCHEME_CHARS: CharMap = charset_range(b'a', b'z')
    .with_range(b'A', b'Z')
    .with_range(b'0', b'9')
    .with_chars(b"+-.");

// Schemes with standard authority semantics, stored lowercase.
static SPECIAL_SCHEMES: [&[u8]; 6] = [b"http", b"https", b"ftp", b"ws", b"wss", b"file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Authority,
    Host { host_start: usize, auth_end: usize },
    Ipv6Host { host_start: usize },
    Port { auth_end: usize },
    Path,
    Query,
    Fragment,
}

fn preprocess(mut input: Bytes, options: &UriParseOptions<'_>) -> Bytes {
    if options.strip_leading_c0_and_space {
        let start = input
            .iter()
            .position(|&b| b > 0x20)
            .unwrap_or(input.len());
        input = input.slice(start..);
    }
    if options.strip_tabs_and_newlines
        && input.iter().any(|&b| matches!(b, b'\t' | b'\n' | b'\r'))
    {
        let filtered: Vec<u8> = input
            .iter()
            .copied()
            .filter(|&b| !matches!(b, b'\t' | b'\n' | b'\r'))
            .collect();
        input = Bytes::from(filtered);
    }
    input
}

fn check_port(digits: &[u8]) -> Result<(), UriStatusCode> {
    let mut value: u32 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(UriStatusCode::PortOutOfRange);
        }
        value = value * 10 + (b - b'0') as u32;
        if value > u16::MAX as u32 {
            return Err(UriStatusCode::PortOutOfRange);
        }
    }
    Ok(())
}

fn dispatch_host(
    host: &[u8],
    options: &UriParseOptions<'_>,
    out: &mut UriComponents,
) -> Result<(), UriStatusCode> {
    if host.is_empty() {
        out.host_kind = HostKind::None;
        return Ok(());
    }
    if let Some(parsed) = host::try_ipv4_host(host, options, &mut out.status) {
        out.host_kind = HostKind::Ipv4(Ipv4::new(parsed?));
        return Ok(());
    }
    out.host_kind = host::classify_reg_name(host, options.idn_encoder)?;
    Ok(())
}

/// Parse from a string, converting any error status into an `Error` at
/// this boundary.
pub fn parse_uri_checked(
    input: &str,
    options: &UriParseOptions<'_>,
) -> common::errors::Result<UriComponents> {
    let components = parse_uri(Bytes::copy_from_slice(input.as_bytes()), options);
    if let Some(error) = components.status.error() {
        return Err(common::errors::format_err!("{}", error));
    }
    Ok(components)
}

pub fn parse_uri(input: Bytes, options: &UriParseOptions<'_>) -> UriComponents {
    let buffer = preprocess(input, options);
    let data = buffer.clone();
    let mut out = UriComponents::new(buffer);
    let bytes: &[u8] = &data;
    let len = bytes.len();

    // scheme_start / scheme
    if len == 0 || !bytes[0].is_ascii_alphabetic() {
        out.status.set_error(UriStatusCode::InvalidSchemeChar);
        return out;
    }
    let mut pos = 1;
    let scheme_end = loop {
        if pos == len {
            // The input ran out without a `:`; there is no scheme.
            out.status.set_error(UriStatusCode::InvalidSchemeChar);
            return out;
        }
        let c = bytes[pos];
        if c == b':' {
            break pos;
        }
        if !SCHEME_CHARS.contains(c) {
            if !options.tolerate_invalid_scheme_char {
                out.status.set_error(UriStatusCode::InvalidSchemeChar);
                return out;
            }
            out.status.set_warning(UriWarning::InvalidSchemeChar);
        }
        pos += 1;
    };
    out.set_scheme_end(scheme_end);
    pos = scheme_end + 1;

    // after_scheme
    let scheme = &bytes[..scheme_end];
    let is_special = SPECIAL_SCHEMES
        .iter()
        .any(|&s| iequals(scheme, s, CaseSide::SecondLowered));
    let mut state = if bytes[pos..].starts_with(b"//") {
        pos += 2;
        out.set_authority_start(pos);
        out.status.set_valid(UriStatusCode::ValidAuthority);
        State::Authority
    } else if is_special {
        out.status
            .set_error(UriStatusCode::SchemeMissingFollowingSolidus);
        return out;
    } else {
        // Opaque scheme: everything after the colon is the path.
        out.set_authority_start(pos);
        State::Path
    };

    let mut port_span: Option<(usize, usize)> = None;
    loop {
        match state {
            State::Authority => {
                let auth_start = pos;
                let auth_end = auth_start
                    + bytes[auth_start..]
                        .iter()
                        .position(|&b| matches!(b, b'/' | b'?' | b'#'))
                        .unwrap_or(len - auth_start);
                let host_start = match bytes[auth_start..auth_end]
                    .iter()
                    .rposition(|&b| b == b'@')
                {
                    Some(i) => {
                        out.set_user_info_end(auth_start + i);
                        auth_start + i + 1
                    }
                    None => {
                        out.set_user_info_end(auth_start);
                        auth_start
                    }
                };
                state = if bytes.get(host_start) == Some(&b'[') {
                    State::Ipv6Host { host_start }
                } else {
                    State::Host {
                        host_start,
                        auth_end,
                    }
                };
            }

            State::Host {
                host_start,
                auth_end,
            } => {
                let host_end = host_start
                    + bytes[host_start..auth_end]
                        .iter()
                        .position(|&b| b == b':')
                        .unwrap_or(auth_end - host_start);
                if let Err(code) = dispatch_host(&bytes[host_start..host_end], options, &mut out) {
                    out.status.set_error(code);
                    return out;
                }
                out.set_authority_end(auth_end);
                if host_end < auth_end {
                    out.set_port_start(host_end);
                    out.status.set_valid(UriStatusCode::ValidPort);
                    port_span = Some((host_end + 1, auth_end));
                } else {
                    out.set_port_start(auth_end);
                }
                state = State::Port { auth_end };
            }

            State::Ipv6Host { host_start } => {
                let (ip, after) = match host::parse_ipv6_literal(bytes, host_start, &mut out.status)
                {
                    Some(parsed) => parsed,
                    None => return out,
                };
                out.host_kind = HostKind::Ipv6(ip);
                match bytes.get(after) {
                    None => {
                        out.set_port_start(after);
                        out.set_authority_end(after);
                        out.status.set_valid(UriStatusCode::Valid);
                        return out;
                    }
                    Some(&b':') => {
                        out.set_port_start(after);
                        out.status.set_valid(UriStatusCode::ValidPort);
                        let port_end = after
                            + 1
                            + bytes[after + 1..]
                                .iter()
                                .position(|&b| matches!(b, b'/' | b'?' | b'#'))
                                .unwrap_or(len - after - 1);
                        out.set_authority_end(port_end);
                        port_span = Some((after + 1, port_end));
                        state = State::Port { auth_end: port_end };
                    }
                    Some(&b'/') | Some(&b'?') | Some(&b'#') => {
                        out.set_port_start(after);
                        out.set_authority_end(after);
                        state = State::Port { auth_end: after };
                    }
                    Some(_) => {
                        out.status.set_error(UriStatusCode::Ipv6CharAfterClosing);
                        return out;
                    }
                }
            }

            State::Port { auth_end } => {
                if let Some((start, end)) = port_span {
                    if let Err(code) = check_port(&bytes[start..end]) {
                        out.status.set_error(code);
                        return out;
                    }
                }
                pos = auth_end;
                out.status.set_valid(UriStatusCode::ValidPath);
                state = State::Path;
            }

            State::Path => {
                pos += bytes[pos..]
                    .iter()
                    .position(|&b| matches!(b, b'?' | b'#'))
                    .unwrap_or(len - pos);
                match bytes.get(pos) {
                    None => {
                        out.status.set_valid(UriStatusCode::Valid);
                        return out;
                    }
                    Some(&b'?') => {
                        out.set_query_start(pos);
                        out.status.set_valid(UriStatusCode::ValidQueries);
                        state = State::Query;
                    }
                    _ => {
                        out.set_fragment_start(pos);
                        out.status.set_valid(UriStatusCode::ValidFragment);
                        state = State::Fragment;
                    }
                }
            }

            State::Query => {
                pos += bytes[pos..]
                    .iter()
                    .position(|&b| b == b'#')
                    .unwrap_or(len - pos);
                match bytes.get(pos) {
                    None => {
                        out.status.set_valid(UriStatusCode::Valid);
                        return out;
                    }
                    _ => {
                        out.set_fragment_start(pos);
                        out.status.set_valid(UriStatusCode::ValidFragment);
                        state = State::Fragment;
                    }
                }
            }

            State::Fragment => {
                out.status.set_valid(UriStatusCode::Valid);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net::Ipv6;

    fn parse(input: &str) -> UriComponents {
        parse_uri(
            Bytes::copy_from_slice(input.as_bytes()),
            &UriParseOptions::default(),
        )
    }

    fn parse_with(input: &str, options: &UriParseOptions<'_>) -> UriComponents {
        parse_uri(Bytes::copy_from_slice(input.as_bytes()), options)
    }

    #[test]
    fn ipv6_host_in_url() {
        let c = parse("http://[2001:db8::1]:8080/path?q#f");
        assert!(c.status.is_valid(), "{:?}", c.status.error());
        assert_eq!(c.scheme(), Some(&b"http"[..]));
        assert_eq!(c.host(), Some(&b"[2001:db8::1]"[..]));
        assert_eq!(c.port_number(), Some(8080));
        assert_eq!(c.path(), b"/path");
        assert_eq!(c.query(), Some(&b"q"[..]));
        assert_eq!(c.fragment(), Some(&b"f"[..]));
        assert_eq!(
            c.host_kind,
            HostKind::Ipv6(Ipv6::parse(b"2001:db8::1"))
        );
    }

    #[test]
    fn ipv6_host_variants() {
        assert!(parse("http://[::1]").status.is_valid());
        assert!(parse("http://[::1]/").status.is_valid());
        assert!(parse("http://[::1]?q").status.is_valid());
        assert!(parse("http://[::1]#f").status.is_valid());
        assert!(parse("http://u@[::1]:1/").status.is_valid());

        let c = parse("http://[::1]x/");
        assert_eq!(c.status.error(), Some(UriStatusCode::Ipv6CharAfterClosing));

        let c = parse("http://[1::2::3]/");
        assert_eq!(c.status.error(), Some(UriStatusCode::IpInvalidColonUsage));
    }

    #[test]
    fn unclosed_ipv6_host() {
        let c = parse("http://[2001:db8::1/path");
        assert!(c.status.has_error());
        assert_eq!(c.status.error(), Some(UriStatusCode::Ipv6Unclosed));
        assert_eq!(c.scheme(), Some(&b"http"[..]));

        let c = parse("http://[2001:db8::1");
        assert_eq!(c.status.error(), Some(UriStatusCode::Ipv6Unclosed));
    }

    #[test]
    fn ends_in_number_dispatch() {
        let c = parse("http://example.0x7f/");
        assert!(c.status.is_valid(), "{:?}", c.status.error());
        assert_eq!(c.host_kind, HostKind::Ipv4(Ipv4::new([0, 0, 0, 127])));

        let c = parse("http://192.168.1.1/x");
        assert_eq!(c.host_kind, HostKind::Ipv4(Ipv4::new([192, 168, 1, 1])));

        let c = parse("http://example.com/x");
        assert_eq!(c.host_kind, HostKind::RegName);
    }

    #[test]
    fn ipv4_host_errors_propagate() {
        let c = parse("http://256.0.0.0/");
        assert_eq!(c.status.error(), Some(UriStatusCode::IpInvalidOctetRange));
        let c = parse("http://1.2.3.4.5/");
        assert_eq!(c.status.error(), Some(UriStatusCode::IpTooManyOctets));
    }

    #[test]
    fn special_scheme_requires_solidus() {
        let c = parse("http:example");
        assert_eq!(
            c.status.error(),
            Some(UriStatusCode::SchemeMissingFollowingSolidus)
        );
        assert!(parse("HTTP://example.com").status.is_valid());
        assert!(parse("WSS://example.com").status.is_valid());
        // Opaque schemes are fine without it.
        assert!(parse("mailto:a@b").status.is_valid());
    }

    #[test]
    fn scheme_character_rules() {
        assert!(parse("a+b-c.1://h").status.is_valid());
        let c = parse("1http://h");
        assert_eq!(c.status.error(), Some(UriStatusCode::InvalidSchemeChar));
        let c = parse("ht~tp://h");
        assert_eq!(c.status.error(), Some(UriStatusCode::InvalidSchemeChar));
        let c = parse("no-colon-here");
        assert_eq!(c.status.error(), Some(UriStatusCode::InvalidSchemeChar));

        let mut options = UriParseOptions::default();
        options.tolerate_invalid_scheme_char = true;
        let c = parse_with("ht~tp://example.com", &options);
        assert!(c.status.is_valid());
        assert!(c.status.has_warning(UriWarning::InvalidSchemeChar));
        assert_eq!(c.scheme(), Some(&b"ht~tp"[..]));
    }

    #[test]
    fn port_rules() {
        assert_eq!(parse("http://h:65535/").port_number(), Some(65535));
        let c = parse("http://h:65536/");
        assert_eq!(c.status.error(), Some(UriStatusCode::PortOutOfRange));
        let c = parse("http://h:8x/");
        assert_eq!(c.status.error(), Some(UriStatusCode::PortOutOfRange));
        // A bare colon is an absent port, not an error.
        let c = parse("http://h:/p");
        assert!(c.status.is_valid());
        assert_eq!(c.port(), None);
    }

    #[test]
    fn reg_name_errors() {
        let c = parse("http://exa|mple/");
        assert_eq!(
            c.status.error(),
            Some(UriStatusCode::RegNameInvalidCharacter)
        );
        let c = parse("http://bücher.de/");
        assert_eq!(
            c.status.error(),
            Some(UriStatusCode::RegNameInvalidCharacter)
        );
    }

    struct PunyEncoder;

    impl IdnEncoder for PunyEncoder {
        fn domain_to_ascii(&self, _name: &[u8], out: &mut Vec<u8>) -> bool {
            out.extend_from_slice(b"xn--bcher-kva.de");
            true
        }
    }

    #[test]
    fn idn_encoder_is_consulted() {
        let encoder = PunyEncoder;
        let mut options = UriParseOptions::default();
        options.idn_encoder = Some(&encoder);
        let c = parse_with("http://bücher.de/", &options);
        assert!(c.status.is_valid());
        assert_eq!(c.host_ascii(), Some(&b"xn--bcher-kva.de"[..]));
        assert_eq!(c.host(), Some("bücher.de".as_bytes()));
    }

    #[test]
    fn whitespace_stripping_options() {
        let mut options = UriParseOptions::default();
        options.strip_leading_c0_and_space = true;
        options.strip_tabs_and_newlines = true;
        let c = parse_with("  \x01 http://exa\tmple.com/a\nb", &options);
        assert!(c.status.is_valid(), "{:?}", c.status.error());
        assert_eq!(c.host(), Some(&b"example.com"[..]));
        assert_eq!(c.path(), b"/ab");

        // Without the options the same input fails in the scheme.
        let c = parse("  http://example.com/");
        assert_eq!(c.status.error(), Some(UriStatusCode::InvalidSchemeChar));
    }

    #[test]
    fn trailing_dot_host_options() {
        let c = parse("http://1.2.3.4./");
        assert!(c.status.is_valid());
        assert!(c.status.has_warning(UriWarning::Ipv4EmptyOctet));
        assert_eq!(c.host_kind, HostKind::Ipv4(Ipv4::new([1, 2, 3, 4])));

        // Two dots only pass with the option; otherwise the host routes
        // to registered name (and the dots are legal name bytes).
        let c = parse("http://1.2.3.4../");
        assert!(c.status.is_valid());
        assert_eq!(c.host_kind, HostKind::RegName);

        let mut options = UriParseOptions::default();
        options.multiple_trailing_empty_ipv4_octets = true;
        let c = parse_with("http://1.2.3.4../", &options);
        assert!(c.status.is_valid());
        assert_eq!(c.host_kind, HostKind::Ipv4(Ipv4::new([1, 2, 3, 4])));
    }

    #[test]
    fn empty_ipv4_octets_option() {
        let c = parse("http://1..2.3/");
        assert_eq!(c.status.error(), Some(UriStatusCode::IpInvalidCharacter));

        let mut options = UriParseOptions::default();
        options.allow_ipv4_empty_octets = true;
        let c = parse_with("http://1..2.3/", &options);
        assert!(c.status.is_valid());
        assert!(c.status.has_warning(UriWarning::Ipv4EmptyOctet));
        assert_eq!(c.host_kind, HostKind::Ipv4(Ipv4::new([1, 2, 0, 3])));
    }

    #[test]
    fn file_urls() {
        let c = parse("file:///etc/hosts");
        assert!(c.status.is_valid());
        assert_eq!(c.host(), None);
        assert_eq!(c.host_kind, HostKind::None);
        assert_eq!(c.path(), b"/etc/hosts");
    }

    #[test]
    fn userinfo_splits_at_last_at() {
        let c = parse("http://a@b@example.com/");
        assert!(c.status.is_valid());
        assert_eq!(c.user_info(), Some(&b"a@b"[..]));
        assert_eq!(c.host(), Some(&b"example.com"[..]));
    }

    #[test]
    fn checked_parse_converts_errors() {
        let options = UriParseOptions::default();
        assert!(parse_uri_checked("http://example.com/", &options).is_ok());
        let err = parse_uri_checked("http://[::1/path", &options).unwrap_err();
        assert!(err.to_string().contains("closing bracket"));
    }

    #[test]
    fn authority_without_trailing_slash() {
        let c = parse("http://example.com");
        assert!(c.status.is_valid());
        assert_eq!(c.host(), Some(&b"example.com"[..]));
        assert_eq!(c.path(), b"");
    }
}
