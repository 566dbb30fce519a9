//! Host classification and the host-specific subparsers.
//!
//! A URL host is one of: an IPv6 literal in brackets, an IPv4 literal
//! (decided by the WHATWG ends-in-a-number rule), or a registered name.

use bytes::Bytes;
use net::{inet_pton6, Ipv6, Pton6Status};
use strings::charset::CharMap;
use strings::hex::{dec_digit, hex_digit, is_hex_digit};

use crate::components::HostKind;
use crate::parser::UriParseOptions;
use crate::status::{UriStatus, UriStatusCode, UriWarning};

/// Unicode-to-ASCII conversion hook for registered names. The core only
/// traffics in the ASCII form; a parser configured without an encoder
/// rejects non-ASCII hosts.
pub trait IdnEncoder {
    /// Convert `name` to its ASCII form, appending into `out`. Returns
    /// false when the name cannot be converted.
    fn domain_to_ascii(&self, name: &[u8], out: &mut Vec<u8>) -> bool;
}

// WHATWG forbidden host code points (minus `%`, which the core passes
// through undecoded), plus the C0 controls and DEL.
static FORBIDDEN_HOST_BYTES: CharMap = CharMap::new()
    .with_range(0x00, 0x20)
    .with_chars(b"#/:<>?@[\\]^|")
    .with_chars(&[0x7f]);

/// Parse the bracketed IPv6 literal starting at `open` (the `[`). On
/// success returns the address and the index just past the `]`; on
/// failure records the error and returns None.
pub(crate) fn parse_ipv6_literal(
    bytes: &[u8],
    open: usize,
    status: &mut UriStatus,
) -> Option<(Ipv6, usize)> {
    let mut octets = [0u8; 16];
    let (result, rest) = inet_pton6(&bytes[open + 1..], &mut octets, None, Some(b']'));
    match result {
        Pton6Status::ValidSpecial => {
            let close = bytes.len() - rest.len();
            Some((Ipv6::new(octets), close + 1))
        }
        // Running off the end, or running into the path, means the
        // bracket was never closed.
        Pton6Status::Valid => {
            status.set_error(UriStatusCode::Ipv6Unclosed);
            None
        }
        Pton6Status::InvalidCharacter if rest.first() == Some(&b'/') => {
            status.set_error(UriStatusCode::Ipv6Unclosed);
            None
        }
        other => {
            status.set_error(map_pton6(other));
            None
        }
    }
}

fn map_pton6(status: Pton6Status) -> UriStatusCode {
    match status {
        Pton6Status::InvalidOctetRange => UriStatusCode::IpInvalidOctetRange,
        Pton6Status::InvalidCharacter => UriStatusCode::IpInvalidCharacter,
        Pton6Status::InvalidPrefix => UriStatusCode::IpInvalidPrefix,
        Pton6Status::InvalidColonUsage => UriStatusCode::IpInvalidColonUsage,
        Pton6Status::BadEnding | Pton6Status::Valid | Pton6Status::ValidSpecial => {
            UriStatusCode::IpBadEnding
        }
    }
}

fn is_numeric_label(label: &[u8]) -> bool {
    if label.is_empty() {
        return false;
    }
    if label.iter().all(u8::is_ascii_digit) {
        return true;
    }
    label.len() >= 2
        && label[0] == b'0'
        && (label[1] | 0x20) == b'x'
        && label[2..].iter().all(|&b| is_hex_digit(b))
}

/// The ends-in-a-number check plus the IPv4 host parse.
///
/// Returns None when the host is not IPv4-eligible (route to registered
/// name); otherwise the parse result. Trailing dots are pruned first,
/// each recording an `ipv4_empty_octet` warning; without the
/// multiple-trailing-dots option only one is pruned.
pub(crate) fn try_ipv4_host(
    host: &[u8],
    options: &UriParseOptions<'_>,
    status: &mut UriStatus,
) -> Option<Result<[u8; 4], UriStatusCode>> {
    let mut end = host.len();
    if end == 0 {
        return None;
    }
    if host[end - 1] == b'.' {
        if options.multiple_trailing_empty_ipv4_octets {
            while end > 0 && host[end - 1] == b'.' {
                status.set_warning(UriWarning::Ipv4EmptyOctet);
                end -= 1;
            }
        } else {
            status.set_warning(UriWarning::Ipv4EmptyOctet);
            end -= 1;
        }
        if end == 0 {
            return None;
        }
    }
    let trimmed = &host[..end];

    // The decision rests on the last label alone: all digits, or a
    // `0x`-marked hex number. Letters without the marker make it a name.
    let label_start = trimmed
        .iter()
        .rposition(|&b| b == b'.')
        .map_or(0, |i| i + 1);
    let label = &trimmed[label_start..];
    let eligible = !label.is_empty()
        && (label.iter().all(u8::is_ascii_digit)
            || (label.len() > 2
                && label[0] == b'0'
                && (label[1] | 0x20) == b'x'
                && label[2..].iter().all(|&b| is_hex_digit(b))));
    if !eligible {
        return None;
    }

    // With non-numeric leading labels, only the numeric tail is the
    // address; otherwise the whole host is.
    let leading = &trimmed[..label_start.saturating_sub(1)];
    let whole = label_start == 0
        || leading.split(|&b| b == b'.').all(|l| {
            is_numeric_label(l) || (options.allow_ipv4_empty_octets && l.is_empty())
        });
    let span = if whole { trimmed } else { label };

    Some(parse_host_ipv4(span, options.allow_ipv4_empty_octets, status))
}

/// The WHATWG IPv4 host parser: up to four dot-separated numbers in
/// decimal, octal or hex, the last of which expands to fill the
/// remaining bytes.
pub(crate) fn parse_host_ipv4(
    host: &[u8],
    allow_empty_octets: bool,
    status: &mut UriStatus,
) -> Result<[u8; 4], UriStatusCode> {
    let mut numbers: Vec<u64> = Vec::with_capacity(4);
    for label in host.split(|&b| b == b'.') {
        if label.is_empty() {
            if allow_empty_octets {
                status.set_warning(UriWarning::Ipv4EmptyOctet);
                continue;
            }
            return Err(UriStatusCode::IpInvalidCharacter);
        }
        if numbers.len() == 4 {
            return Err(UriStatusCode::IpTooManyOctets);
        }
        numbers.push(parse_whatwg_number(label)?);
    }

    let last = match numbers.pop() {
        Some(last) => last,
        None => return Err(UriStatusCode::IpTooLittleOctets),
    };
    for &number in &numbers {
        if number > 255 {
            return Err(UriStatusCode::IpInvalidOctetRange);
        }
    }
    let remaining = 4 - numbers.len();
    if remaining < 4 && last >= 1u64 << (8 * remaining) {
        return Err(UriStatusCode::IpInvalidOctetRange);
    }

    let mut value = last as u32;
    for (i, &number) in numbers.iter().enumerate() {
        value |= (number as u32) << (8 * (3 - i));
    }
    Ok(value.to_be_bytes())
}

// One dot-separated number: decimal, `0`-octal or `0x`-hex; a bare `0x`
// is zero. Values are capped at 32 bits.
fn parse_whatwg_number(label: &[u8]) -> Result<u64, UriStatusCode> {
    let (digits, base): (&[u8], u64) =
        if label.len() >= 2 && label[0] == b'0' && (label[1] | 0x20) == b'x' {
            (&label[2..], 16)
        } else if label.len() >= 2 && label[0] == b'0' {
            (&label[1..], 8)
        } else {
            (label, 10)
        };
    if digits.is_empty() {
        return Ok(0);
    }
    let mut value: u64 = 0;
    for &c in digits {
        let digit = if base == 16 {
            hex_digit(c, 256)
        } else {
            dec_digit(c, 256)
        } as u64;
        if digit >= base {
            return Err(UriStatusCode::IpInvalidCharacter);
        }
        value = value * base + digit;
        if value > u32::MAX as u64 {
            return Err(UriStatusCode::IpInvalidOctetRange);
        }
    }
    Ok(value)
}

/// Validate a registered name, routing non-ASCII names through the IDN
/// encoder when one is configured.
pub(crate) fn classify_reg_name(
    host: &[u8],
    encoder: Option<&dyn IdnEncoder>,
) -> Result<HostKind, UriStatusCode> {
    if host.iter().any(|&b| FORBIDDEN_HOST_BYTES.contains(b)) {
        return Err(UriStatusCode::RegNameInvalidCharacter);
    }
    if !host.iter().any(|&b| b >= 0x80) {
        return Ok(HostKind::RegName);
    }
    match encoder {
        Some(encoder) => {
            let mut encoded = Vec::new();
            if encoder.domain_to_ascii(host, &mut encoded) {
                Ok(HostKind::Idn(Bytes::from(encoded)))
            } else {
                Err(UriStatusCode::RegNameInvalidCharacter)
            }
        }
        None => Err(UriStatusCode::RegNameInvalidCharacter),
    }
}
