//! Discriminated IP address plus the `ip:port` socket-address value.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use common::errors::*;

use crate::ipv4::Ipv4;
use crate::ipv6::Ipv6;
use crate::pton::{inet_pton6, Pton4Status, Pton6Status};

/// Union of the IPv4 and IPv6 parse statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IpStatus {
    Valid = 255,
    TooLittleOctets = 254,
    TooManyOctets = 253,
    InvalidOctetRange = 252,
    InvalidLeadingZero = 251,
    InvalidCharacter = 250,
    BadEnding = 249,
    InvalidOctet = 248,
    InvalidPrefix = 247,
    InvalidColonUsage = 246,
}

impl From<Pton4Status> for IpStatus {
    fn from(status: Pton4Status) -> Self {
        match status {
            Pton4Status::Valid => Self::Valid,
            Pton4Status::TooLittleOctets => Self::TooLittleOctets,
            Pton4Status::TooManyOctets => Self::TooManyOctets,
            Pton4Status::InvalidOctetRange => Self::InvalidOctetRange,
            Pton4Status::InvalidLeadingZero => Self::InvalidLeadingZero,
            Pton4Status::InvalidCharacter => Self::InvalidCharacter,
            Pton4Status::BadEnding => Self::BadEnding,
            Pton4Status::InvalidOctet => Self::InvalidOctet,
            Pton4Status::InvalidPrefix => Self::InvalidPrefix,
        }
    }
}

impl From<Pton6Status> for IpStatus {
    fn from(status: Pton6Status) -> Self {
        match status {
            Pton6Status::Valid | Pton6Status::ValidSpecial => Self::Valid,
            Pton6Status::InvalidOctetRange => Self::InvalidOctetRange,
            Pton6Status::InvalidCharacter => Self::InvalidCharacter,
            Pton6Status::BadEnding => Self::BadEnding,
            Pton6Status::InvalidPrefix => Self::InvalidPrefix,
            Pton6Status::InvalidColonUsage => Self::InvalidColonUsage,
        }
    }
}

impl IpStatus {
    /// Stable lowercase identifier, underscore separated.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::TooLittleOctets => "too_little_octets",
            Self::TooManyOctets => "too_many_octets",
            Self::InvalidOctetRange => "invalid_octet_range",
            Self::InvalidLeadingZero => "invalid_leading_zero",
            Self::InvalidCharacter => "invalid_character",
            Self::BadEnding => "bad_ending",
            Self::InvalidOctet => "invalid_octet",
            Self::InvalidPrefix => "invalid_prefix",
            Self::InvalidColonUsage => "invalid_colon_usage",
        }
    }
}

impl fmt::Display for IpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "Valid IP address",
            Self::TooLittleOctets => {
                "The IPv4 doesn't have enough octets; it should contain exactly 4 octets"
            }
            Self::TooManyOctets => {
                "The IPv4 has too many octets; it should contain exactly 4 octets"
            }
            Self::InvalidOctetRange => "At least one of the IP octets is of an invalid range",
            Self::InvalidLeadingZero => "The IPv4's octet started with a zero which is not valid",
            Self::InvalidCharacter => "Invalid character found in the IP address",
            Self::BadEnding => "The IP address ended unexpectedly",
            Self::InvalidOctet => "Found an invalid character in the IP octets",
            Self::InvalidPrefix => "The IP address has an invalid prefix",
            Self::InvalidColonUsage => "The colon is used in the wrong place in IPv6",
        })
    }
}

/// Either family, or an invalid carrier. An invalid parse keeps the
/// variant that holds the most useful diagnostic: IPv4 unless the parse
/// stopped on a byte only IPv6 could own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpAddress {
    V4(Ipv4),
    V6(Ipv6),
}

impl IpAddress {
    pub const fn invalid() -> Self {
        Self::V4(Ipv4::invalid())
    }

    /// Parse either family. IPv4 is tried first; when it stops on a byte
    /// that could belong to an IPv6 literal (an `invalid_octet` stop,
    /// e.g. at a `:`), IPv6 parsing takes over. A `[...]`-bracketed IPv6
    /// literal is accepted and must consume through the `]`.
    pub fn parse(input: &[u8]) -> Self {
        if input.first() == Some(&b'[') {
            let mut octets = [0u8; 16];
            let (status, rest) = inet_pton6(&input[1..], &mut octets, None, Some(b']'));
            return match status {
                Pton6Status::ValidSpecial if rest == b"]" => Self::V6(Ipv6::new(octets)),
                Pton6Status::ValidSpecial | Pton6Status::Valid => Self::V6(Ipv6::from_slot(
                    [0; 16],
                    crate::pton::PrefixSlot::Error(Pton6Status::BadEnding),
                )),
                status => Self::V6(Ipv6::from_slot(
                    [0; 16],
                    crate::pton::PrefixSlot::Error(status),
                )),
            };
        }

        let v4 = Ipv4::parse(input);
        if v4.status() == Pton4Status::InvalidOctet {
            Self::V6(Ipv6::parse(input))
        } else {
            Self::V4(v4)
        }
    }

    pub const fn is_v4(&self) -> bool {
        matches!(self, Self::V4(_))
    }

    pub const fn is_v6(&self) -> bool {
        matches!(self, Self::V6(_))
    }

    pub fn as_v4(&self) -> Option<&Ipv4> {
        match self {
            Self::V4(ip) => Some(ip),
            Self::V6(_) => None,
        }
    }

    pub fn as_v6(&self) -> Option<&Ipv6> {
        match self {
            Self::V6(ip) => Some(ip),
            Self::V4(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_valid(),
            Self::V6(ip) => ip.is_valid(),
        }
    }

    pub fn has_prefix(&self) -> bool {
        match self {
            Self::V4(ip) => ip.has_prefix(),
            Self::V6(ip) => ip.has_prefix(),
        }
    }

    /// The packed prefix-or-status byte of the active variant.
    pub fn prefix(&self) -> u8 {
        match self {
            Self::V4(ip) => ip.prefix(),
            Self::V6(ip) => ip.prefix(),
        }
    }

    pub fn status(&self) -> IpStatus {
        match self {
            Self::V4(ip) => ip.status().into(),
            Self::V6(ip) => ip.status().into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_zero(),
            Self::V6(ip) => ip.is_zero(),
        }
    }

    pub fn is_loopback(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_loopback(),
            Self::V6(ip) => ip.is_loopback(),
        }
    }

    pub fn is_multicast(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_multicast(),
            Self::V6(ip) => ip.is_multicast(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_broadcast(),
            Self::V6(ip) => ip.is_broadcast(),
        }
    }

    pub fn is_private(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_private(),
            Self::V6(ip) => ip.is_private(),
        }
    }

    pub fn is_nonroutable(&self) -> bool {
        match self {
            Self::V4(ip) => ip.is_nonroutable(),
            Self::V6(ip) => ip.is_nonroutable(),
        }
    }

    pub fn render(&self, out: &mut String) {
        match self {
            Self::V4(ip) => ip.render(out),
            Self::V6(ip) => ip.render(out),
        }
    }

    pub fn status_string(&self) -> String {
        self.status().to_string()
    }
}

// Differing variants are unordered.
impl PartialOrd for IpAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::V4(a), Self::V4(b)) => a.partial_cmp(b),
            (Self::V6(a), Self::V6(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        self.render(&mut s);
        f.write_str(&s)
    }
}

impl From<Ipv4> for IpAddress {
    fn from(ip: Ipv4) -> Self {
        Self::V4(ip)
    }
}

impl From<Ipv6> for IpAddress {
    fn from(ip: Ipv6) -> Self {
        Self::V6(ip)
    }
}

impl From<std::net::IpAddr> for IpAddress {
    fn from(addr: std::net::IpAddr) -> Self {
        match addr {
            std::net::IpAddr::V4(v4) => Self::V4(v4.into()),
            std::net::IpAddr::V6(v6) => Self::V6(v6.into()),
        }
    }
}

impl TryFrom<IpAddress> for std::net::IpAddr {
    type Error = Error;

    fn try_from(ip: IpAddress) -> Result<Self> {
        if !ip.is_valid() {
            return Err(format_err!("{}", ip.status()));
        }
        Ok(match ip {
            IpAddress::V4(v4) => std::net::IpAddr::V4(v4.into()),
            IpAddress::V6(v6) => std::net::IpAddr::V6(v6.into()),
        })
    }
}

impl FromStr for IpAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let ip = Self::parse(s.as_bytes());
        if !ip.is_valid() {
            return Err(format_err!("{}", ip.status()));
        }
        Ok(ip)
    }
}

/// An IP address paired with a port.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SocketAddr {
    pub ip: IpAddress,
    pub port: u16,
}

impl SocketAddr {
    pub fn new(ip: IpAddress, port: u16) -> Self {
        Self { ip, port }
    }
}

impl fmt::Display for SocketAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddress::V6(_) => write!(f, "[{}]:{}", self.ip, self.port),
            IpAddress::V4(_) => write!(f, "{}:{}", self.ip, self.port),
        }
    }
}

impl fmt::Debug for SocketAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for SocketAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let idx = s
            .rfind(':')
            .ok_or_else(|| err_msg("Missing port in socket address"))?;
        let (ip_part, port_part) = (&s[..idx], &s[idx + 1..]);
        if port_part.is_empty() {
            return Err(err_msg("Missing port in socket address"));
        }
        let port = u16::from_str_radix(port_part, 10)?;
        let ip = ip_part.parse::<IpAddress>()?;
        Ok(Self { ip, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_families() {
        assert_eq!(
            "127.0.0.1".parse::<IpAddress>().unwrap(),
            IpAddress::V4(Ipv4::new([127, 0, 0, 1]))
        );
        let v6 = "::1".parse::<IpAddress>().unwrap();
        assert!(v6.is_v6());
        assert!(v6.is_loopback());
    }

    #[test]
    fn bracketed_literal() {
        let ip = IpAddress::parse(b"[2001:db8::1]");
        assert!(ip.is_valid());
        assert!(ip.is_v6());
        assert_eq!(ip.to_string(), "2001:db8::1");

        assert!(!IpAddress::parse(b"[2001:db8::1").is_valid());
        assert!(!IpAddress::parse(b"[2001:db8::1]x").is_valid());
    }

    #[test]
    fn invalid_keeps_diagnostic_variant() {
        // A plain bad IPv4 stays V4 with its status.
        let ip = IpAddress::parse(b"256.1.2.3");
        assert!(ip.is_v4());
        assert_eq!(ip.status(), IpStatus::InvalidOctetRange);

        // A colon stop falls through to the IPv6 parser.
        let ip = IpAddress::parse(b"1::2::3");
        assert!(ip.is_v6());
        assert_eq!(ip.status(), IpStatus::InvalidColonUsage);
    }

    #[test]
    fn mapped_equality_and_ordering() {
        let a = IpAddress::parse(b"::ffff:127.0.0.1");
        let b = IpAddress::parse(b"127.0.0.1");
        assert_ne!(a, b);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(a.is_loopback() && b.is_loopback());

        let c = IpAddress::parse(b"::ffff:128.0.0.1");
        assert!(a < c);
    }

    #[test]
    fn prefix_through_union() {
        let ip = IpAddress::parse(b"::0fff:1/127");
        assert!(ip.is_valid());
        assert_eq!(ip.prefix(), 127);
        assert_eq!(ip.status(), IpStatus::Valid);
    }

    #[test]
    fn socket_addrs() {
        let sa: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(sa.ip, IpAddress::V4(Ipv4::new([127, 0, 0, 1])));
        assert_eq!(sa.port, 8080);
        assert_eq!(sa.to_string(), "127.0.0.1:8080");

        let sa: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        assert!(sa.ip.is_v6());
        assert_eq!(sa.port, 443);
        assert_eq!(sa.to_string(), "[2001:db8::1]:443");

        assert!("127.0.0.1".parse::<SocketAddr>().is_err());
        assert!("127.0.0.1:".parse::<SocketAddr>().is_err());
        assert!("127.0.0.1:99999".parse::<SocketAddr>().is_err());
    }

    #[test]
    fn std_interop() {
        let ip: IpAddress = "10.0.0.1".parse().unwrap();
        let std_ip: std::net::IpAddr = ip.try_into().unwrap();
        assert_eq!(std_ip, std::net::IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(IpAddress::from(std_ip), ip);
        assert!(std::net::IpAddr::try_from(IpAddress::invalid()).is_err());
    }
}
