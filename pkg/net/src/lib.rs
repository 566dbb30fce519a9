#[macro_use]
extern crate arrayref;

mod endian;
pub mod ip;
pub mod ipv4;
pub mod ipv6;
pub mod ntop;
pub mod pton;
pub mod sockaddr;

pub use endian::{FromNetworkOrder, ToNetworkOrder};
pub use ip::{IpAddress, IpStatus, SocketAddr};
pub use ipv4::{Ipv4, IPV4_MAX_PREFIX};
pub use ipv6::{Ipv6, Ipv6Scope, IPV6_MAX_PREFIX};
pub use ntop::{inet_ntop4, inet_ntop6};
pub use pton::{
    inet_pton4, inet_pton4_strict, inet_pton6, PrefixSlot, Pton4Status, Pton6Status, NO_PREFIX,
};
pub use sockaddr::{make_sock_addr, to_addr, SockAddr, SockAddressAny};
