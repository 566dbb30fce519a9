/// Conversion into network byte order (big endian).
pub trait ToNetworkOrder {
    fn to_network_order(self) -> Self;
}

/// Conversion out of network byte order.
pub trait FromNetworkOrder {
    fn from_network_order(self) -> Self;
}

macro_rules! impl_network_order {
    ($($t:ty),*) => {
        $(
            impl ToNetworkOrder for $t {
                fn to_network_order(self) -> Self {
                    self.to_be()
                }
            }

            impl FromNetworkOrder for $t {
                fn from_network_order(self) -> Self {
                    <$t>::from_be(self)
                }
            }
        )*
    };
}

impl_network_order!(u16, u32, u128);
