//! IPv4 address and CIDR block arithmetic.
//!
//! ```
//! use ipaddress::Ipv4Address;
//!
//! let ipv4: Ipv4Address = "192.168.0.1/24".parse().unwrap();
//! assert_eq!("192.168.0.0", ipv4.network().to_string());
//! assert_eq!("255.255.255.0", ipv4.netmask());
//! assert!(ipv4.is_private());
//! ```

pub mod ipv4;

pub use ipv4::{
    AddressClass, AddressError, Ipv4Address, Result, CLASS_A, CLASS_B, CLASS_C, LINK_LOCAL,
    LOOPBACK, MAX_PREFIX, MULTICAST,
};
