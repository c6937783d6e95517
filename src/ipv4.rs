//! IPv4 addresses carrying a prefix length, and the block arithmetic over them.
//!
//! An [`Ipv4Address`] is a plain `Copy` value: every query returns a new value
//! and never touches the receiver.

use lazy_static::lazy_static;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const MAX_PREFIX: u8 = 32;

pub const CLASS_A: Ipv4Address = Ipv4Address {
    octets: [10, 0, 0, 0],
    prefix: 8,
};
pub const CLASS_B: Ipv4Address = Ipv4Address {
    octets: [172, 16, 0, 0],
    prefix: 12,
};
pub const CLASS_C: Ipv4Address = Ipv4Address {
    octets: [192, 168, 0, 0],
    prefix: 16,
};
pub const MULTICAST: Ipv4Address = Ipv4Address {
    octets: [224, 0, 0, 0],
    prefix: 4,
};
pub const LOOPBACK: Ipv4Address = Ipv4Address {
    octets: [127, 0, 0, 0],
    prefix: 8,
};
pub const LINK_LOCAL: Ipv4Address = Ipv4Address {
    octets: [169, 254, 0, 0],
    prefix: 16,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("it isn't a valid textual representation of an IPv4 address: {0:?}")]
    InvalidAddress(String),
    #[error("prefix must be 0-32, got {0:?}")]
    InvalidPrefix(String),
}

pub type Result<T> = std::result::Result<T, AddressError>;

/// Private address class, as matched against [`CLASS_A`], [`CLASS_B`] and [`CLASS_C`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass {
    A,
    B,
    C,
}

impl AddressClass {
    /// Lookup order used by [`Ipv4Address::class`].
    pub const ALL: [AddressClass; 3] = [AddressClass::A, AddressClass::B, AddressClass::C];

    pub fn range(self) -> &'static Ipv4Address {
        match self {
            AddressClass::A => &CLASS_A,
            AddressClass::B => &CLASS_B,
            AddressClass::C => &CLASS_C,
        }
    }
}

impl Display for AddressClass {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            AddressClass::A => "A",
            AddressClass::B => "B",
            AddressClass::C => "C",
        };
        f.write_str(name)
    }
}

/// An IPv4 address together with the prefix length of the block it belongs to.
///
/// Equality, ordering and hashing look at the address only; two values that
/// differ just in their prefix compare equal.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Address {
    octets: [u8; 4],
    prefix: u8,
}

// Bits set for the network part of a block. A shift by 32 overflows a u32, so
// a /0 mask is spelled out as zero.
fn network_mask(prefix: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(MAX_PREFIX - prefix))
        .unwrap_or(0)
}

fn parse_prefix(s: &str) -> Result<u8> {
    match s.parse::<u8>() {
        Ok(p) if p <= MAX_PREFIX && s.bytes().all(|b| b.is_ascii_digit()) => Ok(p),
        _ => {
            debug!("rejected prefix {:?}", s);
            Err(AddressError::InvalidPrefix(s.to_owned()))
        }
    }
}

fn invalid_address(s: &str) -> AddressError {
    debug!("rejected address {:?}", s);
    AddressError::InvalidAddress(s.to_owned())
}

fn parse_octets(s: &str) -> Result<[u8; 4]> {
    lazy_static! {
        static ref DOTTED: Regex = Regex::new(&format!(
            r"^{o}\.{o}\.{o}\.{o}$",
            o = r"(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])"
        ))
        .expect("dotted-decimal pattern");
    }
    let caps = DOTTED.captures(s).ok_or_else(|| invalid_address(s))?;
    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = caps
            .get(i + 1)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| invalid_address(s))?;
    }
    Ok(octets)
}

impl Ipv4Address {
    /// Parses `a.b.c.d` or `a.b.c.d/p`. Without a suffix the prefix is 32.
    ///
    /// The suffix is checked first, so text that is wrong in both parts
    /// reports [`AddressError::InvalidPrefix`].
    pub fn parse(text: &str) -> Result<Self> {
        trace!("parse({:?})", text);
        let (addr, prefix) = match text.split_once('/') {
            Some((addr, suffix)) => (addr, parse_prefix(suffix)?),
            None => (text, MAX_PREFIX),
        };
        let octets = parse_octets(addr)?;
        let parsed = Ipv4Address { octets, prefix };
        trace!("parsed {}/{}", parsed, parsed.prefix);
        Ok(parsed)
    }

    /// Builds a /32 address from its integer form, most significant byte first.
    pub fn from_u32(n: u32) -> Self {
        Ipv4Address {
            octets: n.to_be_bytes(),
            prefix: MAX_PREFIX,
        }
    }

    pub fn with_prefix(n: u32, prefix: u8) -> Result<Self> {
        if prefix > MAX_PREFIX {
            debug!("rejected prefix {} for {}", prefix, n);
            return Err(AddressError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Ipv4Address {
            octets: n.to_be_bytes(),
            prefix,
        })
    }

    // Same block, different address. The prefix was validated when `self` was built.
    fn sibling(&self, n: u32) -> Self {
        Ipv4Address {
            octets: n.to_be_bytes(),
            prefix: self.prefix,
        }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn octets(&self) -> [u8; 4] {
        self.octets
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.octets)
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        self.to_u32().to_be_bytes()
    }

    /// 32 binary digits, most significant bit of the first octet first.
    pub fn to_bits(&self) -> String {
        self.octets.iter().map(|o| format!("{:08b}", o)).collect()
    }

    /// `d.c.b.a.in-addr.arpa` for the address `a.b.c.d`.
    pub fn reverse_dns_name(&self) -> String {
        let [a, b, c, d] = self.octets;
        format!("{}.{}.{}.{}.in-addr.arpa", d, c, b, a)
    }

    /// First address of the block, with all host bits cleared.
    pub fn network(&self) -> Self {
        self.sibling(self.to_u32() & network_mask(self.prefix))
    }

    /// Last address of the block, with all host bits set.
    pub fn broadcast(&self) -> Self {
        self.sibling(self.to_u32() | !network_mask(self.prefix))
    }

    pub fn netmask(&self) -> String {
        Ipv4Address::from_u32(network_mask(self.prefix)).to_string()
    }

    /// The following address, or `None` past the end of the block.
    pub fn next(&self) -> Option<Self> {
        let n = self.to_u32();
        if n >= self.broadcast().to_u32() {
            return None;
        }
        Some(self.sibling(n + 1))
    }

    /// The preceding address, or `None` before the start of the block.
    pub fn prev(&self) -> Option<Self> {
        let n = self.to_u32();
        if n <= self.network().to_u32() {
            return None;
        }
        Some(self.sibling(n - 1))
    }

    /// Number of addresses in the block; 2^32 for a /0.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_PREFIX - self.prefix)
    }

    pub fn contains(&self, other: &Ipv4Address) -> bool {
        let n = other.to_u32();
        self.network().to_u32() <= n && n <= self.broadcast().to_u32()
    }

    /// Picks an address of the block at random, never the broadcast address.
    ///
    /// The generator is reseeded from the system clock on every call. Results
    /// can't be reproduced and must not be used for anything security related.
    /// Returns `None` for a /32, whose block holds nothing but its broadcast.
    pub fn sample(&self) -> Option<Self> {
        let span = self.size() - 1;
        if span == 0 {
            return None;
        }
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let offset = StdRng::seed_from_u64(seed).gen_range(0..span);
        trace!("sample offset {} of {} in {}/{}", offset, span, self, self.prefix);
        // offset < 2^32 - 1 and network + offset stays below broadcast
        Some(self.sibling(self.network().to_u32() + offset as u32))
    }

    pub fn is_class_a(&self) -> bool {
        CLASS_A.contains(self)
    }

    pub fn is_class_b(&self) -> bool {
        CLASS_B.contains(self)
    }

    pub fn is_class_c(&self) -> bool {
        CLASS_C.contains(self)
    }

    pub fn is_multicast(&self) -> bool {
        MULTICAST.contains(self)
    }

    pub fn is_loopback(&self) -> bool {
        LOOPBACK.contains(self)
    }

    pub fn is_link_local(&self) -> bool {
        LINK_LOCAL.contains(self)
    }

    /// In one of the class A, B or C blocks. These are 10/8, 172.16/12 and
    /// 192.168/16 only, not the wider RFC 1918 definition.
    pub fn is_private(&self) -> bool {
        self.is_class_a() || self.is_class_b() || self.is_class_c()
    }

    /// First class of A, B, C whose block holds this address.
    pub fn class(&self) -> Option<AddressClass> {
        AddressClass::ALL
            .iter()
            .copied()
            .find(|class| class.range().contains(self))
    }
}

impl PartialEq for Ipv4Address {
    fn eq(&self, other: &Ipv4Address) -> bool {
        self.to_u32() == other.to_u32()
    }
}

impl Eq for Ipv4Address {}

impl Hash for Ipv4Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u32().hash(state);
    }
}

impl Ord for Ipv4Address {
    fn cmp(&self, other: &Ipv4Address) -> Ordering {
        self.to_u32().cmp(&other.to_u32())
    }
}

impl PartialOrd for Ipv4Address {
    fn partial_cmp(&self, other: &Ipv4Address) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Ipv4Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let [a, b, c, d] = self.octets;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl FromStr for Ipv4Address {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self> {
        Ipv4Address::parse(s)
    }
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Address {
            octets: addr.octets(),
            prefix: MAX_PREFIX,
        }
    }
}

impl From<Ipv4Address> for Ipv4Addr {
    fn from(addr: Ipv4Address) -> Self {
        Ipv4Addr::from(addr.octets)
    }
}

impl From<Ipv4Address> for u32 {
    fn from(addr: Ipv4Address) -> Self {
        addr.to_u32()
    }
}
