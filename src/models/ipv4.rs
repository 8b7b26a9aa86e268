//! IPv4 CIDR blocks and the bit arithmetic used to carve subnets out of a VPC.
//!
//! Provides [`Ipv4Cidr`] for `addr/mask` values read from configuration, along
//! with free functions for mask, alignment and broadcast calculations.

use crate::error::CidrError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use vpc_topology::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, CidrError> {
    if len > MAX_LENGTH {
        return Err(CidrError::MaskTooLong(len));
    }
    let right_len = MAX_LENGTH - len;
    let mask = (u32::MAX as u64 >> right_len) << right_len;
    Ok(mask as u32)
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    Ok(Ipv4Addr::from(u32::from(addr) & get_cidr_mask(len)?))
}

/// Calculate the broadcast (highest) address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from((u32::from(addr) & mask) | !mask))
}

/// Returns the first address after the block of size `len` containing `addr`.
pub fn ip_after_subnet(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    let size = block_size(len)?;
    let network = u64::from(u32::from(cut_addr(addr, len)?));
    let next = network + size;
    if next > u64::from(u32::MAX) {
        return Err(CidrError::Overflow(format!("{addr}/{len}")));
    }
    Ok(Ipv4Addr::from(next as u32))
}

/// Round `addr` up to the next boundary of a `/len` block.
///
/// An address already on a boundary is returned unchanged.
pub fn align_up(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    if cut_addr(addr, len)? == addr {
        Ok(addr)
    } else {
        ip_after_subnet(addr, len)
    }
}

/// Number of addresses in a `/len` block.
pub fn block_size(len: u8) -> Result<u64, CidrError> {
    if len > MAX_LENGTH {
        return Err(CidrError::MaskTooLong(len));
    }
    Ok(1u64 << (MAX_LENGTH - len))
}

/// IPv4 address with CIDR prefix length.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Cidr {
    /// The IPv4 address as written.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Ipv4Cidr {
    /// Create a new [`Ipv4Cidr`] from a CIDR string (e.g. "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4Cidr, CidrError> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| CidrError::InvalidFormat(addr_cidr.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrError::InvalidAddress(addr.to_string()))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| CidrError::InvalidMask(mask.to_string()))?;
        if mask > MAX_LENGTH {
            return Err(CidrError::MaskTooLong(mask));
        }
        Ok(Ipv4Cidr { addr, mask })
    }

    /// Build a block from a network address and prefix length.
    pub fn from_parts(addr: Ipv4Addr, mask: u8) -> Result<Ipv4Cidr, CidrError> {
        if mask > MAX_LENGTH {
            return Err(CidrError::MaskTooLong(mask));
        }
        Ok(Ipv4Cidr { addr, mask })
    }

    /// The default route, `0.0.0.0/0`.
    pub fn any() -> Ipv4Cidr {
        Ipv4Cidr {
            addr: Ipv4Addr::UNSPECIFIED,
            mask: 0,
        }
    }

    /// Lowest (network) address in the block.
    pub fn network(&self) -> Ipv4Addr {
        // mask is bounded by construction
        Ipv4Addr::from(u32::from(self.addr) & get_cidr_mask(self.mask).unwrap_or(u32::MAX))
    }

    /// Highest (broadcast) address in the block.
    pub fn broadcast(&self) -> Ipv4Addr {
        broadcast_addr(self.addr, self.mask).unwrap_or(self.addr)
    }

    /// Number of addresses covered by the block.
    pub fn num_addresses(&self) -> u64 {
        block_size(self.mask).unwrap_or(1)
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.mask >= self.mask
            && self.network() <= other.network()
            && other.broadcast() <= self.broadcast()
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Cidr::new(s)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4Cidr::new(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0).unwrap(), 0x00000000);
        assert_eq!(get_cidr_mask(16).unwrap(), 0xFFFF0000);
        assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
        assert_eq!(get_cidr_mask(32).unwrap(), 0xFFFFFFFF);
        assert_eq!(get_cidr_mask(33), Err(CidrError::MaskTooLong(33)));
    }

    #[test]
    fn test_align_up() {
        let ip = Ipv4Addr::new(10, 0, 0, 64);
        assert_eq!(align_up(ip, 26).unwrap(), Ipv4Addr::new(10, 0, 0, 64));
        assert_eq!(align_up(ip, 24).unwrap(), Ipv4Addr::new(10, 0, 1, 0));
        assert_eq!(
            align_up(Ipv4Addr::new(10, 0, 2, 0), 24).unwrap(),
            Ipv4Addr::new(10, 0, 2, 0)
        );
    }

    #[test]
    fn test_ip_after_subnet_overflow() {
        assert_eq!(
            ip_after_subnet(Ipv4Addr::new(10, 0, 0, 0), 24).unwrap(),
            Ipv4Addr::new(10, 0, 1, 0)
        );
        assert!(ip_after_subnet(Ipv4Addr::new(255, 255, 255, 0), 24).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let cidr: Ipv4Cidr = "10.1.0.0/16".parse().unwrap();
        assert_eq!(cidr.addr, Ipv4Addr::new(10, 1, 0, 0));
        assert_eq!(cidr.mask, 16);
        assert_eq!(cidr.to_string(), "10.1.0.0/16");
        assert_eq!(cidr.broadcast(), Ipv4Addr::new(10, 1, 255, 255));
        assert_eq!(cidr.num_addresses(), 65536);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Ipv4Cidr::new("10.0.0.0"),
            Err(CidrError::InvalidFormat(_))
        ));
        assert!(matches!(
            Ipv4Cidr::new("10.0.0/16"),
            Err(CidrError::InvalidAddress(_))
        ));
        assert!(matches!(
            Ipv4Cidr::new("10.0.0.0/x"),
            Err(CidrError::InvalidMask(_))
        ));
        assert_eq!(
            Ipv4Cidr::new("10.0.0.0/40"),
            Err(CidrError::MaskTooLong(40))
        );
    }

    #[test]
    fn test_contains() {
        let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        assert!(vpc.contains(&Ipv4Cidr::new("10.0.3.0/24").unwrap()));
        assert!(!vpc.contains(&Ipv4Cidr::new("10.1.0.0/24").unwrap()));
        assert!(!vpc.contains(&Ipv4Cidr::new("10.0.0.0/8").unwrap()));
    }

    #[test]
    fn test_serde_string_form() {
        let cidr = Ipv4Cidr::new("192.168.0.0/20").unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"192.168.0.0/20\"");
        let back: Ipv4Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);
        assert!(serde_json::from_str::<Ipv4Cidr>("\"nope\"").is_err());
    }
}
