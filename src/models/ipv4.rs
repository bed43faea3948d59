//! IPv4 address space and CIDR notation utilities.
//!
//! Provides [`AddressSpace`] for representing a canonical IPv4 CIDR block,
//! along with the mask arithmetic used to split and compare blocks.

use crate::error::ValidationError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

fn too_long(len: u8) -> ValidationError {
    ValidationError::invalid_cidr(format!("/{len}"), "Network length is too long")
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use vpc_subnet_planner::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, ValidationError> {
    if len > MAX_LENGTH {
        Err(too_long(len))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, ValidationError> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, ValidationError> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Calculate the number of usable host addresses in an AWS subnet.
///
/// AWS reserves 5 addresses per subnet (network, router, DNS, future use and broadcast).
pub fn num_aws_hosts(len: u8) -> Result<u64, ValidationError> {
    if len > MAX_LENGTH - 4 {
        // AWS refuses anything smaller than a /28
        Err(ValidationError::invalid_cidr(
            format!("/{len}"),
            "Network length is too long or invalid",
        ))
    } else {
        Ok((1u64 << (MAX_LENGTH - len)) - 5)
    }
}

/// Canonical IPv4 CIDR block: the host bits of `addr` below `mask` are always zero.
#[derive(Eq, Debug, Copy, Clone, Hash, PartialEq)]
pub struct AddressSpace {
    /// The network (base) address.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Serialize for AddressSpace {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressSpace {
    fn deserialize<D>(deserializer: D) -> Result<AddressSpace, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AddressSpace::new(&s).map_err(de::Error::custom)
    }
}

impl FromStr for AddressSpace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressSpace::new(s)
    }
}

impl AddressSpace {
    /// Parse a CIDR string (e.g. "10.0.0.0/16"), zeroing any host bits.
    pub fn new(addr_cidr: &str) -> Result<AddressSpace, ValidationError> {
        let addr_cidr = addr_cidr.trim();
        if addr_cidr.is_empty() {
            return Err(ValidationError::invalid_cidr(addr_cidr, "empty CIDR"));
        }
        let parts: Vec<&str> = addr_cidr.split('/').collect();
        if parts.len() != 2 {
            return Err(ValidationError::invalid_cidr(
                addr_cidr,
                "Invalid address/mask",
            ));
        }
        let addr: Ipv4Addr = parts[0].parse().map_err(|_| {
            ValidationError::invalid_cidr(addr_cidr, format!("Invalid address {}", parts[0]))
        })?;
        let bad_mask =
            || ValidationError::invalid_cidr(addr_cidr, format!("Invalid mask {}", parts[1]));
        // u8::from_str takes a leading '+'
        if parts[1].is_empty() || !parts[1].bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad_mask());
        }
        let mask: u8 = parts[1].parse().map_err(|_| bad_mask())?;
        if mask > MAX_LENGTH {
            return Err(ValidationError::invalid_cidr(
                addr_cidr,
                "Network length is too long",
            ));
        }
        Ok(AddressSpace {
            addr: cut_addr(addr, mask)?,
            mask,
        })
    }

    /// Get the lowest (network) address in the block.
    pub fn lo(&self) -> Ipv4Addr {
        self.addr
    }

    /// Get the highest (broadcast) address in the block.
    pub fn hi(&self) -> Ipv4Addr {
        let host_bits = (u64::from(u32::MAX) >> self.mask) as u32;
        Ipv4Addr::from(u32::from(self.addr) | host_bits)
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask)
    }

    /// True if `ip` lies within this block.
    pub fn contains_addr(&self, ip: Ipv4Addr) -> bool {
        self.lo() <= ip && ip <= self.hi()
    }

    /// True if the base address of `other` lies within this block.
    ///
    /// Only the base of `other` is considered, as with `net.IPNet.Contains`.
    pub fn contains(&self, other: &AddressSpace) -> bool {
        self.contains_addr(other.addr)
    }

    /// True if either block contains the other's base address.
    pub fn overlaps(&self, other: &AddressSpace) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// The `index`th block of `self` after adding `new_bits` to the prefix.
    pub fn subnet(&self, new_bits: u8, index: u32) -> Result<AddressSpace, ValidationError> {
        let mask = self
            .mask
            .checked_add(new_bits)
            .filter(|m| *m <= MAX_LENGTH)
            .ok_or_else(|| too_long(self.mask.saturating_add(new_bits)))?;
        if u64::from(index) >= (1u64 << new_bits) {
            return Err(ValidationError::invalid_cidr(
                self.to_string(),
                format!("subnet index {index} does not fit in {new_bits} bits"),
            ));
        }
        let offset = u64::from(index) << (MAX_LENGTH - mask);
        let base = u64::from(u32::from(self.addr)) + offset;
        Ok(AddressSpace {
            addr: Ipv4Addr::from(base as u32),
            mask,
        })
    }
}

impl std::fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0).unwrap(), 0x00000000);
        assert_eq!(get_cidr_mask(8).unwrap(), 0xFF000000);
        assert_eq!(get_cidr_mask(16).unwrap(), 0xFFFF0000);
        assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
        assert_eq!(get_cidr_mask(32).unwrap(), 0xFFFFFFFF);
        assert!(get_cidr_mask(33).is_err());
    }

    #[test]
    fn test_cut_addr() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(cut_addr(ip, 24).unwrap(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(cut_addr(ip, 16).unwrap(), Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(cut_addr(ip, 0).unwrap(), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(cut_addr(ip, 32).unwrap(), Ipv4Addr::new(192, 168, 1, 42));
        assert!(cut_addr(ip, 33).is_err());
    }

    #[test]
    fn test_broadcast_addr() {
        let ip = Ipv4Addr::new(192, 168, 1, 0);
        assert_eq!(
            broadcast_addr(ip, 24).unwrap(),
            Ipv4Addr::new(192, 168, 1, 255)
        );
        assert_eq!(
            broadcast_addr(ip, 8).unwrap(),
            Ipv4Addr::new(192, 255, 255, 255)
        );
        assert_eq!(
            broadcast_addr(ip, 32).unwrap(),
            Ipv4Addr::new(192, 168, 1, 0)
        );
    }

    #[test]
    fn test_num_aws_hosts() {
        assert_eq!(num_aws_hosts(16).unwrap(), 65531);
        assert_eq!(num_aws_hosts(24).unwrap(), 251);
        assert_eq!(num_aws_hosts(28).unwrap(), 11);
        assert!(num_aws_hosts(29).is_err());
    }

    #[test]
    fn test_new_canonicalizes_host_bits() {
        let a = AddressSpace::new("10.0.1.5/24").unwrap();
        assert_eq!(a.addr, Ipv4Addr::new(10, 0, 1, 0));
        assert_eq!(a, AddressSpace::new("10.0.1.0/24").unwrap());
        assert_eq!(a.to_string(), "10.0.1.0/24");
        assert_eq!(AddressSpace::new(" 10.2.3.4/16 ").unwrap().to_string(), "10.2.0.0/16");
    }

    #[test]
    fn test_new_rejects_malformed() {
        for bad in [
            "",
            "10.0.0.0",
            "10.0.0.0/99",
            "10.0.0/16",
            "a.b.c.d/8",
            "10.0.0.0/16/2",
            "10.0.0.0/-1",
            "10.0.0.0/+16",
            "10.0.0.0/",
        ] {
            let err = AddressSpace::new(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidCidr { .. }),
                "expected InvalidCidr for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_lo_hi_and_size() {
        let a = AddressSpace::new("10.0.0.0/8").unwrap();
        assert_eq!(a.lo(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(a.hi(), Ipv4Addr::new(10, 255, 255, 255));
        assert_eq!(a.size(), 1 << 24);
        let all = AddressSpace::new("0.0.0.0/0").unwrap();
        assert_eq!(all.hi(), Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(all.size(), 1 << 32);
    }

    #[test]
    fn test_contains_and_overlaps_reflexive() {
        let a = AddressSpace::new("10.0.0.0/16").unwrap();
        assert!(a.contains(&a));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_contains_checks_base_only() {
        let vpc = AddressSpace::new("10.0.0.0/16").unwrap();
        let inside = AddressSpace::new("10.0.20.0/24").unwrap();
        let outside = AddressSpace::new("10.1.0.0/24").unwrap();
        let wider = AddressSpace::new("10.0.0.0/8").unwrap();
        assert!(vpc.contains(&inside));
        assert!(!vpc.contains(&outside));
        assert!(!inside.contains(&vpc));
        // base of the /8 is inside the /16
        assert!(vpc.contains(&wider));
    }

    #[test]
    fn test_overlaps_symmetric() {
        let a = AddressSpace::new("10.0.0.0/16").unwrap();
        let b = AddressSpace::new("10.0.128.0/20").unwrap();
        let c = AddressSpace::new("10.1.0.0/16").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_contains_addr() {
        let a = AddressSpace::new("192.168.0.0/24").unwrap();
        assert!(a.contains_addr(Ipv4Addr::new(192, 168, 0, 255)));
        assert!(!a.contains_addr(Ipv4Addr::new(192, 168, 1, 0)));
    }

    #[test]
    fn test_subnet() {
        let vpc = AddressSpace::new("10.0.0.0/16").unwrap();
        assert_eq!(vpc.subnet(4, 0).unwrap().to_string(), "10.0.0.0/20");
        assert_eq!(vpc.subnet(4, 1).unwrap().to_string(), "10.0.16.0/20");
        assert_eq!(vpc.subnet(4, 15).unwrap().to_string(), "10.0.240.0/20");
        assert!(vpc.subnet(4, 16).is_err());
        assert!(vpc.subnet(17, 0).is_err());
        assert_eq!(vpc.subnet(0, 0).unwrap(), vpc);
    }

    #[test]
    fn test_serde_as_cidr_string() {
        let a: AddressSpace = serde_json::from_str("\"10.0.1.7/24\"").unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"10.0.1.0/24\"");
        assert!(serde_json::from_str::<AddressSpace>("\"10.0.1.0/33\"").is_err());
    }
}
