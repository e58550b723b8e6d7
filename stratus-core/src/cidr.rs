//! IPv4 CIDR blocks and subnet carving

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("Invalid CIDR format '{0}': expected IP/prefix")]
    Format(String),

    #[error("Invalid IP address '{0}': expected 4 octets of 0-255")]
    Address(String),

    #[error("Invalid prefix length '{0}': must be 0-32")]
    Prefix(String),

    #[error("Address {address} has host bits set for /{prefix}")]
    HostBitsSet { address: Ipv4Addr, prefix: u8 },

    #[error("Subnet mask /{mask} is not narrower than block {block}")]
    InvalidMask { block: Ipv4Cidr, mask: u8 },

    #[error("Block {block} cannot hold {requested} subnets of /{mask} (room for {available})")]
    InsufficientSpace {
        block: Ipv4Cidr,
        mask: u8,
        requested: usize,
        available: u64,
    },
}

/// An IPv4 network block such as `10.0.0.0/18`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::Prefix(prefix.to_string()));
        }
        if u32::from(network) & !mask_bits(prefix) != 0 {
            return Err(CidrError::HostBitsSet {
                address: network,
                prefix,
            });
        }
        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    fn first(&self) -> u64 {
        u64::from(u32::from(self.network))
    }

    fn last(&self) -> u64 {
        self.first() + self.size() - 1
    }

    /// True if `other` lies entirely within this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix && other.first() >= self.first() && other.last() <= self.last()
    }

    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// Allocate `count` consecutive `/mask` blocks from the start of this block
    pub fn carve(&self, mask: u8, count: usize) -> Result<Vec<Ipv4Cidr>, CidrError> {
        if mask > 32 {
            return Err(CidrError::Prefix(mask.to_string()));
        }
        if mask < self.prefix {
            return Err(CidrError::InvalidMask { block: *self, mask });
        }

        let available = 1u64 << (u32::from(mask) - u32::from(self.prefix));
        if count as u64 > available {
            return Err(CidrError::InsufficientSpace {
                block: *self,
                mask,
                requested: count,
                available,
            });
        }

        let step = 1u64 << (32 - u32::from(mask));
        (0..count as u64)
            .map(|i| {
                // Bounded by `available`, so the address fits in 32 bits
                let start = (self.first() + i * step) as u32;
                Ipv4Cidr::new(Ipv4Addr::from(start), mask)
            })
            .collect()
    }
}

fn mask_bits(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrError::Format(s.to_string()))?;

        let octets: Vec<&str> = ip.split('.').collect();
        if octets.len() != 4 {
            return Err(CidrError::Address(ip.to_string()));
        }
        let mut bytes = [0u8; 4];
        for (byte, octet) in bytes.iter_mut().zip(&octets) {
            if octet.is_empty() || !octet.chars().all(|c| c.is_ascii_digit()) {
                return Err(CidrError::Address(ip.to_string()));
            }
            *byte = octet
                .parse::<u8>()
                .map_err(|_| CidrError::Address(ip.to_string()))?;
        }

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(CidrError::Prefix(prefix.to_string()));
        }
        let prefix = prefix
            .parse::<u8>()
            .map_err(|_| CidrError::Prefix(prefix.to_string()))?;

        Ipv4Cidr::new(Ipv4Addr::from(bytes), prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> Ipv4Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(cidr("10.0.0.0/18").to_string(), "10.0.0.0/18");
        assert_eq!(cidr("0.0.0.0/0").size(), 1 << 32);
        assert_eq!(cidr("203.0.113.5/32").size(), 1);
    }

    #[test]
    fn parse_rejects_malformed_blocks() {
        assert!(matches!("10.0.0.0".parse::<Ipv4Cidr>(), Err(CidrError::Format(_))));
        assert!(matches!("10.0.0/16".parse::<Ipv4Cidr>(), Err(CidrError::Address(_))));
        assert!(matches!("10.0.0.256/16".parse::<Ipv4Cidr>(), Err(CidrError::Address(_))));
        assert!(matches!("10.0.0.0/33".parse::<Ipv4Cidr>(), Err(CidrError::Prefix(_))));
        assert!(matches!("10.0.0.1/24".parse::<Ipv4Cidr>(), Err(CidrError::HostBitsSet { .. })));
        assert!("+1.0.0.0/8".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn carve_allocates_consecutive_disjoint_blocks() {
        let block = cidr("10.0.0.0/18");
        let subnets = block.carve(24, 2).unwrap();
        assert_eq!(subnets, vec![cidr("10.0.0.0/24"), cidr("10.0.1.0/24")]);
        assert!(subnets.iter().all(|s| block.contains(s)));
        assert!(!subnets[0].overlaps(&subnets[1]));
    }

    #[test]
    fn carve_reports_insufficient_space() {
        let err = cidr("10.0.0.0/23").carve(24, 3).unwrap_err();
        assert_eq!(
            err,
            CidrError::InsufficientSpace {
                block: cidr("10.0.0.0/23"),
                mask: 24,
                requested: 3,
                available: 2,
            }
        );
        assert!(matches!(
            cidr("10.0.0.0/24").carve(16, 1),
            Err(CidrError::InvalidMask { .. })
        ));
    }

    #[test]
    fn containment_and_overlap() {
        let vpc = cidr("10.0.0.0/18");
        assert!(vpc.contains(&cidr("10.0.63.0/24")));
        assert!(!vpc.contains(&cidr("10.0.64.0/24")));
        assert!(!cidr("10.0.0.0/24").contains(&vpc));
        assert!(vpc.overlaps(&cidr("10.0.0.0/8")));
        assert!(!vpc.overlaps(&cidr("10.1.0.0/16")));
    }
}
