//! CIDR range partitioning and range-derived queries.
//!
//! A profile's address range is divided across its parallel server
//! processes by arithmetic splitting: `split*(range, n)` yields the `n`
//! equal, contiguous child blocks in ascending address order, starting at
//! the network address. The ordering feeds device and file naming, so it
//! must be stable across runs.
//!
//! IPv6 host arithmetic goes through `u128`; no floating point anywhere.

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use crate::error::CoreError;

/// Split an IPv4 range into `n` equal contiguous sub-ranges.
pub fn split4(range: Ipv4Net, n: usize) -> Result<Vec<Ipv4Net>, CoreError> {
    let new_prefix = child_prefix(IpNet::V4(range), n)?;
    let subnets = range
        .trunc()
        .subnets(new_prefix)
        .map_err(|_| CoreError::RangeExhausted {
            range: range.to_string(),
            count: n,
        })?;
    Ok(subnets.collect())
}

/// Split an IPv6 range into `n` equal contiguous sub-ranges.
pub fn split6(range: Ipv6Net, n: usize) -> Result<Vec<Ipv6Net>, CoreError> {
    let new_prefix = child_prefix(IpNet::V6(range), n)?;
    let subnets = range
        .trunc()
        .subnets(new_prefix)
        .map_err(|_| CoreError::RangeExhausted {
            range: range.to_string(),
            count: n,
        })?;
    Ok(subnets.collect())
}

/// Child prefix length for an `n`-way split, validating the partition count
/// against the range's address width.
fn child_prefix(range: IpNet, n: usize) -> Result<u8, CoreError> {
    if n == 0 || !n.is_power_of_two() {
        return Err(CoreError::InvalidPartitionCount {
            range: range.to_string(),
            count: n,
        });
    }

    // log2(n) extra prefix bits; n is u64-sized at most, so this fits u8.
    let extra = u8::try_from(n.trailing_zeros()).unwrap_or(u8::MAX);
    range
        .prefix_len()
        .checked_add(extra)
        .filter(|p| *p <= range.max_prefix_len())
        .ok_or_else(|| CoreError::RangeExhausted {
            range: range.to_string(),
            count: n,
        })
}

/// First usable host address of an IPv4 range (network + 1).
pub fn first_host4(range: Ipv4Net) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(range.network()).wrapping_add(1))
}

/// First usable host address of an IPv6 range (network + 1).
pub fn first_host6(range: Ipv6Net) -> Ipv6Addr {
    Ipv6Addr::from(u128::from(range.network()).wrapping_add(1))
}

/// Usable IPv4 host count, with network and broadcast reserved.
pub fn usable_hosts4(range: Ipv4Net) -> u64 {
    let host_bits = 32 - u32::from(range.prefix_len());
    (1u64 << host_bits).saturating_sub(2)
}

/// `network/prefix` string form, as used by `server-ipv6` and route pushes.
pub fn addr_prefix6(range: Ipv6Net) -> String {
    format!("{}/{}", range.network(), range.prefix_len())
}
