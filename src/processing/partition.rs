//! Automatic subnet layout for a new VPC.
//!
//! The VPC block is cut into `4 * zones` equal blocks (rounded up to a power of
//! two). The first `zones` blocks become public subnets and the next `zones`
//! blocks private subnets; the rest stays free for later growth.

use crate::config::{ROLES_PER_ZONE, SUBNET_HEADROOM_FACTOR};
use crate::error::ValidationError;
use crate::models::{AddressSpace, SubnetDescriptor, SubnetPlan};

/// Number of prefix bits needed to cut a block into `blocks` pieces.
fn bits_for(blocks: u32) -> u8 {
    // ceil(log2(blocks)) for blocks >= 1
    (u32::BITS - (blocks - 1).leading_zeros()) as u8
}

/// Split `vpc` into one public and one private subnet per zone, in zone order.
pub fn partition_subnets(
    vpc: &AddressSpace,
    zones: &[String],
) -> Result<SubnetPlan, ValidationError> {
    let partition_err = |reason: String| ValidationError::Partition {
        cidr: vpc.to_string(),
        reason,
    };
    if zones.is_empty() {
        return Err(partition_err("no availability zones given".to_string()));
    }
    let zone_count = u32::try_from(zones.len())
        .map_err(|_| partition_err(format!("too many zones: {}", zones.len())))?;
    let blocks = zone_count
        .checked_mul(ROLES_PER_ZONE * SUBNET_HEADROOM_FACTOR)
        .ok_or_else(|| partition_err(format!("too many zones: {zone_count}")))?;
    let new_bits = bits_for(blocks);
    if u32::from(vpc.mask) + u32::from(new_bits) > 32 {
        return Err(partition_err(format!(
            "too small for {blocks} blocks ({} zones)",
            zone_count
        )));
    }

    let mut plan = SubnetPlan::default();
    for (i, zone) in (0u32..).zip(zones) {
        let public = vpc.subnet(new_bits, i)?;
        let private = vpc.subnet(new_bits, zone_count + i)?;
        plan.public.push(SubnetDescriptor::new(
            &format!("public-{zone}"),
            zone,
            &public.to_string(),
        ));
        plan.private.push(SubnetDescriptor::new(
            &format!("private-{zone}"),
            zone,
            &private.to_string(),
        ));
    }
    Ok(plan)
}

/// Parse `vpc_cidr` and partition it; see [`partition_subnets`].
pub fn partition_vpc_cidr(vpc_cidr: &str, zones: &[String]) -> Result<SubnetPlan, ValidationError> {
    let vpc = AddressSpace::new(vpc_cidr)?;
    partition_subnets(&vpc, zones)
}
