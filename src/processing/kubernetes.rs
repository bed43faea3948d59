//! Kubernetes pod/service network checks.
//!
//! Pod, service and (when there is one) node/VPC networks must be well formed
//! and must not overlap each other.

use crate::config::DOCKER_BRIDGE_CIDR;
use crate::error::ValidationError;
use crate::facts::CloudFacts;
use crate::models::{AddressSpace, MAX_LENGTH};
use itertools::Itertools;
use std::net::Ipv4Addr;

/// Validate that `vpc_cidr`, `pod_cidr` and `service_cidr` are pairwise disjoint.
///
/// `vpc_cidr` may be empty (e.g. bare metal), in which case only pod and
/// service networks are compared. Exact duplicates fail with
/// [`ValidationError::DuplicateCidr`], any other overlap with
/// [`ValidationError::CidrsOverlap`].
pub fn validate_kubernetes_cidrs(
    vpc_cidr: &str,
    pod_cidr: &str,
    service_cidr: &str,
) -> Result<(), ValidationError> {
    let candidates: Vec<&str> = if vpc_cidr.trim().is_empty() {
        vec![pod_cidr, service_cidr]
    } else {
        vec![vpc_cidr, pod_cidr, service_cidr]
    };

    let parsed = candidates
        .iter()
        .map(|c| AddressSpace::new(c))
        .collect::<Result<Vec<_>, _>>()?;

    for (a, b) in parsed.iter().tuple_combinations() {
        if a == b {
            return Err(ValidationError::DuplicateCidr(a.to_string()));
        }
    }
    for (a, b) in parsed.iter().tuple_combinations() {
        if a.overlaps(b) {
            return Err(ValidationError::CidrsOverlap {
                first: a.to_string(),
                second: b.to_string(),
            });
        }
    }
    Ok(())
}

/// Look up the live CIDR of `vpc_id` and run [`validate_kubernetes_cidrs`] with it.
///
/// Returns the live VPC CIDR so later machine-network checks can use it.
pub fn check_kubernetes_cidrs_against_vpc<F: CloudFacts + ?Sized>(
    facts: &F,
    vpc_id: &str,
    pod_cidr: &str,
    service_cidr: &str,
) -> Result<String, ValidationError> {
    if vpc_id.trim().is_empty() {
        return Err(ValidationError::MissingVpcId);
    }
    let vpc = facts.fetch_vpc_facts(vpc_id)?;
    validate_kubernetes_cidrs(&vpc.cidr, pod_cidr, service_cidr)?;
    Ok(vpc.cidr)
}

/// Check `cidrs` against the default Docker bridge network.
///
/// With `strict` (nodes run as local containers or VMs next to a Docker
/// daemon) an overlap is an error; otherwise it is only logged.
pub fn check_docker_bridge(cidrs: &[&str], strict: bool) -> Result<(), ValidationError> {
    let bridge = AddressSpace::new(DOCKER_BRIDGE_CIDR)?;
    for cidr in cidrs.iter().filter(|c| !c.trim().is_empty()) {
        let net = AddressSpace::new(cidr)?;
        if net.overlaps(&bridge) {
            if strict {
                return Err(ValidationError::OverlapsDockerBridge {
                    cidr: net.to_string(),
                    bridge: bridge.to_string(),
                });
            }
            log::warn!("{net} overlaps with default Docker Bridge subnet {bridge}");
        }
    }
    Ok(())
}

/// Per-node pod subnet size must fit inside the pod network.
pub fn validate_host_prefix(pod_cidr: &str, host_prefix: u8) -> Result<(), ValidationError> {
    let pod = AddressSpace::new(pod_cidr)?;
    if host_prefix < pod.mask || host_prefix > MAX_LENGTH {
        return Err(ValidationError::InvalidHostPrefix {
            cidr: pod.to_string(),
            host_prefix,
        });
    }
    Ok(())
}

/// Confirm that `ip` (e.g. an API virtual IP) lies within `cidr`.
pub fn validate_ip_in_network(ip: &str, cidr: &str) -> Result<(), ValidationError> {
    let net = AddressSpace::new(cidr)?;
    let addr: Ipv4Addr = ip.trim().parse().map_err(|_| ValidationError::AddressNotInNetwork {
        addr: ip.to_string(),
        cidr: net.to_string(),
    })?;
    if !net.contains_addr(addr) {
        return Err(ValidationError::AddressNotInNetwork {
            addr: addr.to_string(),
            cidr: net.to_string(),
        });
    }
    Ok(())
}
