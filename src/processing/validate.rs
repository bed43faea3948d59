//! Static subnet validation against a declared VPC CIDR, with no cloud lookup.

use crate::error::ValidationError;
use crate::models::{AddressSpace, SubnetDescriptor};
use itertools::Itertools;

/// Label used in overlap errors, e.g. `subnet #1 10.0.16.0/20`.
fn subnet_label(index: usize, cidr: &AddressSpace) -> String {
    format!("subnet #{index} {cidr}")
}

/// Validate `subnets` against `vpc_cidr`.
///
/// Checks, in order: the VPC CIDR parses; every subnet has a zone, parses and
/// lies inside the VPC; no two subnets overlap. The first violation is returned.
pub fn validate_subnets(
    vpc_cidr: &str,
    subnets: &[SubnetDescriptor],
) -> Result<(), ValidationError> {
    let vpc = AddressSpace::new(vpc_cidr)?;

    let mut parsed = Vec::with_capacity(subnets.len());
    for (i, subnet) in subnets.iter().enumerate() {
        if subnet.availability_zone.trim().is_empty() {
            return Err(ValidationError::MissingAvailabilityZone {
                cidr: subnet.cidr.clone(),
            });
        }
        let cidr = subnet.address_space()?;
        if !vpc.contains(&cidr) {
            return Err(ValidationError::SubnetNotInVpc {
                index: i,
                subnet: cidr.to_string(),
                vpc: vpc.to_string(),
            });
        }
        parsed.push(cidr);
    }

    for ((i, a), (j, b)) in parsed.iter().enumerate().tuple_combinations() {
        if a.overlaps(b) {
            return Err(ValidationError::SubnetsOverlap {
                first: subnet_label(i, a),
                second: subnet_label(j, b),
            });
        }
    }
    Ok(())
}

/// Validate the subnets of a VPC that does not exist yet.
///
/// Public and private lists are checked independently; they are not compared
/// against each other.
pub fn validate_new_vpc_subnets(
    vpc_cidr: &str,
    public: &[SubnetDescriptor],
    private: &[SubnetDescriptor],
) -> Result<(), ValidationError> {
    validate_subnets(vpc_cidr, public)?;
    validate_subnets(vpc_cidr, private)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(zone: &str, cidr: &str) -> SubnetDescriptor {
        SubnetDescriptor::new("", zone, cidr)
    }

    #[test]
    fn test_valid_subnets() {
        let subnets = vec![
            subnet("a", "10.0.0.0/20"),
            subnet("b", "10.0.16.0/20"),
            subnet("c", "10.0.32.0/20"),
        ];
        validate_subnets("10.0.0.0/16", &subnets).unwrap();
        validate_subnets("10.0.0.0/16", &[]).unwrap();
    }

    #[test]
    fn test_identical_cidrs_in_two_zones_overlap() {
        let subnets = vec![subnet("a", "10.0.0.0/20"), subnet("b", "10.0.0.0/20")];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        match err {
            ValidationError::SubnetsOverlap { first, second } => {
                assert_eq!(first, "subnet #0 10.0.0.0/20");
                assert_eq!(second, "subnet #1 10.0.0.0/20");
            }
            other => panic!("expected SubnetsOverlap, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_vpc_cidr() {
        let err = validate_subnets("10.0.0.0/99", &[]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCidr { .. }));
    }

    #[test]
    fn test_missing_zone_names_cidr() {
        let subnets = vec![subnet("a", "10.0.0.0/20"), subnet(" ", "10.0.16.0/20")];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingAvailabilityZone { ref cidr } if cidr == "10.0.16.0/20"
        ));
    }

    #[test]
    fn test_invalid_subnet_cidr() {
        let subnets = vec![subnet("a", "10.0.0.0/33")];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCidr { .. }));
    }

    #[test]
    fn test_subnet_not_in_vpc() {
        let subnets = vec![subnet("a", "10.0.0.0/20"), subnet("b", "10.1.0.0/20")];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::SubnetNotInVpc { index: 1, ref subnet, .. } if subnet == "10.1.0.0/20"
        ));
    }

    #[test]
    fn test_per_subnet_checks_run_before_overlap() {
        // overlap between #0 and #1 exists, but #2 is outside the VPC
        let subnets = vec![
            subnet("a", "10.0.0.0/20"),
            subnet("b", "10.0.8.0/24"),
            subnet("c", "192.168.0.0/24"),
        ];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        assert!(matches!(err, ValidationError::SubnetNotInVpc { index: 2, .. }));
    }

    #[test]
    fn test_first_overlap_reported_in_index_order() {
        let subnets = vec![
            subnet("a", "10.0.0.0/20"),
            subnet("b", "10.0.32.0/20"),
            subnet("c", "10.0.32.0/24"),
            subnet("d", "10.0.4.0/24"),
        ];
        let err = validate_subnets("10.0.0.0/16", &subnets).unwrap_err();
        match err {
            ValidationError::SubnetsOverlap { first, second } => {
                assert_eq!(first, "subnet #0 10.0.0.0/20");
                assert_eq!(second, "subnet #3 10.0.4.0/24");
            }
            other => panic!("expected SubnetsOverlap, got {other:?}"),
        }
    }

    #[test]
    fn test_new_vpc_lists_checked_independently() {
        let public = vec![subnet("a", "10.0.0.0/20")];
        let private = vec![subnet("a", "10.0.0.0/20")];
        validate_new_vpc_subnets("10.0.0.0/16", &public, &private).unwrap();

        let private = vec![subnet("a", "10.0.0.0/20"), subnet("b", "10.0.0.0/21")];
        let err = validate_new_vpc_subnets("10.0.0.0/16", &public, &private).unwrap_err();
        assert!(matches!(err, ValidationError::SubnetsOverlap { .. }));
    }
}
