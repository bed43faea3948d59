//! Reconciliation of proposed subnets with an existing VPC.
//!
//! Proposed subnets are either new (CIDR given) or reference an existing
//! subnet by id (CIDR filled in from the VPC). Checks run in a fixed order and
//! the first violation is returned.

use crate::error::ValidationError;
use crate::facts::CloudFacts;
use crate::models::{AddressSpace, SubnetDescriptor, SubnetPlan, VpcFacts};
use itertools::Itertools;

/// Role of a subnet in the cluster network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Public,
    Private,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Public => write!(f, "public"),
            Role::Private => write!(f, "private"),
        }
    }
}

/// A proposed subnet with its parsed block and position.
struct Proposed<'a> {
    role: Role,
    index: usize,
    subnet: &'a SubnetDescriptor,
    cidr: AddressSpace,
}

impl Proposed<'_> {
    fn label(&self) -> String {
        format!("{} subnet #{} {}", self.role, self.index, self.cidr)
    }
}

/// An existing subnet of the VPC with its parsed block.
struct Existing<'a> {
    role: Role,
    subnet: &'a SubnetDescriptor,
    cidr: AddressSpace,
}

impl Existing<'_> {
    fn label(&self) -> String {
        format!("existing {} subnet {} {}", self.role, self.subnet.id, self.cidr)
    }
}

/// Fill in the CIDR of every subnet that references an existing one by id.
///
/// Unknown ids are left empty and fail the later CIDR parse.
fn late_bind_cidrs(plan: &mut SubnetPlan, facts: &VpcFacts) {
    for subnet in plan.public.iter_mut().chain(plan.private.iter_mut()) {
        if subnet.is_existing() && subnet.cidr.trim().is_empty() {
            if let Some(found) = facts.find_subnet(&subnet.id) {
                subnet.cidr = found.cidr.clone();
            }
        }
    }
}

fn parse_role(role: Role, subnets: &[SubnetDescriptor]) -> Result<Vec<Proposed<'_>>, ValidationError> {
    subnets
        .iter()
        .enumerate()
        .map(|(index, subnet)| {
            Ok(Proposed {
                role,
                index,
                subnet,
                cidr: subnet.address_space()?,
            })
        })
        .collect()
}

fn check_duplicates(proposed: &[Proposed]) -> Result<(), ValidationError> {
    for (a, b) in proposed.iter().tuple_combinations() {
        if a.cidr == b.cidr {
            return Err(ValidationError::DuplicateSubnet {
                role: a.role.to_string(),
                cidr: a.cidr.to_string(),
                first_index: a.index,
                second_index: b.index,
            });
        }
    }
    Ok(())
}

/// Whether an exact match between `p` and `e` is the same subnet.
///
/// A subnet with an id only matches the record with that id. A new subnet
/// matches when no other existing record carries the same block, so two
/// existing subnets sharing a CIDR are never silently merged.
fn is_same_subnet(p: &Proposed, e: &Existing, existing: &[Existing]) -> bool {
    if p.cidr != e.cidr {
        return false;
    }
    if p.subnet.is_existing() {
        p.subnet.id == e.subnet.id
    } else {
        existing.iter().filter(|other| other.cidr == e.cidr).count() == 1
    }
}

/// Reconcile proposed public/private subnets with the live VPC `vpc_id`.
///
/// On success returns the proposed subnets with referenced CIDRs filled in.
pub fn reconcile_existing_vpc<F: CloudFacts + ?Sized>(
    facts: &F,
    vpc_id: &str,
    public: &[SubnetDescriptor],
    private: &[SubnetDescriptor],
) -> Result<SubnetPlan, ValidationError> {
    if vpc_id.trim().is_empty() {
        return Err(ValidationError::MissingVpcId);
    }
    let vpc_facts = facts.fetch_vpc_facts(vpc_id)?;
    if !vpc_facts.has_available_internet_gateway() {
        return Err(ValidationError::NoInternetGateway(vpc_id.to_string()));
    }

    let mut plan = SubnetPlan {
        public: public.to_vec(),
        private: private.to_vec(),
    };
    late_bind_cidrs(&mut plan, &vpc_facts);

    let proposed_public = parse_role(Role::Public, &plan.public)?;
    let proposed_private = parse_role(Role::Private, &plan.private)?;
    let proposed: Vec<&Proposed> = proposed_public.iter().chain(proposed_private.iter()).collect();

    let vpc = AddressSpace::new(&vpc_facts.cidr)?;
    if let Some(p) = proposed.iter().find(|p| !vpc.contains(&p.cidr)) {
        return Err(ValidationError::SubnetNotInVpc {
            index: p.index,
            subnet: p.cidr.to_string(),
            vpc: vpc.to_string(),
        });
    }

    if let Some(p) = proposed
        .iter()
        .find(|p| p.subnet.availability_zone.trim().is_empty())
    {
        return Err(ValidationError::MissingAvailabilityZone {
            cidr: p.cidr.to_string(),
        });
    }

    check_duplicates(&proposed_public)?;
    check_duplicates(&proposed_private)?;

    for (a, b) in proposed.iter().tuple_combinations() {
        if a.cidr.overlaps(&b.cidr) {
            return Err(ValidationError::SubnetsOverlap {
                first: a.label(),
                second: b.label(),
            });
        }
    }

    let existing = vpc_facts
        .public
        .iter()
        .map(|s| (Role::Public, s))
        .chain(vpc_facts.private.iter().map(|s| (Role::Private, s)))
        .map(|(role, subnet)| {
            Ok(Existing {
                role,
                subnet,
                cidr: subnet.address_space()?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    for p in &proposed {
        for e in &existing {
            if p.cidr.overlaps(&e.cidr) && !is_same_subnet(p, e, &existing) {
                return Err(ValidationError::SubnetsOverlap {
                    first: p.label(),
                    second: e.label(),
                });
            }
        }
    }

    // Only private-over-public is rejected; a private subnet proposed as public passes.
    for p in &proposed_private {
        if existing
            .iter()
            .any(|e| e.role == Role::Public && e.cidr == p.cidr)
        {
            return Err(ValidationError::RoleMismatch {
                cidr: p.cidr.to_string(),
            });
        }
    }

    Ok(plan)
}
