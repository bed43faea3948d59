//! Address-space planning and validation logic.
//!
//! - [`partition`] - Splitting a VPC CIDR into per-zone public/private subnets
//! - [`validate`] - Static subnet checks against a declared VPC CIDR
//! - [`kubernetes`] - Pod/service/node network checks
//! - [`reconcile`] - Proposed subnets against a live VPC

mod kubernetes;
mod partition;
mod reconcile;
mod validate;

pub use kubernetes::{
    check_docker_bridge, check_kubernetes_cidrs_against_vpc, validate_host_prefix,
    validate_ip_in_network, validate_kubernetes_cidrs,
};
pub use partition::{partition_subnets, partition_vpc_cidr};
pub use reconcile::{reconcile_existing_vpc, Role};
pub use validate::{validate_new_vpc_subnets, validate_subnets};
