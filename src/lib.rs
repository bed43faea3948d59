//! Planning and validation of VPC address space for cluster installs.
//!
//! - [`models`] - CIDR blocks, subnets and VPC facts
//! - [`processing`] - Partitioning, subnet validation, Kubernetes checks, reconciliation
//! - [`facts`] - Where live VPC facts come from (AWS CLI, cache files)
//! - [`request`] - Whole-request validation with a JSON response
//! - [`output`] - CSV printing

pub mod config;
pub mod error;
pub mod facts;
pub mod models;
pub mod output;
pub mod processing;
pub mod request;

pub use error::{FactsError, ValidationError};
pub use facts::{CloudFacts, FactsSnapshot};
pub use models::{AddressSpace, SubnetDescriptor, SubnetPlan, VpcFacts};
pub use processing::{
    check_kubernetes_cidrs_against_vpc, partition_subnets, partition_vpc_cidr,
    reconcile_existing_vpc, validate_kubernetes_cidrs, validate_new_vpc_subnets,
    validate_subnets,
};
pub use request::{
    read_validation_request, validate_request, ValidationRequest, ValidationResponse,
};
