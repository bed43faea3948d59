//! Domain models for VPC subnet planning.
//!
//! This module contains the core data structures used throughout the application:
//! - [`AddressSpace`] - canonical IPv4 CIDR block
//! - [`SubnetDescriptor`] - zone-tagged subnet, new or existing
//! - [`VpcFacts`] and [`SubnetPlan`] - VPC topology and subnet sets

mod ipv4;
mod subnet;
mod vpc;

// Re-export public types
pub use ipv4::{broadcast_addr, cut_addr, get_cidr_mask, num_aws_hosts, AddressSpace, MAX_LENGTH};
pub use subnet::SubnetDescriptor;
pub use vpc::{InternetGateway, SubnetPlan, VpcFacts};
