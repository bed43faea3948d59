//! VPC data model: the facts discovered about a live VPC and the subnet plan for one.

use super::SubnetDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internet gateway attached to a VPC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InternetGateway {
    pub id: String,
    /// Attachment state as reported by the cloud, e.g. `available`.
    pub state: String,
}

impl InternetGateway {
    pub fn is_available(&self) -> bool {
        self.state == "available"
    }
}

/// Snapshot of a live VPC, fetched once per validation call.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VpcFacts {
    pub vpc_id: String,
    /// Primary CIDR block of the VPC.
    pub cidr: String,
    /// Existing subnets whose default route goes to an internet gateway.
    #[serde(default)]
    pub public: Vec<SubnetDescriptor>,
    /// Existing subnets whose default route goes elsewhere.
    #[serde(default)]
    pub private: Vec<SubnetDescriptor>,
    #[serde(default)]
    pub internet_gateway: Option<InternetGateway>,
}

impl VpcFacts {
    pub fn has_available_internet_gateway(&self) -> bool {
        self.internet_gateway
            .as_ref()
            .is_some_and(InternetGateway::is_available)
    }

    /// Existing subnets, public first.
    pub fn existing_subnets(&self) -> impl Iterator<Item = &SubnetDescriptor> {
        self.public.iter().chain(self.private.iter())
    }

    /// Find an existing subnet by its cloud identifier.
    pub fn find_subnet(&self, id: &str) -> Option<&SubnetDescriptor> {
        self.existing_subnets().find(|s| s.id == id)
    }
}

impl fmt::Display for VpcFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let igw = match &self.internet_gateway {
            Some(igw) => format!("{} ({})", igw.id, igw.state),
            None => "no internet gateway".to_string(),
        };
        write!(
            f,
            "{} [{}] ({} public, {} private subnets, {})",
            self.vpc_id,
            self.cidr,
            self.public.len(),
            self.private.len(),
            igw
        )
    }
}

/// Public and private subnet sets for a cluster network.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SubnetPlan {
    pub public: Vec<SubnetDescriptor>,
    pub private: Vec<SubnetDescriptor>,
}
