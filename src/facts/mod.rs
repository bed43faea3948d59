//! Cloud facts: where the live VPC topology comes from.
//!
//! - [`cli`] - Command execution for the cloud CLI
//! - [`aws`] - AWS `ec2 describe-*` queries and route-table classification
//! - [`cache`] - JSON snapshot files of gathered facts

mod aws;
mod cache;
mod cli;

use crate::error::FactsError;
use crate::models::VpcFacts;
use serde::{Deserialize, Serialize};

pub use aws::{
    classify_subnets, Association, AwsCli, Route, RouteTable, Subnet as AwsSubnet, Tag,
};
pub use cache::{default_cache_file, load_facts, read_facts_cache, write_facts_cache};
pub use cli::{run, CommandRunner, ShellRunner};

/// Source of facts about the cloud account, as seen by the validators.
///
/// Calls are synchronous and treated as blocking; each validation asks again.
pub trait CloudFacts {
    /// Availability zones of the current region, in order.
    fn list_availability_zones(&self) -> Result<Vec<String>, FactsError>;

    /// CIDR, existing public/private subnets and internet gateway of `vpc_id`.
    fn fetch_vpc_facts(&self, vpc_id: &str) -> Result<VpcFacts, FactsError>;
}

/// Facts already gathered, held in memory or loaded from a cache file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FactsSnapshot {
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub vpcs: Vec<VpcFacts>,
}

impl FactsSnapshot {
    pub fn new(zones: Vec<String>, vpcs: Vec<VpcFacts>) -> FactsSnapshot {
        FactsSnapshot { zones, vpcs }
    }

    pub fn has_vpc(&self, vpc_id: &str) -> bool {
        self.vpcs.iter().any(|v| v.vpc_id == vpc_id)
    }

    /// Add or replace the facts for one VPC.
    pub fn upsert_vpc(&mut self, facts: VpcFacts) {
        match self.vpcs.iter_mut().find(|v| v.vpc_id == facts.vpc_id) {
            Some(existing) => *existing = facts,
            None => self.vpcs.push(facts),
        }
    }
}

impl CloudFacts for FactsSnapshot {
    fn list_availability_zones(&self) -> Result<Vec<String>, FactsError> {
        Ok(self.zones.clone())
    }

    fn fetch_vpc_facts(&self, vpc_id: &str) -> Result<VpcFacts, FactsError> {
        self.vpcs
            .iter()
            .find(|v| v.vpc_id == vpc_id)
            .cloned()
            .ok_or_else(|| FactsError::VpcNotFound(vpc_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_lookup() {
        let mut snapshot = FactsSnapshot::new(
            vec!["us-west-2a".to_string()],
            vec![VpcFacts {
                vpc_id: "vpc-1".to_string(),
                cidr: "10.0.0.0/16".to_string(),
                ..Default::default()
            }],
        );
        assert_eq!(snapshot.list_availability_zones().unwrap(), vec!["us-west-2a"]);
        assert_eq!(snapshot.fetch_vpc_facts("vpc-1").unwrap().cidr, "10.0.0.0/16");
        assert!(matches!(
            snapshot.fetch_vpc_facts("vpc-2"),
            Err(FactsError::VpcNotFound(_))
        ));

        snapshot.upsert_vpc(VpcFacts {
            vpc_id: "vpc-1".to_string(),
            cidr: "10.1.0.0/16".to_string(),
            ..Default::default()
        });
        assert_eq!(snapshot.vpcs.len(), 1);
        assert_eq!(snapshot.fetch_vpc_facts("vpc-1").unwrap().cidr, "10.1.0.0/16");
    }
}
