//! Subnet data model.

use super::AddressSpace;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A zone-tagged subnet, either proposed by the user or discovered in the cloud.
///
/// `cidr` is kept as the raw text so that a missing or late-bound block can be
/// reported against the subnet that carries it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetDescriptor {
    /// Cloud identifier, set only when the subnet already exists.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Logical name (ignored when `id` is set).
    #[serde(default)]
    pub name: String,
    /// Availability zone label.
    #[serde(default)]
    pub availability_zone: String,
    /// CIDR block, possibly empty until reconciliation fills it in.
    #[serde(default, rename = "instanceCIDR", alias = "cidr")]
    pub cidr: String,
}

impl SubnetDescriptor {
    /// A new (not yet existing) subnet.
    pub fn new(name: &str, availability_zone: &str, cidr: &str) -> SubnetDescriptor {
        SubnetDescriptor {
            id: String::new(),
            name: name.to_string(),
            availability_zone: availability_zone.to_string(),
            cidr: cidr.to_string(),
        }
    }

    /// A subnet that already exists in the cloud under `id`.
    pub fn existing(id: &str, availability_zone: &str, cidr: &str) -> SubnetDescriptor {
        SubnetDescriptor {
            id: id.to_string(),
            name: String::new(),
            availability_zone: availability_zone.to_string(),
            cidr: cidr.to_string(),
        }
    }

    pub fn is_existing(&self) -> bool {
        !self.id.is_empty()
    }

    /// Parse `cidr`, naming the subnet when it is missing or malformed.
    pub fn address_space(&self) -> Result<AddressSpace, ValidationError> {
        AddressSpace::new(&self.cidr).map_err(|e| match e {
            ValidationError::InvalidCidr { reason, .. } => ValidationError::InvalidCidr {
                cidr: self.cidr.clone(),
                reason: format!("subnet '{}': {reason}", self.label()),
            },
            other => other,
        })
    }

    /// Identifier if present, else name, else zone.
    pub fn label(&self) -> &str {
        if self.is_existing() {
            &self.id
        } else if !self.name.is_empty() {
            &self.name
        } else {
            &self.availability_zone
        }
    }
}
