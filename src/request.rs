//! Validation request/response documents.
//!
//! A request carries the whole network layout of a cluster install. It is
//! checked as a unit and answered with a [`ValidationResponse`].

use crate::error::{FactsError, ValidationError};
use crate::facts::CloudFacts;
use crate::models::SubnetDescriptor;
use crate::processing::{
    check_docker_bridge, check_kubernetes_cidrs_against_vpc, reconcile_existing_vpc,
    validate_host_prefix, validate_ip_in_network, validate_kubernetes_cidrs,
    validate_new_vpc_subnets,
};
use serde::{Deserialize, Serialize};

/// Network layout to validate.
///
/// With `aws_vpc_id` set the subnets are reconciled against that VPC and
/// `vpc_cidr` is ignored; otherwise they are checked against `vpc_cidr`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ValidationRequest {
    #[serde(rename = "vpcCIDR")]
    pub vpc_cidr: String,
    #[serde(rename = "podCIDR")]
    pub pod_cidr: String,
    #[serde(rename = "serviceCIDR")]
    pub service_cidr: String,
    #[serde(rename = "publicSubnets")]
    pub public_subnets: Vec<SubnetDescriptor>,
    #[serde(rename = "privateSubnets")]
    pub private_subnets: Vec<SubnetDescriptor>,
    #[serde(rename = "awsVpcId")]
    pub aws_vpc_id: String,
    /// Per-node pod subnet prefix length.
    #[serde(rename = "hostPrefix", skip_serializing_if = "Option::is_none")]
    pub host_prefix: Option<u8>,
    /// API virtual IP; must sit inside the machine (VPC) network.
    #[serde(rename = "apiVIP", skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<String>,
}

impl ValidationRequest {
    pub fn targets_existing_vpc(&self) -> bool {
        !self.aws_vpc_id.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidationResponse {
    pub message: String,
    pub valid: bool,
}

impl ValidationResponse {
    pub fn valid() -> ValidationResponse {
        ValidationResponse {
            message: String::new(),
            valid: true,
        }
    }

    pub fn invalid(err: &ValidationError) -> ValidationResponse {
        ValidationResponse {
            message: err.to_string(),
            valid: false,
        }
    }
}

/// Read a request document from `file`, reporting the JSON path of a bad field.
pub fn read_validation_request(file: &str) -> Result<ValidationRequest, FactsError> {
    log::info!("Reading validation request: {file}");
    let json = std::fs::read_to_string(file)?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| FactsError::Parse {
        what: file.to_string(),
        path: e.path().to_string(),
        reason: e.inner().to_string(),
    })
}

fn check_request<F: CloudFacts + ?Sized>(
    facts: &F,
    request: &ValidationRequest,
    strict_docker_bridge: bool,
) -> Result<(), ValidationError> {
    let machine_cidr = if request.targets_existing_vpc() {
        check_kubernetes_cidrs_against_vpc(
            facts,
            &request.aws_vpc_id,
            &request.pod_cidr,
            &request.service_cidr,
        )?
    } else {
        validate_kubernetes_cidrs(&request.vpc_cidr, &request.pod_cidr, &request.service_cidr)?;
        request.vpc_cidr.clone()
    };

    if let Some(host_prefix) = request.host_prefix {
        validate_host_prefix(&request.pod_cidr, host_prefix)?;
    }

    check_docker_bridge(
        &[
            machine_cidr.as_str(),
            request.pod_cidr.as_str(),
            request.service_cidr.as_str(),
        ],
        strict_docker_bridge,
    )?;

    if let Some(api_vip) = &request.api_vip {
        validate_ip_in_network(api_vip, &machine_cidr)?;
    }

    if request.targets_existing_vpc() {
        reconcile_existing_vpc(
            facts,
            &request.aws_vpc_id,
            &request.public_subnets,
            &request.private_subnets,
        )?;
    } else {
        validate_new_vpc_subnets(
            &request.vpc_cidr,
            &request.public_subnets,
            &request.private_subnets,
        )?;
    }
    Ok(())
}

/// Validate `request`, asking `facts` about the VPC when it names one.
///
/// A wrong layout is answered with `valid: false`. A layout that could not be
/// checked because the lookup failed is returned as `Err`.
pub fn validate_request<F: CloudFacts + ?Sized>(
    facts: &F,
    request: &ValidationRequest,
    strict_docker_bridge: bool,
) -> Result<ValidationResponse, ValidationError> {
    match check_request(facts, request, strict_docker_bridge) {
        Ok(()) => Ok(ValidationResponse::valid()),
        Err(e) if e.is_lookup_failure() => Err(e),
        Err(e) => Ok(ValidationResponse::invalid(&e)),
    }
}
