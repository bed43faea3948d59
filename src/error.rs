//! Error kinds returned by planning, validation and fact gathering.

use thiserror::Error;

/// Failure of an external cloud-facts lookup.
#[derive(Error, Debug)]
pub enum FactsError {
    #[error("VPC '{0}' not found")]
    VpcNotFound(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Error parsing {what}: path={path} error={reason}")]
    Parse {
        what: String,
        path: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single violation found while planning or validating an address space.
///
/// Validation stops at the first violation, so a call yields at most one of these.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid CIDR '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("subnet {cidr} has no availability zone")]
    MissingAvailabilityZone { cidr: String },

    #[error("subnet #{index} {subnet} is not within VPC {vpc}")]
    SubnetNotInVpc {
        index: usize,
        subnet: String,
        vpc: String,
    },

    /// `first` and `second` are labels such as `subnet #1 10.0.16.0/20`.
    #[error("{first} overlaps with {second}")]
    SubnetsOverlap { first: String, second: String },

    #[error("duplicate {role} subnet {cidr} at #{first_index} and #{second_index}")]
    DuplicateSubnet {
        role: String,
        cidr: String,
        first_index: usize,
        second_index: usize,
    },

    #[error("duplicate CIDR {0}")]
    DuplicateCidr(String),

    #[error("CIDR {first} overlaps with {second}")]
    CidrsOverlap { first: String, second: String },

    #[error("subnet {cidr} is a public subnet but was proposed as private")]
    RoleMismatch { cidr: String },

    #[error("no available internet gateway attached to VPC '{0}'")]
    NoInternetGateway(String),

    #[error("no VPC id given")]
    MissingVpcId,

    #[error("VPC '{0}' not found")]
    VpcNotFound(String),

    #[error("cloud lookup failed: {0}")]
    Lookup(FactsError),

    #[error("cannot partition {cidr}: {reason}")]
    Partition { cidr: String, reason: String },

    #[error("{cidr} overlaps with the default Docker bridge subnet {bridge}")]
    OverlapsDockerBridge { cidr: String, bridge: String },

    #[error("host prefix /{host_prefix} is invalid for pod network {cidr}")]
    InvalidHostPrefix { cidr: String, host_prefix: u8 },

    #[error("address {addr} is not within network {cidr}")]
    AddressNotInNetwork { addr: String, cidr: String },
}

impl From<FactsError> for ValidationError {
    fn from(err: FactsError) -> Self {
        match err {
            FactsError::VpcNotFound(id) => ValidationError::VpcNotFound(id),
            other => ValidationError::Lookup(other),
        }
    }
}

impl ValidationError {
    pub fn invalid_cidr(cidr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCidr {
            cidr: cidr.into(),
            reason: reason.into(),
        }
    }

    /// True when the input could not be evaluated at all, as opposed to being wrong.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ValidationError::VpcNotFound(_) | ValidationError::Lookup(_)
        )
    }
}
