//! Error types for planning a VPC deployment.
//!
//! Fatal conditions are [`ConfigError`] and [`TopologyError`]; both abort the run
//! before anything is handed to a provisioning adapter. Naming problems are not
//! errors, see [`crate::processing::NamingWarning`].

use thiserror::Error;

/// Result type alias for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while parsing or doing arithmetic on CIDR blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid CIDR format: {0}")]
    InvalidFormat(String),

    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("invalid subnet mask: {0}")]
    InvalidMask(String),

    #[error("network length /{0} is too long")]
    MaskTooLong(u8),

    #[error("address space overflow after {0}")]
    Overflow(String),
}

/// Malformed or incomplete configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment '{0}' not found in configuration")]
    UnknownEnvironment(String),

    #[error("use_transit_gateway is true but transit_gateway_id is missing")]
    MissingTransitGatewayId,

    #[error("use_transit_gateway is true but subnet_layers is empty")]
    EmptySubnetLayers,

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("configuration parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CIDR in configuration: {0}")]
    Cidr(#[from] CidrError),
}

/// A structural precondition failed while planning. Always fatal, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("no subnets found for last layer: {0}")]
    NoSubnetsForLastLayer(String),

    #[error("subnet {subnet} (/{mask}) is larger than the VPC block {vpc_cidr}")]
    SubnetLargerThanVpc {
        subnet: String,
        mask: u8,
        vpc_cidr: String,
    },

    #[error("VPC block {vpc_cidr} has no room left for subnet {subnet} (/{mask})")]
    AddressSpaceExhausted {
        subnet: String,
        mask: u8,
        vpc_cidr: String,
    },

    #[error("dependency cycle detected at {0}")]
    DependencyCycle(String),
}

/// Failures inside a provisioning adapter.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot order resources: {0}")]
    Ordering(#[from] TopologyError),
}

/// Top level error for the planning pipeline.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("provisioning error: {0}")]
    Provision(#[from] ProvisionError),
}
