//! Domain models for VPC planning.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Ipv4Cidr`] - IPv4 block with CIDR notation support
//! - [`ConfigModel`] - one environment's configuration
//! - [`NetworkPlan`], [`RoutingPlan`], [`DeploymentPlan`] - plan value objects
//! - [`EndpointPlan`], [`FlowLogPlan`] - supporting resources

mod config;
mod ipv4;
mod plan;
mod resources;

// Re-export public types
pub use config::{
    ConfigModel, DeploymentContext, EndpointToggles, SubnetLayer, SubnetLayers, DEFAULT_REGION,
    MAX_AZ_COUNT, PUBLIC_LAYER_NAME,
};
pub use ipv4::{
    align_up, block_size, broadcast_addr, cut_addr, get_cidr_mask, ip_after_subnet, Ipv4Cidr,
    MAX_LENGTH,
};
pub use plan::{
    resource_graph, topological_order, DeploymentPlan, NatGatewaySpec, NetworkPlan,
    ResourceRef, RouteEntry, RouteTarget, RoutingPlan, StackOutput, SubnetAllocation,
    SubnetKind, SubnetSpec, TagSet, TransitGatewayAttachment,
};
pub use resources::{
    Direction, EndpointPlan, FlowLogPlan, GatewayEndpoint, GatewayService, InterfaceEndpoint,
    KeyPolicyStatement, KeySource, NewKeySpec, SecurityGroupRule, SecurityGroupSpec,
};

#[cfg(test)]
pub(crate) use config::tests::base_config;
