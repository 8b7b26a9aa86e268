//! Planning logic.
//!
//! This module turns a validated config into plan values:
//! - [`topology`] - subnet layout across AZs
//! - [`routing`] - transit gateway attachment and routes
//! - [`dedup`] - one route per (route table, destination)
//! - [`naming`] - layer resolution and tags
//! - [`allocation`] - concrete subnet CIDRs
//! - [`endpoints`], [`flow_logs`] - supporting resources

mod allocation;
mod dedup;
mod endpoints;
mod flow_logs;
mod naming;
mod routing;
mod topology;

// Re-export public functions
pub use allocation::allocate_subnets;
pub use dedup::{dedup_routes, without_existing};
pub use endpoints::plan_endpoints;
pub use flow_logs::plan_flow_logs;
pub use naming::{
    az_identifier, resolve_layer, resolve_tags, subnet_name, vpc_name, LayerMatch, NamingWarning,
};
pub use routing::{plan_routing, AdditionalRouteScope, ATTACHMENT_ID};
pub use topology::plan_network;
