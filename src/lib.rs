//! Plan a multi-AZ VPC, its transit gateway routing and tags from one
//! environment block of a CDK-style context file.
//!
//! The pipeline is pure: config in, [`DeploymentPlan`] out. Creating anything
//! is left to a [`provision::ProvisioningAdapter`].

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod provision;

use error::PlanResult;
use models::{
    resource_graph, ConfigModel, DeploymentContext, DeploymentPlan, ResourceRef, StackOutput,
};
use std::path::Path;

pub use error::{ConfigError, PlanError, TopologyError};

/// Build the full plan for one environment.
///
/// Fails on the first [`ConfigError`] or [`TopologyError`]; naming problems are
/// collected in [`DeploymentPlan::warnings`].
pub fn plan_deployment(config: &ConfigModel, ctx: &DeploymentContext) -> PlanResult<DeploymentPlan> {
    config.validate()?;

    let network = processing::plan_network(config, ctx);
    let allocations = processing::allocate_subnets(&network)?;
    let routing = processing::plan_routing(config, &network)?;
    let endpoints = processing::plan_endpoints(config, &network, ctx);
    let flow_logs = processing::plan_flow_logs(config, ctx);

    let graph = resource_graph(&network, routing.as_ref(), endpoints.as_ref(), &flow_logs);
    let (tags, warnings) =
        processing::resolve_tags(graph.iter().map(|(r, _)| r), &network, config, ctx);

    let plan = DeploymentPlan {
        env_name: ctx.env_name.clone(),
        stack_name: ctx.stack_name.clone(),
        network,
        allocations,
        routing,
        endpoints,
        flow_logs,
        tags,
        warnings,
        outputs: stack_outputs(ctx),
    };
    // Reject a plan that cannot be scheduled.
    plan.creation_order()?;
    log::info!(
        "plan for {}: {} resources, {} warning(s)",
        plan.stack_name,
        graph.len(),
        plan.warnings.len()
    );
    Ok(plan)
}

/// Load `env_name` from `config_file` and plan it.
pub fn plan_from_file(config_file: &Path, env_name: &str) -> PlanResult<DeploymentPlan> {
    let config = config::load_environment(config_file, env_name)?;
    let ctx = DeploymentContext::from_env(env_name);
    plan_deployment(&config, &ctx)
}

fn stack_outputs(ctx: &DeploymentContext) -> Vec<StackOutput> {
    vec![
        StackOutput {
            logical_id: "VPCId".to_string(),
            description: "VPC ID".to_string(),
            export_name: format!("{}-VPCId", ctx.stack_name),
            source: ResourceRef::Vpc,
            attribute: "VpcId".to_string(),
        },
        StackOutput {
            logical_id: "VPCCidr".to_string(),
            description: "VPC CIDR".to_string(),
            export_name: format!("{}-VPCCidr", ctx.stack_name),
            source: ResourceRef::Vpc,
            attribute: "CidrBlock".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::base_config;

    fn ctx() -> DeploymentContext {
        DeploymentContext::new("dev", "us-east-1")
    }

    #[test]
    fn test_plan_deployment_basic() {
        let plan = plan_deployment(&base_config(), &ctx()).unwrap();
        assert_eq!(plan.network.subnets.len(), 4);
        assert_eq!(plan.allocations.len(), 4);
        assert!(plan.routing.is_some());
        assert!(plan.endpoints.is_none());
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.outputs[0].export_name, "vpc-stack-dev-VPCId");
    }

    #[test]
    fn test_plan_deployment_fails_fast_on_config() {
        let mut config = base_config();
        config.subnet_layers = models::SubnetLayers::default();
        assert!(matches!(
            plan_deployment(&config, &ctx()),
            Err(PlanError::Config(ConfigError::EmptySubnetLayers))
        ));
    }

    #[test]
    fn test_plan_deployment_is_idempotent() {
        let mut config = base_config();
        config.create_public_subnets = true;
        config.public_subnet_mask_bits = Some(24);
        config.endpoints.session_manager = true;
        assert_eq!(
            plan_deployment(&config, &ctx()).unwrap(),
            plan_deployment(&config, &ctx()).unwrap()
        );
    }

    #[test]
    fn test_creation_order_attachment_before_routes() {
        let plan = plan_deployment(&base_config(), &ctx()).unwrap();
        let order = plan.creation_order().unwrap();
        let pos = |r: &ResourceRef| order.iter().position(|o| o == r).unwrap();
        let att = ResourceRef::TransitGatewayAttachment("TgwAttachment".to_string());

        assert_eq!(order[0], ResourceRef::Vpc);
        for route in plan.routing.as_ref().unwrap().routes() {
            assert!(pos(&att) < pos(&ResourceRef::Route(route.id.clone())));
        }
        assert!(pos(&ResourceRef::Subnet("dataSubnet2".to_string())) < pos(&att));
    }
}
