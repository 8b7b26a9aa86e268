//! Subnet layout planning.
//!
//! Expands the public group (if any) and each configured layer across the
//! requested AZ count.

use crate::models::{
    ConfigModel, DeploymentContext, NatGatewaySpec, NetworkPlan, SubnetKind, SubnetSpec,
    PUBLIC_LAYER_NAME,
};

/// Build the [`NetworkPlan`] for a validated config.
///
/// Produces exactly `az_count * (layers + public?)` subnet instances: the
/// public group first, then every layer in declared order, each expanded in
/// AZ order.
pub fn plan_network(config: &ConfigModel, ctx: &DeploymentContext) -> NetworkPlan {
    let azs = ctx.availability_zones(config.az_count);
    let mut subnets = Vec::with_capacity(azs.len() * (config.subnet_layers.len() + 1));

    if let Some(mask_bits) = config.public_mask() {
        expand_group(
            &mut subnets,
            PUBLIC_LAYER_NAME,
            mask_bits,
            SubnetKind::Public,
            &azs,
            config.shared_layer_route_tables,
        );
    }
    for layer in config.subnet_layers.iter() {
        expand_group(
            &mut subnets,
            &layer.name,
            layer.mask_bits,
            SubnetKind::PrivateEgress,
            &azs,
            config.shared_layer_route_tables,
        );
    }

    let nat_gateways = plan_nat_gateways(config, &subnets);
    log::info!(
        "network plan: {} subnets across {} AZs, {} NAT gateways",
        subnets.len(),
        azs.len(),
        nat_gateways.len()
    );

    NetworkPlan {
        vpc_cidr: config.vpc_cidr,
        subnets,
        nat_gateways,
    }
}

fn expand_group(
    subnets: &mut Vec<SubnetSpec>,
    name: &str,
    mask_bits: u8,
    kind: SubnetKind,
    azs: &[String],
    shared_route_table: bool,
) {
    for (az_index, az_name) in azs.iter().enumerate() {
        let subnet_id = format!("{name}Subnet{}", az_index + 1);
        let route_table = if shared_route_table {
            format!("{name}RouteTable")
        } else {
            format!("{subnet_id}RouteTable")
        };
        log::debug!("subnet {subnet_id} /{mask_bits} {kind} in {az_name}");
        subnets.push(SubnetSpec {
            logical_name: name.to_string(),
            mask_bits,
            kind,
            az_index,
            az_name: az_name.clone(),
            subnet_id,
            route_table,
        });
    }
}

/// One NAT gateway per public subnet, up to `nat_gateway_count`.
fn plan_nat_gateways(config: &ConfigModel, subnets: &[SubnetSpec]) -> Vec<NatGatewaySpec> {
    let wanted = config.nat_gateway_count as usize;
    let nats: Vec<NatGatewaySpec> = subnets
        .iter()
        .filter(|s| s.kind == SubnetKind::Public)
        .take(wanted)
        .map(|s| NatGatewaySpec {
            id: format!("{}NatGateway", s.subnet_id),
            subnet_id: s.subnet_id.clone(),
            depends_on: vec![s.resource_ref()],
        })
        .collect();
    if config.create_public_subnets && nats.len() < wanted {
        log::warn!(
            "nat_gateway_count={wanted} capped at {} (one per public subnet)",
            nats.len()
        );
    }
    nats
}
