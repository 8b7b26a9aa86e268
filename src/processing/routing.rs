//! Transit gateway attachment and route wiring.
//!
//! Every route declares a dependency on the attachment; the provisioning layer
//! schedules creation from those edges.

use super::dedup::{dedup_routes, without_existing};
use crate::error::{ConfigError, PlanResult, TopologyError};
use crate::models::{
    ConfigModel, Ipv4Cidr, NetworkPlan, ResourceRef, RouteEntry, RouteTarget, RoutingPlan,
    SubnetSpec, TransitGatewayAttachment,
};

/// Logical id of the single transit gateway attachment.
pub const ATTACHMENT_ID: &str = "TgwAttachment";

/// Which route tables receive the `additional_cidrs` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalRouteScope {
    /// Public and private route tables.
    AllSubnets,
    /// Private route tables only.
    PrivateOnly,
}

impl AdditionalRouteScope {
    pub fn from_config(config: &ConfigModel) -> AdditionalRouteScope {
        if config.public_subnet_with_tgw_enabled {
            AdditionalRouteScope::AllSubnets
        } else {
            AdditionalRouteScope::PrivateOnly
        }
    }
}

/// Plan transit gateway routing. Returns `Ok(None)` when no gateway is used.
pub fn plan_routing(config: &ConfigModel, network: &NetworkPlan) -> PlanResult<Option<RoutingPlan>> {
    if !config.use_transit_gateway {
        log::debug!("use_transit_gateway=false, no routing plan");
        return Ok(None);
    }
    let tgw_id = config
        .transit_gateway_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ConfigError::MissingTransitGatewayId)?;

    let attachment = plan_attachment(config, network, tgw_id)?;
    let attachment_ref = attachment.resource_ref();
    let target = RouteTarget::TransitGateway(tgw_id.to_string());

    let default_routes: Vec<RouteEntry> = network
        .subnets
        .iter()
        .enumerate()
        .map(|(i, subnet)| RouteEntry {
            id: format!("TransitGatewayRoute{i}"),
            route_table: subnet.route_table.clone(),
            destination: Ipv4Cidr::any(),
            target: target.clone(),
            depends_on: vec![attachment_ref.clone()],
        })
        .collect();
    let default_routes = dedup_routes(default_routes);

    let additional_routes = if config.additional_cidrs.is_empty() {
        vec![]
    } else {
        let scope = AdditionalRouteScope::from_config(config);
        let routes = additional_routes(
            scoped_subnets(network, scope),
            &config.additional_cidrs,
            &target,
            &attachment_ref,
        );
        without_existing(dedup_routes(routes), &default_routes)
    };

    log::info!(
        "routing plan: attachment on {} subnet(s), {} default route(s), {} additional route(s)",
        attachment.subnet_ids.len(),
        default_routes.len(),
        additional_routes.len()
    );

    Ok(Some(RoutingPlan {
        attachment,
        default_routes,
        additional_routes,
    }))
}

/// Attach the gateway to every instance of the last configured layer.
fn plan_attachment(
    config: &ConfigModel,
    network: &NetworkPlan,
    tgw_id: &str,
) -> Result<TransitGatewayAttachment, TopologyError> {
    let last_layer = config
        .subnet_layers
        .last()
        .map(|l| l.name.as_str())
        .unwrap_or_default();
    let subnet_ids: Vec<String> = network
        .layer_instances(last_layer)
        .map(|s| s.subnet_id.clone())
        .collect();
    if subnet_ids.is_empty() {
        log::error!("no subnets found for the last layer: '{last_layer}'");
        return Err(TopologyError::NoSubnetsForLastLayer(last_layer.to_string()));
    }

    let mut depends_on = vec![ResourceRef::Vpc];
    depends_on.extend(subnet_ids.iter().map(|id| ResourceRef::Subnet(id.clone())));
    Ok(TransitGatewayAttachment {
        id: ATTACHMENT_ID.to_string(),
        transit_gateway_id: tgw_id.to_string(),
        subnet_ids,
        depends_on,
    })
}

/// Public subnets first, then private, as the scope allows.
fn scoped_subnets(network: &NetworkPlan, scope: AdditionalRouteScope) -> Vec<&SubnetSpec> {
    match scope {
        AdditionalRouteScope::AllSubnets => network
            .public_subnets()
            .chain(network.private_subnets())
            .collect(),
        AdditionalRouteScope::PrivateOnly => network.private_subnets().collect(),
    }
}

fn additional_routes(
    subnets: Vec<&SubnetSpec>,
    cidrs: &[Ipv4Cidr],
    target: &RouteTarget,
    attachment_ref: &ResourceRef,
) -> Vec<RouteEntry> {
    let mut routes = Vec::with_capacity(subnets.len() * cidrs.len());
    for subnet in subnets {
        for (cidr_index, cidr) in cidrs.iter().enumerate() {
            routes.push(RouteEntry {
                id: format!("AdditionalCidrRoute-{}-{cidr_index}", subnet.subnet_id),
                route_table: subnet.route_table.clone(),
                destination: *cidr,
                target: target.clone(),
                depends_on: vec![attachment_ref.clone()],
            });
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::models::{base_config, DeploymentContext, SubnetLayers};
    use crate::processing::plan_network;

    fn ctx() -> DeploymentContext {
        DeploymentContext::new("dev", "us-east-1")
    }

    fn public_config() -> ConfigModel {
        let mut config = base_config();
        config.create_public_subnets = true;
        config.public_subnet_mask_bits = Some(24);
        config
    }

    #[test]
    fn test_no_tgw_no_plan() {
        let mut config = base_config();
        config.use_transit_gateway = false;
        let network = plan_network(&config, &ctx());
        assert!(plan_routing(&config, &network).unwrap().is_none());
    }

    #[test]
    fn test_attachment_and_default_routes() {
        let config = base_config();
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();

        assert_eq!(
            routing.attachment.subnet_ids,
            vec!["dataSubnet1", "dataSubnet2"],
            "attachment holds exactly the last layer"
        );
        assert_eq!(routing.attachment.transit_gateway_id, "tgw-0abc123");
        assert_eq!(routing.default_routes.len(), 4, "one per subnet instance");
        assert!(routing.additional_routes.is_empty());

        let att = ResourceRef::TransitGatewayAttachment(ATTACHMENT_ID.to_string());
        for route in routing.routes() {
            assert_eq!(route.destination, Ipv4Cidr::any());
            assert_eq!(route.depends_on, vec![att.clone()]);
        }
        assert_eq!(routing.default_routes[0].id, "TransitGatewayRoute0");
    }

    #[test]
    fn test_default_routes_cover_public_subnets() {
        let config = public_config();
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();
        assert_eq!(routing.default_routes.len(), 6);
        assert_eq!(routing.default_routes[0].route_table, "publicSubnet1RouteTable");
    }

    #[test]
    fn test_additional_routes_all_subnets() {
        let mut config = public_config();
        config.additional_cidrs = vec![Ipv4Cidr::new("10.1.0.0/16").unwrap()];
        config.public_subnet_with_tgw_enabled = true;
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();

        assert_eq!(routing.additional_routes.len(), 6);
        let tables: std::collections::HashSet<&str> = routing
            .additional_routes
            .iter()
            .map(|r| r.route_table.as_str())
            .collect();
        assert_eq!(tables.len(), 6, "one per distinct route table");
        assert!(routing
            .additional_routes
            .iter()
            .all(|r| r.destination.to_string() == "10.1.0.0/16"));
        assert_eq!(
            routing.additional_routes[0].id,
            "AdditionalCidrRoute-publicSubnet1-0"
        );
    }

    #[test]
    fn test_additional_routes_private_only() {
        let mut config = public_config();
        config.additional_cidrs = vec![
            Ipv4Cidr::new("10.1.0.0/16").unwrap(),
            Ipv4Cidr::new("172.16.0.0/12").unwrap(),
        ];
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();

        assert_eq!(routing.additional_routes.len(), 8, "4 private tables x 2 cidrs");
        assert!(routing
            .additional_routes
            .iter()
            .all(|r| !r.route_table.starts_with("public")));
    }

    #[test]
    fn test_shared_route_tables_deduplicated() {
        let mut config = base_config();
        config.shared_layer_route_tables = true;
        config.additional_cidrs = vec![
            Ipv4Cidr::new("10.1.0.0/16").unwrap(),
            Ipv4Cidr::new("10.1.0.0/16").unwrap(),
        ];
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();

        assert_eq!(routing.default_routes.len(), 2, "one per shared table");
        assert_eq!(routing.additional_routes.len(), 2);
    }

    #[test]
    fn test_additional_default_route_not_duplicated() {
        let mut config = base_config();
        config.additional_cidrs = vec![Ipv4Cidr::any()];
        let network = plan_network(&config, &ctx());
        let routing = plan_routing(&config, &network).unwrap().unwrap();
        assert!(routing.additional_routes.is_empty());
    }

    #[test]
    fn test_empty_layers_is_topology_error() {
        let mut config = base_config();
        config.subnet_layers = SubnetLayers::default();
        let network = plan_network(&config, &ctx());
        let result = plan_routing(&config, &network);
        assert!(matches!(
            result,
            Err(PlanError::Topology(TopologyError::NoSubnetsForLastLayer(_)))
        ));
    }

    #[test]
    fn test_missing_tgw_id() {
        let mut config = base_config();
        config.transit_gateway_id = None;
        let network = plan_network(&config, &ctx());
        assert!(matches!(
            plan_routing(&config, &network),
            Err(PlanError::Config(ConfigError::MissingTransitGatewayId))
        ));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let mut config = public_config();
        config.additional_cidrs = vec![Ipv4Cidr::new("10.9.0.0/16").unwrap()];
        let network = plan_network(&config, &ctx());
        assert_eq!(
            plan_routing(&config, &network).unwrap(),
            plan_routing(&config, &network).unwrap()
        );
    }
}
