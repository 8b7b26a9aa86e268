//! VPC endpoint planning.

use crate::models::{
    ConfigModel, DeploymentContext, Direction, EndpointPlan, GatewayEndpoint, GatewayService,
    InterfaceEndpoint, NetworkPlan, ResourceRef, SecurityGroupRule, SecurityGroupSpec, SubnetKind,
};

pub const ENDPOINT_SECURITY_GROUP_ID: &str = "VpcEndpointSecurityGroup";

/// Interface endpoints needed for Session Manager: (logical id, service).
const SESSION_MANAGER_SERVICES: [(&str, &str); 3] = [
    ("SsmEndpoint", "ssm"),
    ("SsmMessagesEndpoint", "ssmmessages"),
    ("Ec2Endpoint", "ec2"),
];

const HTTPS_PORT: u16 = 443;

/// Plan the endpoints switched on in `config`; `None` when all are off.
///
/// Gateway endpoints are routable from every subnet, so they touch every route
/// table in `network`.
pub fn plan_endpoints(
    config: &ConfigModel,
    network: &NetworkPlan,
    ctx: &DeploymentContext,
) -> Option<EndpointPlan> {
    let toggles = &config.endpoints;
    if !toggles.any() {
        return None;
    }

    let route_tables = network.route_tables();
    let mut plan = EndpointPlan::default();
    if toggles.s3 {
        plan.gateway_endpoints.push(gateway_endpoint(
            "S3VpcEndpoint",
            GatewayService::S3,
            &route_tables,
        ));
    }
    if toggles.dynamodb {
        plan.gateway_endpoints.push(gateway_endpoint(
            "DynamoDbVpcEndpoint",
            GatewayService::DynamoDb,
            &route_tables,
        ));
    }

    if toggles.session_manager {
        if config.subnet_layers.is_empty() {
            log::warn!("session manager endpoints requested but there are no private subnets");
        }
        plan.security_group = Some(endpoint_security_group(config, ctx));
        let sg_ref = ResourceRef::SecurityGroup(ENDPOINT_SECURITY_GROUP_ID.to_string());
        plan.interface_endpoints = SESSION_MANAGER_SERVICES
            .iter()
            .map(|(id, service)| InterfaceEndpoint {
                id: id.to_string(),
                service: service.to_string(),
                private_dns_enabled: true,
                subnet_kind: SubnetKind::PrivateEgress,
                security_group: ENDPOINT_SECURITY_GROUP_ID.to_string(),
                depends_on: vec![ResourceRef::Vpc, sg_ref.clone()],
            })
            .collect();
    }

    log::info!(
        "endpoint plan: {} gateway, {} interface",
        plan.gateway_endpoints.len(),
        plan.interface_endpoints.len()
    );
    Some(plan)
}

fn gateway_endpoint(id: &str, service: GatewayService, route_tables: &[&str]) -> GatewayEndpoint {
    let mut depends_on = vec![ResourceRef::Vpc];
    depends_on.extend(
        route_tables
            .iter()
            .map(|rt| ResourceRef::RouteTable(rt.to_string())),
    );
    GatewayEndpoint {
        id: id.to_string(),
        service,
        route_tables: route_tables.iter().map(|rt| rt.to_string()).collect(),
        depends_on,
    }
}

/// HTTPS in and out, limited to the VPC block.
fn endpoint_security_group(config: &ConfigModel, ctx: &DeploymentContext) -> SecurityGroupSpec {
    SecurityGroupSpec {
        id: ENDPOINT_SECURITY_GROUP_ID.to_string(),
        group_name: format!("vpc-endpoints-{}-{}-sg", config.project_name, ctx.env_name),
        description: "Security group for VPC endpoints".to_string(),
        allow_all_outbound: false,
        rules: vec![
            SecurityGroupRule {
                direction: Direction::Ingress,
                peer: config.vpc_cidr,
                protocol: "tcp".to_string(),
                port: HTTPS_PORT,
                description: "Allow inbound HTTPS from VPC".to_string(),
            },
            SecurityGroupRule {
                direction: Direction::Egress,
                peer: config.vpc_cidr,
                protocol: "tcp".to_string(),
                port: HTTPS_PORT,
                description: "Allow outbound HTTPS to VPC".to_string(),
            },
        ],
    }
}
