//! Endpoint and flow-log resources planned alongside the network.

use super::{Ipv4Cidr, ResourceRef, SubnetKind};
use serde::Serialize;

/// Gateway endpoint services (route-table based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GatewayService {
    S3,
    DynamoDb,
}

impl GatewayService {
    pub fn service_name(&self) -> &'static str {
        match self {
            GatewayService::S3 => "s3",
            GatewayService::DynamoDb => "dynamodb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayEndpoint {
    pub id: String,
    pub service: GatewayService,
    /// Route tables that get the service prefix-list route.
    pub route_tables: Vec<String>,
    pub depends_on: Vec<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupRule {
    pub direction: Direction,
    pub peer: Ipv4Cidr,
    pub protocol: String,
    pub port: u16,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupSpec {
    pub id: String,
    pub group_name: String,
    pub description: String,
    pub allow_all_outbound: bool,
    pub rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceEndpoint {
    pub id: String,
    /// Short service name, e.g. `ssm`.
    pub service: String,
    pub private_dns_enabled: bool,
    pub subnet_kind: SubnetKind,
    pub security_group: String,
    pub depends_on: Vec<ResourceRef>,
}

/// VPC endpoints. `None` at the deployment level means no endpoint at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointPlan {
    pub gateway_endpoints: Vec<GatewayEndpoint>,
    pub security_group: Option<SecurityGroupSpec>,
    pub interface_endpoints: Vec<InterfaceEndpoint>,
}

impl EndpointPlan {
    pub fn resources(&self) -> Vec<(ResourceRef, Vec<ResourceRef>)> {
        let mut out = Vec::new();
        for ep in &self.gateway_endpoints {
            out.push((ResourceRef::Endpoint(ep.id.clone()), ep.depends_on.clone()));
        }
        if let Some(sg) = &self.security_group {
            out.push((ResourceRef::SecurityGroup(sg.id.clone()), vec![ResourceRef::Vpc]));
        }
        for ep in &self.interface_endpoints {
            out.push((ResourceRef::Endpoint(ep.id.clone()), ep.depends_on.clone()));
        }
        out
    }
}

/// Where the flow-log encryption key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KeySource {
    /// Reuse a key by ARN, passed through unchanged.
    Existing(String),
    Create(NewKeySpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPolicyStatement {
    pub principal: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewKeySpec {
    pub alias: String,
    pub description: String,
    pub enable_key_rotation: bool,
    pub policy: Vec<KeyPolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLogPlan {
    pub role_principal: String,
    pub key: KeySource,
    pub log_group_name: String,
    pub retention_days: u32,
    pub traffic_type: String,
}

impl FlowLogPlan {
    pub fn resources(&self) -> Vec<(ResourceRef, Vec<ResourceRef>)> {
        let mut out = vec![(ResourceRef::FlowLogRole, vec![])];
        let mut group_deps = vec![];
        if let KeySource::Create(_) = self.key {
            out.push((ResourceRef::EncryptionKey, vec![]));
            group_deps.push(ResourceRef::EncryptionKey);
        }
        out.push((ResourceRef::LogGroup, group_deps));
        out.push((
            ResourceRef::FlowLog,
            vec![
                ResourceRef::Vpc,
                ResourceRef::LogGroup,
                ResourceRef::FlowLogRole,
            ],
        ));
        out
    }
}
