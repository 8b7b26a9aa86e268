//! Plan value objects handed to a provisioning adapter.
//!
//! Plans are built once per run and never mutated afterwards. Ordering between
//! resources is carried as explicit `depends_on` edges.

use super::resources::{EndpointPlan, FlowLogPlan};
use super::Ipv4Cidr;
use crate::error::TopologyError;
use crate::processing::NamingWarning;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Tag key/value pairs for one resource.
pub type TagSet = BTreeMap<String, String>;

/// Reference to a planned resource by logical id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceRef {
    Vpc,
    Subnet(String),
    RouteTable(String),
    NatGateway(String),
    TransitGatewayAttachment(String),
    Route(String),
    Endpoint(String),
    SecurityGroup(String),
    FlowLogRole,
    EncryptionKey,
    LogGroup,
    FlowLog,
}

impl ResourceRef {
    /// Routes carry no tags on the provider side.
    pub fn is_taggable(&self) -> bool {
        !matches!(self, ResourceRef::Route(_))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Vpc => write!(f, "vpc:Vpc"),
            ResourceRef::Subnet(id) => write!(f, "subnet:{id}"),
            ResourceRef::RouteTable(id) => write!(f, "route-table:{id}"),
            ResourceRef::NatGateway(id) => write!(f, "nat-gateway:{id}"),
            ResourceRef::TransitGatewayAttachment(id) => write!(f, "tgw-attachment:{id}"),
            ResourceRef::Route(id) => write!(f, "route:{id}"),
            ResourceRef::Endpoint(id) => write!(f, "endpoint:{id}"),
            ResourceRef::SecurityGroup(id) => write!(f, "security-group:{id}"),
            ResourceRef::FlowLogRole => write!(f, "iam-role:FlowLogsRole"),
            ResourceRef::EncryptionKey => write!(f, "kms-key:FlowLogsEncryptionKey"),
            ResourceRef::LogGroup => write!(f, "log-group:FlowLogsLogGroup"),
            ResourceRef::FlowLog => write!(f, "flow-log:FlowLogs"),
        }
    }
}

// String form so the ref can be a JSON map key.
impl Serialize for ResourceRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubnetKind {
    Public,
    PrivateEgress,
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetKind::Public => write!(f, "public"),
            SubnetKind::PrivateEgress => write!(f, "private-egress"),
        }
    }
}

/// One subnet instance: a (layer, AZ) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetSpec {
    /// Layer the instance was expanded from (`public` for public subnets).
    pub logical_name: String,
    pub mask_bits: u8,
    pub kind: SubnetKind,
    /// Zero based AZ index.
    pub az_index: usize,
    pub az_name: String,
    /// Provider logical id, e.g. `appSubnet1`.
    pub subnet_id: String,
    pub route_table: String,
}

impl SubnetSpec {
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Subnet(self.subnet_id.clone())
    }

    pub fn route_table_ref(&self) -> ResourceRef {
        ResourceRef::RouteTable(self.route_table.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NatGatewaySpec {
    pub id: String,
    pub subnet_id: String,
    pub depends_on: Vec<ResourceRef>,
}

/// Subnet layout of the VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPlan {
    pub vpc_cidr: Ipv4Cidr,
    /// Layer order first, then AZ order.
    pub subnets: Vec<SubnetSpec>,
    pub nat_gateways: Vec<NatGatewaySpec>,
}

impl NetworkPlan {
    pub fn public_subnets(&self) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets.iter().filter(|s| s.kind == SubnetKind::Public)
    }

    pub fn private_subnets(&self) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets
            .iter()
            .filter(|s| s.kind == SubnetKind::PrivateEgress)
    }

    /// Private instances expanded from `layer`.
    pub fn layer_instances<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a SubnetSpec> {
        self.private_subnets().filter(move |s| s.logical_name == layer)
    }

    /// Distinct route tables in first-seen order.
    pub fn route_tables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.subnets
            .iter()
            .map(|s| s.route_table.as_str())
            .filter(|rt| seen.insert(*rt))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RouteTarget {
    TransitGateway(String),
}

/// A single route on a route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub id: String,
    pub route_table: String,
    pub destination: Ipv4Cidr,
    pub target: RouteTarget,
    pub depends_on: Vec<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitGatewayAttachment {
    pub id: String,
    pub transit_gateway_id: String,
    /// Exactly the instances of the last layer.
    pub subnet_ids: Vec<String>,
    pub depends_on: Vec<ResourceRef>,
}

impl TransitGatewayAttachment {
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::TransitGatewayAttachment(self.id.clone())
    }
}

/// Route wiring toward a transit gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPlan {
    pub attachment: TransitGatewayAttachment,
    pub default_routes: Vec<RouteEntry>,
    pub additional_routes: Vec<RouteEntry>,
}

impl RoutingPlan {
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.default_routes.iter().chain(self.additional_routes.iter())
    }
}

/// Concrete CIDR for one subnet instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetAllocation {
    pub subnet_id: String,
    pub cidr: Ipv4Cidr,
}

/// Named stack output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackOutput {
    pub logical_id: String,
    pub description: String,
    pub export_name: String,
    pub source: ResourceRef,
    pub attribute: String,
}

/// Everything a provisioning adapter needs for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPlan {
    pub env_name: String,
    pub stack_name: String,
    pub network: NetworkPlan,
    pub allocations: Vec<SubnetAllocation>,
    pub routing: Option<RoutingPlan>,
    pub endpoints: Option<EndpointPlan>,
    pub flow_logs: FlowLogPlan,
    pub tags: BTreeMap<ResourceRef, TagSet>,
    pub warnings: Vec<NamingWarning>,
    pub outputs: Vec<StackOutput>,
}

impl DeploymentPlan {
    /// Every planned resource with the resources it depends on, in plan order.
    pub fn dependency_graph(&self) -> Vec<(ResourceRef, Vec<ResourceRef>)> {
        resource_graph(
            &self.network,
            self.routing.as_ref(),
            self.endpoints.as_ref(),
            &self.flow_logs,
        )
    }

    /// Resources ordered so that each appears after everything it depends on.
    pub fn creation_order(&self) -> Result<Vec<ResourceRef>, TopologyError> {
        topological_order(self.dependency_graph())
    }
}

/// Build the resource graph from the individual plans.
pub fn resource_graph(
    network: &NetworkPlan,
    routing: Option<&RoutingPlan>,
    endpoints: Option<&EndpointPlan>,
    flow_logs: &FlowLogPlan,
) -> Vec<(ResourceRef, Vec<ResourceRef>)> {
    let mut graph = vec![(ResourceRef::Vpc, vec![])];

    for subnet in &network.subnets {
        graph.push((subnet.resource_ref(), vec![ResourceRef::Vpc]));
    }
    let mut seen_tables = HashSet::new();
    for subnet in &network.subnets {
        if seen_tables.insert(subnet.route_table.as_str()) {
            graph.push((subnet.route_table_ref(), vec![ResourceRef::Vpc]));
        }
    }
    for nat in &network.nat_gateways {
        graph.push((ResourceRef::NatGateway(nat.id.clone()), nat.depends_on.clone()));
    }

    if let Some(routing) = routing {
        graph.push((
            routing.attachment.resource_ref(),
            routing.attachment.depends_on.clone(),
        ));
        for route in routing.routes() {
            let mut deps = vec![ResourceRef::RouteTable(route.route_table.clone())];
            deps.extend(route.depends_on.iter().cloned());
            graph.push((ResourceRef::Route(route.id.clone()), deps));
        }
    }

    if let Some(endpoints) = endpoints {
        for (resource, deps) in endpoints.resources() {
            graph.push((resource, deps));
        }
    }

    graph.extend(flow_logs.resources());
    graph
}

/// Stable topological sort: among ready nodes the earliest declared goes first.
pub fn topological_order(
    graph: Vec<(ResourceRef, Vec<ResourceRef>)>,
) -> Result<Vec<ResourceRef>, TopologyError> {
    let known: HashSet<ResourceRef> = graph.iter().map(|(r, _)| r.clone()).collect();
    let mut placed: HashSet<ResourceRef> = HashSet::new();
    let mut order = Vec::with_capacity(graph.len());
    let mut pending = graph;

    while !pending.is_empty() {
        let ready = pending.iter().position(|(_, deps)| {
            deps.iter()
                .all(|d| placed.contains(d) || !known.contains(d))
        });
        match ready {
            Some(i) => {
                let (resource, _) = pending.remove(i);
                placed.insert(resource.clone());
                order.push(resource);
            }
            None => {
                return Err(TopologyError::DependencyCycle(pending[0].0.to_string()));
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_ref_display() {
        assert_eq!(ResourceRef::Vpc.to_string(), "vpc:Vpc");
        assert_eq!(
            ResourceRef::Subnet("appSubnet1".to_string()).to_string(),
            "subnet:appSubnet1"
        );
        assert!(!ResourceRef::Route("r".to_string()).is_taggable());
        assert!(ResourceRef::Vpc.is_taggable());
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let att = ResourceRef::TransitGatewayAttachment("TgwAttachment".to_string());
        let route = ResourceRef::Route("TransitGatewayRoute0".to_string());
        let graph = vec![
            (route.clone(), vec![att.clone()]),
            (att.clone(), vec![ResourceRef::Vpc]),
            (ResourceRef::Vpc, vec![]),
        ];
        let order = topological_order(graph).unwrap();
        assert_eq!(order, vec![ResourceRef::Vpc, att, route]);
    }

    #[test]
    fn test_topological_order_cycle() {
        let a = ResourceRef::Endpoint("a".to_string());
        let b = ResourceRef::Endpoint("b".to_string());
        let graph = vec![(a.clone(), vec![b.clone()]), (b, vec![a])];
        assert!(matches!(
            topological_order(graph),
            Err(TopologyError::DependencyCycle(_))
        ));
    }
}
