//! Layer resolution and `Name` tags.
//!
//! Tags are computed per resource from the plan and config; nothing is
//! accumulated across resources.

use crate::models::{
    ConfigModel, DeploymentContext, NetworkPlan, ResourceRef, SubnetKind, SubnetLayers,
    SubnetSpec, TagSet,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of mapping a subnet instance back to its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMatch<'a> {
    Found(&'a str),
    NotFound,
}

/// A subnet that could not be mapped to a layer. The run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamingWarning {
    pub subnet_id: String,
    pub message: String,
}

/// Find the layer whose name is contained in the subnet's declared id.
///
/// Containment tolerates provider suffixes (`appSubnet1`). When several layer
/// names match, the first declared wins. Never fails.
pub fn resolve_layer<'a>(subnet: &SubnetSpec, layers: &'a SubnetLayers) -> LayerMatch<'a> {
    layers
        .names()
        .find(|layer| subnet.subnet_id.contains(layer))
        .map_or(LayerMatch::NotFound, LayerMatch::Found)
}

/// AZ suffix used in names: `us-east-1a` -> `1a`.
pub fn az_identifier(az_name: &str) -> &str {
    az_name.rsplit('-').next().unwrap_or(az_name)
}

pub fn vpc_name(config: &ConfigModel, ctx: &DeploymentContext) -> String {
    format!("vpc-{}-{}", config.project_name, ctx.env_name)
}

/// `Name` tag for a subnet instance, or a warning when its layer is unknown.
pub fn subnet_name(
    subnet: &SubnetSpec,
    config: &ConfigModel,
    ctx: &DeploymentContext,
) -> Result<String, NamingWarning> {
    let az = az_identifier(&subnet.az_name);
    match subnet.kind {
        SubnetKind::Public => Ok(format!(
            "public-{}-{}-{az}",
            config.project_name, ctx.env_name
        )),
        SubnetKind::PrivateEgress => match resolve_layer(subnet, &config.subnet_layers) {
            LayerMatch::Found(layer) => Ok(format!(
                "private-{}-{}-{layer}-{az}",
                config.project_name, ctx.env_name
            )),
            LayerMatch::NotFound => Err(NamingWarning {
                subnet_id: subnet.subnet_id.clone(),
                message: format!(
                    "Unable to determine layer name for private subnet with ID: {}",
                    subnet.subnet_id
                ),
            }),
        },
    }
}

/// Tag sets for every taggable resource in `resources`.
///
/// Global tags go on everything; a derived `Name` is never overridden by them.
pub fn resolve_tags<'a, I>(
    resources: I,
    network: &NetworkPlan,
    config: &ConfigModel,
    ctx: &DeploymentContext,
) -> (BTreeMap<ResourceRef, TagSet>, Vec<NamingWarning>)
where
    I: IntoIterator<Item = &'a ResourceRef>,
{
    let mut names: BTreeMap<ResourceRef, String> = BTreeMap::new();
    let mut warnings = Vec::new();

    names.insert(ResourceRef::Vpc, vpc_name(config, ctx));
    for subnet in &network.subnets {
        match subnet_name(subnet, config, ctx) {
            Ok(name) => {
                names.insert(subnet.resource_ref(), name);
            }
            Err(warning) => {
                log::warn!("{}", warning.message);
                warnings.push(warning);
            }
        }
    }

    let tags = resources
        .into_iter()
        .filter(|r| r.is_taggable())
        .map(|r| {
            let mut set: TagSet = config.tags.clone();
            if let Some(name) = names.get(r) {
                set.insert("Name".to_string(), name.clone());
            }
            (r.clone(), set)
        })
        .filter(|(_, set)| !set.is_empty())
        .collect();

    (tags, warnings)
}
