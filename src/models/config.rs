//! Typed view over one environment block of the deployment configuration.

use super::Ipv4Cidr;
use crate::error::ConfigError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Name given to the public subnet group.
pub const PUBLIC_LAYER_NAME: &str = "public";

/// Region used when `CDK_DEFAULT_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// One AZ per letter suffix, `a` to `z`.
pub const MAX_AZ_COUNT: u32 = 26;

lazy_static! {
    static ref TGW_ID_RE: Regex = Regex::new(r"^tgw-[0-9a-f]+$").expect("Invalid Regex?");
}

/// One named tier of private subnets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetLayer {
    pub name: String,
    pub mask_bits: u8,
}

/// Ordered layer list. The last entry is the transit gateway attachment tier.
///
/// Read from a JSON object; key order in the file is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetLayers(pub Vec<SubnetLayer>);

impl SubnetLayers {
    pub fn iter(&self) -> std::slice::Iter<'_, SubnetLayer> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&SubnetLayer> {
        self.0.last()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|l| l.name.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for SubnetLayers {
    fn from_iter<I: IntoIterator<Item = (S, u8)>>(iter: I) -> Self {
        SubnetLayers(
            iter.into_iter()
                .map(|(name, mask_bits)| SubnetLayer {
                    name: name.into(),
                    mask_bits,
                })
                .collect(),
        )
    }
}

/// Mask values appear both as numbers and as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaskValue {
    Number(u64),
    Text(String),
}

impl MaskValue {
    fn into_bits<E: de::Error>(self, layer: &str) -> Result<u8, E> {
        let raw = match self {
            MaskValue::Number(n) => n,
            MaskValue::Text(s) => s.trim().parse::<u64>().map_err(|_| {
                E::custom(format!("mask for layer '{layer}' is not a number: {s:?}"))
            })?,
        };
        u8::try_from(raw).map_err(|_| E::custom(format!("mask for layer '{layer}' out of range")))
    }
}

struct SubnetLayersVisitor;

impl<'de> Visitor<'de> for SubnetLayersVisitor {
    type Value = SubnetLayers;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of layer name to CIDR mask bits")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut layers = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(name) = map.next_key::<String>()? {
            let mask_bits = map.next_value::<MaskValue>()?.into_bits(&name)?;
            layers.push(SubnetLayer { name, mask_bits });
        }
        Ok(SubnetLayers(layers))
    }
}

impl<'de> Deserialize<'de> for SubnetLayers {
    fn deserialize<D>(deserializer: D) -> Result<SubnetLayers, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SubnetLayersVisitor)
    }
}

impl Serialize for SubnetLayers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for layer in &self.0 {
            map.serialize_entry(&layer.name, &layer.mask_bits)?;
        }
        map.end()
    }
}

/// VPC endpoint switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointToggles {
    #[serde(rename = "s3_vpc_endpoint_enabled")]
    pub s3: bool,
    #[serde(rename = "dynamodb_vpc_endpoint_enabled")]
    pub dynamodb: bool,
    #[serde(rename = "session_manager_vpc_endpoints_enabled")]
    pub session_manager: bool,
}

impl EndpointToggles {
    pub fn any(&self) -> bool {
        self.s3 || self.dynamodb || self.session_manager
    }
}

/// Configuration for a single environment (dev/stage/prod ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConfig")]
pub struct ConfigModel {
    #[serde(rename = "vpc_cidr_block")]
    pub vpc_cidr: Ipv4Cidr,
    pub az_count: u32,
    pub nat_gateway_count: u32,
    pub create_public_subnets: bool,
    pub public_subnet_mask_bits: Option<u8>,
    pub subnet_layers: SubnetLayers,
    pub use_transit_gateway: bool,
    pub transit_gateway_id: Option<String>,
    pub additional_cidrs: Vec<Ipv4Cidr>,
    pub public_subnet_with_tgw_enabled: bool,
    #[serde(flatten)]
    pub endpoints: EndpointToggles,
    /// ARN of an existing KMS key for flow-log encryption.
    #[serde(rename = "encryption_key")]
    pub encryption_key_arn: Option<String>,
    pub project_name: String,
    pub tags: BTreeMap<String, String>,
    /// All AZ instances of a layer share one route table.
    pub shared_layer_route_tables: bool,
}

/// File shape of an environment block. Flat, so field paths survive in errors.
#[derive(Deserialize)]
struct RawConfig {
    vpc_cidr_block: Ipv4Cidr,
    az_count: u32,
    /// Absent means one per AZ when public subnets exist.
    #[serde(default)]
    nat_gateway_count: Option<u32>,
    #[serde(default)]
    create_public_subnets: bool,
    #[serde(default)]
    public_subnet_mask_bits: Option<u8>,
    subnet_layers: SubnetLayers,
    #[serde(default)]
    use_transit_gateway: bool,
    #[serde(default)]
    transit_gateway_id: Option<String>,
    #[serde(default)]
    additional_cidrs: Vec<Ipv4Cidr>,
    #[serde(default)]
    public_subnet_with_tgw_enabled: bool,
    #[serde(default)]
    s3_vpc_endpoint_enabled: bool,
    #[serde(default)]
    dynamodb_vpc_endpoint_enabled: bool,
    #[serde(default)]
    session_manager_vpc_endpoints_enabled: bool,
    #[serde(default)]
    encryption_key: Option<String>,
    project_name: String,
    tags: BTreeMap<String, String>,
    #[serde(default)]
    shared_layer_route_tables: bool,
}

impl From<RawConfig> for ConfigModel {
    fn from(raw: RawConfig) -> Self {
        let nat_default = if raw.create_public_subnets {
            raw.az_count
        } else {
            0
        };
        ConfigModel {
            vpc_cidr: raw.vpc_cidr_block,
            az_count: raw.az_count,
            nat_gateway_count: raw.nat_gateway_count.unwrap_or(nat_default),
            create_public_subnets: raw.create_public_subnets,
            public_subnet_mask_bits: raw.public_subnet_mask_bits,
            subnet_layers: raw.subnet_layers,
            use_transit_gateway: raw.use_transit_gateway,
            transit_gateway_id: raw.transit_gateway_id,
            additional_cidrs: raw.additional_cidrs,
            public_subnet_with_tgw_enabled: raw.public_subnet_with_tgw_enabled,
            endpoints: EndpointToggles {
                s3: raw.s3_vpc_endpoint_enabled,
                dynamodb: raw.dynamodb_vpc_endpoint_enabled,
                session_manager: raw.session_manager_vpc_endpoints_enabled,
            },
            encryption_key_arn: raw.encryption_key,
            project_name: raw.project_name,
            tags: raw.tags,
            shared_layer_route_tables: raw.shared_layer_route_tables,
        }
    }
}

impl ConfigModel {
    /// Check required fields and value ranges. Does no other computation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.az_count == 0 || self.az_count > MAX_AZ_COUNT {
            return Err(invalid(
                "az_count",
                &format!("must be 1..={MAX_AZ_COUNT}, got {}", self.az_count),
            ));
        }
        if self.project_name.trim().is_empty() {
            return Err(invalid("project_name", "must not be empty"));
        }

        if self.create_public_subnets {
            match self.public_subnet_mask_bits {
                None => {
                    return Err(invalid(
                        "public_subnet_mask_bits",
                        "required when create_public_subnets is true",
                    ))
                }
                Some(bits) if bits > super::MAX_LENGTH => {
                    return Err(invalid("public_subnet_mask_bits", "must be 0..=32"))
                }
                Some(_) => {}
            }
        }

        let mut seen = HashSet::new();
        for layer in self.subnet_layers.iter() {
            let field = format!("subnet_layers.{}", layer.name);
            if layer.name.trim().is_empty() {
                return Err(invalid("subnet_layers", "layer name must not be empty"));
            }
            if layer.mask_bits > super::MAX_LENGTH {
                return Err(invalid(&field, "must be 0..=32"));
            }
            if !seen.insert(layer.name.as_str()) {
                return Err(invalid(&field, "duplicate layer name"));
            }
            if self.create_public_subnets && layer.name == PUBLIC_LAYER_NAME {
                return Err(invalid(&field, "name is reserved for public subnets"));
            }
        }

        if self.use_transit_gateway {
            let tgw_id = self
                .transit_gateway_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or(ConfigError::MissingTransitGatewayId)?;
            if self.subnet_layers.is_empty() {
                return Err(ConfigError::EmptySubnetLayers);
            }
            if !TGW_ID_RE.is_match(tgw_id) {
                log::warn!("transit_gateway_id '{tgw_id}' does not look like a tgw-xxxx id");
            }
        } else if !self.additional_cidrs.is_empty() {
            log::warn!(
                "additional_cidrs ({}) ignored because use_transit_gateway is false",
                self.additional_cidrs.len()
            );
        }

        if self.nat_gateway_count > 0 && !self.create_public_subnets {
            log::warn!(
                "nat_gateway_count={} ignored: NAT gateways need public subnets",
                self.nat_gateway_count
            );
        }

        log::debug!(
            "config ok: vpc={} azs={} layers={}",
            self.vpc_cidr,
            self.az_count,
            self.subnet_layers.len()
        );
        Ok(())
    }

    /// Public subnet mask, only when public subnets are requested.
    pub fn public_mask(&self) -> Option<u8> {
        if self.create_public_subnets {
            self.public_subnet_mask_bits
        } else {
            None
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Where and under which name a plan is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub env_name: String,
    pub stack_name: String,
    pub region: String,
    pub account: Option<String>,
}

impl DeploymentContext {
    pub fn new(env_name: &str, region: &str) -> DeploymentContext {
        DeploymentContext {
            env_name: env_name.to_string(),
            stack_name: format!("vpc-stack-{env_name}"),
            region: region.to_string(),
            account: None,
        }
    }

    /// Read region and account from `CDK_DEFAULT_REGION` / `CDK_DEFAULT_ACCOUNT`.
    pub fn from_env(env_name: &str) -> DeploymentContext {
        let region =
            std::env::var("CDK_DEFAULT_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let mut ctx = DeploymentContext::new(env_name, &region);
        ctx.account = std::env::var("CDK_DEFAULT_ACCOUNT").ok();
        ctx
    }

    /// AZ names for the first `count` zones, e.g. `us-east-1a`, `us-east-1b`.
    ///
    /// Regions with fewer zones are the provisioning layer's problem.
    pub fn availability_zones(&self, count: u32) -> Vec<String> {
        (0..count).map(|i| format!("{}{}", self.region, az_letter(i))).collect()
    }
}

fn az_letter(index: u32) -> String {
    let mut n = index;
    let mut s = String::new();
    loop {
        s.insert(0, (b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn base_config() -> ConfigModel {
        ConfigModel {
            vpc_cidr: Ipv4Cidr::new("10.0.0.0/16").unwrap(),
            az_count: 2,
            nat_gateway_count: 0,
            create_public_subnets: false,
            public_subnet_mask_bits: None,
            subnet_layers: [("app", 24), ("data", 26)].into_iter().collect(),
            use_transit_gateway: true,
            transit_gateway_id: Some("tgw-0abc123".to_string()),
            additional_cidrs: vec![],
            public_subnet_with_tgw_enabled: false,
            endpoints: EndpointToggles::default(),
            encryption_key_arn: None,
            project_name: "acme".to_string(),
            tags: BTreeMap::new(),
            shared_layer_route_tables: false,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_tgw_id() {
        let mut config = base_config();
        config.transit_gateway_id = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTransitGatewayId)
        ));
        config.transit_gateway_id = Some("  ".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTransitGatewayId)
        ));
    }

    #[test]
    fn test_validate_empty_layers_with_tgw() {
        let mut config = base_config();
        config.subnet_layers = SubnetLayers::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySubnetLayers)
        ));

        config.use_transit_gateway = false;
        assert!(config.validate().is_ok(), "empty layers are fine without tgw");
    }

    #[test]
    fn test_validate_public_mask_required() {
        let mut config = base_config();
        config.create_public_subnets = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "public_subnet_mask_bits"
        ));
        config.public_subnet_mask_bits = Some(24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_public_layer_name_clash() {
        let mut config = base_config();
        config.create_public_subnets = true;
        config.public_subnet_mask_bits = Some(24);
        config.subnet_layers = [("public", 24), ("data", 26)].into_iter().collect();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_az_count_bounds() {
        let mut config = base_config();
        config.az_count = 0;
        assert!(config.validate().is_err());

        config.az_count = MAX_AZ_COUNT;
        assert!(config.validate().is_ok());

        for az_count in [MAX_AZ_COUNT + 1, u32::MAX] {
            config.az_count = az_count;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidField { ref field, .. }) if field == "az_count"
            ));
        }
    }

    fn parse(json: &str) -> Result<ConfigModel, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_nat_gateway_count_defaults_per_az() {
        let with_public = parse(
            r#"{"vpc_cidr_block": "10.0.0.0/16", "az_count": 3, "create_public_subnets": true,
                "public_subnet_mask_bits": 24, "subnet_layers": {"app": 24},
                "project_name": "p", "tags": {}}"#,
        )
        .unwrap();
        assert_eq!(with_public.nat_gateway_count, 3);

        let private_only = parse(
            r#"{"vpc_cidr_block": "10.0.0.0/16", "az_count": 3,
                "subnet_layers": {"app": 24}, "project_name": "p", "tags": {}}"#,
        )
        .unwrap();
        assert_eq!(private_only.nat_gateway_count, 0);
    }

    #[test]
    fn test_tags_required() {
        let err = parse(
            r#"{"vpc_cidr_block": "10.0.0.0/16", "az_count": 1,
                "subnet_layers": {"app": 24}, "project_name": "p"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tags"), "got {err}");
    }

    #[test]
    fn test_subnet_layers_keep_file_order() {
        let layers: SubnetLayers =
            serde_json::from_str(r#"{"web": 24, "app": "25", "data": 26}"#).unwrap();
        let names: Vec<&str> = layers.names().collect();
        assert_eq!(names, vec!["web", "app", "data"]);
        assert_eq!(layers.0[1].mask_bits, 25);
        assert_eq!(layers.last().unwrap().name, "data");
    }

    #[test]
    fn test_subnet_layers_bad_mask() {
        assert!(serde_json::from_str::<SubnetLayers>(r#"{"app": "abc"}"#).is_err());
        assert!(serde_json::from_str::<SubnetLayers>(r#"{"app": 300}"#).is_err());
    }

    #[test]
    fn test_availability_zones() {
        let ctx = DeploymentContext::new("dev", "eu-west-1");
        assert_eq!(ctx.stack_name, "vpc-stack-dev");
        assert_eq!(
            ctx.availability_zones(3),
            vec!["eu-west-1a", "eu-west-1b", "eu-west-1c"]
        );
        assert_eq!(az_letter(26), "aa");
    }
}
