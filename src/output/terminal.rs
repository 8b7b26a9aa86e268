//! Terminal output for a deployment plan.

use crate::models::{DeploymentPlan, KeySource, ResourceRef, SubnetKind};
use colored::Colorize;
use std::io::{self, Write};

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Human readable summary of the plan.
pub fn render_table<W: Write>(plan: &DeploymentPlan, w: &mut W) -> io::Result<()> {
    let vpc_name = name_tag(plan, &ResourceRef::Vpc).unwrap_or("-");
    writeln!(
        w,
        "# {} env={} vpc={} ({})",
        plan.stack_name.bold(),
        plan.env_name,
        plan.network.vpc_cidr.to_string().cyan(),
        vpc_name
    )?;

    writeln!(
        w,
        "{:<20} {:<15} {:<12} {:<18} {:<26} NAME",
        "SUBNET", "KIND", "AZ", "CIDR", "ROUTE TABLE"
    )?;
    for subnet in &plan.network.subnets {
        let cidr = plan
            .allocations
            .iter()
            .find(|a| a.subnet_id == subnet.subnet_id)
            .map(|a| a.cidr.to_string())
            .unwrap_or_else(|| format!("/{}", subnet.mask_bits));
        let kind = match subnet.kind {
            SubnetKind::Public => subnet.kind.to_string().green(),
            SubnetKind::PrivateEgress => subnet.kind.to_string().normal(),
        };
        writeln!(
            w,
            "{:<20} {:<15} {:<12} {:<18} {:<26} {}",
            subnet.subnet_id,
            kind,
            subnet.az_name,
            cidr,
            subnet.route_table,
            name_tag(plan, &subnet.resource_ref()).unwrap_or("<untagged>")
        )?;
    }
    for nat in &plan.network.nat_gateways {
        writeln!(w, "nat-gateway {} in {}", nat.id, nat.subnet_id)?;
    }

    match &plan.routing {
        Some(routing) => {
            writeln!(
                w,
                "transit gateway {} attached to [{}]",
                routing.attachment.transit_gateway_id.cyan(),
                routing.attachment.subnet_ids.join(", ")
            )?;
            for route in routing.routes() {
                writeln!(
                    w,
                    "  route {:<40} {:<26} {}",
                    route.id, route.route_table, route.destination
                )?;
            }
        }
        None => writeln!(w, "transit gateway: none")?,
    }

    if let Some(endpoints) = &plan.endpoints {
        for ep in &endpoints.gateway_endpoints {
            writeln!(
                w,
                "endpoint {} (gateway, {}) on {} route table(s)",
                ep.id,
                ep.service.service_name(),
                ep.route_tables.len()
            )?;
        }
        for ep in &endpoints.interface_endpoints {
            writeln!(w, "endpoint {} (interface, {})", ep.id, ep.service)?;
        }
    }

    let key = match &plan.flow_logs.key {
        KeySource::Existing(arn) => arn.clone(),
        KeySource::Create(spec) => format!("new key alias/{}", spec.alias),
    };
    writeln!(
        w,
        "flow logs -> {} ({} days, {})",
        plan.flow_logs.log_group_name, plan.flow_logs.retention_days, key
    )?;

    for output in &plan.outputs {
        writeln!(w, "output {} export={}", output.logical_id, output.export_name)?;
    }
    for warning in &plan.warnings {
        writeln!(w, "{} {}", "WARN".on_yellow(), warning.message)?;
    }
    Ok(())
}

fn name_tag<'a>(plan: &'a DeploymentPlan, resource: &ResourceRef) -> Option<&'a str> {
    plan.tags
        .get(resource)
        .and_then(|tags| tags.get("Name"))
        .map(String::as_str)
}
