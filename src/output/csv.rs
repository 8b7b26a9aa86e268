//! CSV output of the subnet layout.

use super::terminal::format_field;
use crate::models::DeploymentPlan;
use std::io::{self, Write};

/// One CSV row per subnet instance.
#[derive(Debug)]
pub struct SubnetCsvRow {
    pub index: usize,
    pub subnet_id: String,
    pub kind: String,
    pub layer: String,
    pub az_name: String,
    pub cidr: String,
    pub route_table: String,
    pub name: String,
    pub tgw_attached: bool,
    pub route_count: usize,
}

/// Build the rows for `plan` in plan order.
pub fn subnet_rows(plan: &DeploymentPlan) -> Vec<SubnetCsvRow> {
    plan.network
        .subnets
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let cidr = plan
                .allocations
                .iter()
                .find(|a| a.subnet_id == s.subnet_id)
                .map(|a| a.cidr.to_string())
                .unwrap_or_else(|| format!("/{}", s.mask_bits));
            let name = plan
                .tags
                .get(&s.resource_ref())
                .and_then(|t| t.get("Name"))
                .cloned()
                .unwrap_or_default();
            let (tgw_attached, route_count) = match &plan.routing {
                Some(r) => (
                    r.attachment.subnet_ids.contains(&s.subnet_id),
                    r.routes().filter(|e| e.route_table == s.route_table).count(),
                ),
                None => (false, 0),
            };
            SubnetCsvRow {
                index,
                subnet_id: s.subnet_id.clone(),
                kind: s.kind.to_string(),
                layer: s.logical_name.clone(),
                az_name: s.az_name.clone(),
                cidr,
                route_table: s.route_table.clone(),
                name,
                tgw_attached,
                route_count,
            }
        })
        .collect()
}

/// Write the subnet layout as CSV.
pub fn subnet_print<W: Write>(plan: &DeploymentPlan, w: &mut W) -> io::Result<()> {
    log::info!(
        "#Start subnet_print() {} subnets for {}",
        plan.network.subnets.len(),
        plan.stack_name
    );
    writeln!(
        w,
        r#""cnt","subnet_id","kind","layer","az","cidr","route_table","name","tgw","routes""#
    )?;
    for row in subnet_rows(plan) {
        print_csv_row(&row, w)?;
    }
    Ok(())
}

fn print_csv_row<W: Write>(row: &SubnetCsvRow, w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "{index},{subnet_id},{kind},{layer},{az},{cidr},{route_table},{name},{tgw},{routes}",
        index = format_field(row.index, 4),
        subnet_id = format_field(escape_csv_field(&row.subnet_id), 16),
        kind = format_field(&row.kind, 16),
        layer = format_field(escape_csv_field(&row.layer), 8),
        az = format_field(&row.az_name, 12),
        cidr = format_field(&row.cidr, 18),
        route_table = format_field(escape_csv_field(&row.route_table), 26),
        name = format_field(escape_csv_field(&row.name), 30),
        tgw = format_field(row.tgw_attached, 7),
        routes = format_field(row.route_count, 4),
    )
}

/// Double any embedded quotes; the field is quoted by [`format_field`].
fn escape_csv_field(input: &str) -> String {
    input.replace('"', "\"\"")
}
