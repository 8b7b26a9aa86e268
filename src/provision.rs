//! Provisioning adapter seam.
//!
//! Real cloud provisioning lives outside this crate. [`DryRunAdapter`] renders
//! the plan instead of creating anything.

use crate::error::ProvisionError;
use crate::models::{DeploymentPlan, ResourceRef};
use crate::output::{render_table, subnet_print, to_json};
use std::collections::BTreeMap;
use std::io::Write;

/// Realized output values keyed by export name.
pub type StackOutputs = BTreeMap<String, String>;

/// Consumes a finished plan and materializes it.
pub trait ProvisioningAdapter {
    fn provision(&mut self, plan: &DeploymentPlan) -> Result<StackOutputs, ProvisionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Writes the plan to `writer` and reports placeholder output values.
pub struct DryRunAdapter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> DryRunAdapter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        DryRunAdapter { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProvisioningAdapter for DryRunAdapter<W> {
    fn provision(&mut self, plan: &DeploymentPlan) -> Result<StackOutputs, ProvisionError> {
        let order = plan.creation_order()?;
        log::info!(
            "dry run: {} resources for {} (first {}, last {})",
            order.len(),
            plan.stack_name,
            order.first().map(ResourceRef::to_string).unwrap_or_default(),
            order.last().map(ResourceRef::to_string).unwrap_or_default()
        );

        match self.format {
            OutputFormat::Table => render_table(plan, &mut self.writer)?,
            OutputFormat::Csv => subnet_print(plan, &mut self.writer)?,
            OutputFormat::Json => writeln!(self.writer, "{}", to_json(plan)?)?,
        }
        self.writer.flush()?;

        Ok(plan
            .outputs
            .iter()
            .map(|o| {
                let value = match o.attribute.as_str() {
                    "CidrBlock" => plan.network.vpc_cidr.to_string(),
                    _ => format!("<{}>", o.source),
                };
                (o.export_name.clone(), value)
            })
            .collect())
    }
}
