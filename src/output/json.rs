//! JSON export of a deployment plan.

use crate::error::ProvisionError;
use crate::models::DeploymentPlan;
use std::path::{Path, PathBuf};

pub fn to_json(plan: &DeploymentPlan) -> Result<String, ProvisionError> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// File name for a plan written today, e.g. `vpc_plan_dev_2024-05-01.json`.
pub fn plan_file_name(env_name: &str) -> String {
    let now = chrono::Utc::now();
    format!("vpc_plan_{env_name}_{}.json", now.format("%Y-%m-%d"))
}

/// Write the plan as JSON into `dir` and return the file path.
pub fn write_plan_file(plan: &DeploymentPlan, dir: &Path) -> Result<PathBuf, ProvisionError> {
    let path = dir.join(plan_file_name(&plan.env_name));
    let json = to_json(plan)?;
    log::warn!("Writing plan to file: {}", path.display());
    std::fs::write(&path, json)?;
    Ok(path)
}
