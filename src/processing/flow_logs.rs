//! Flow-log plumbing: role, encryption key, log group.
//!
//! Nothing here feeds back into the topology or routing plans.

use crate::models::{
    ConfigModel, DeploymentContext, FlowLogPlan, KeyPolicyStatement, KeySource, NewKeySpec,
};

pub const LOGS_PRINCIPAL: &str = "logs.amazonaws.com";
pub const RETENTION_DAYS: u32 = 365;

pub fn plan_flow_logs(config: &ConfigModel, ctx: &DeploymentContext) -> FlowLogPlan {
    let key = match config.encryption_key_arn.as_deref().map(str::trim) {
        Some(arn) if !arn.is_empty() => {
            log::info!("flow logs: reusing encryption key {arn}");
            KeySource::Existing(arn.to_string())
        }
        _ => KeySource::Create(new_key(ctx)),
    };

    FlowLogPlan {
        role_principal: LOGS_PRINCIPAL.to_string(),
        key,
        log_group_name: format!("/vpc/flowlogs/{}-{}", config.project_name, ctx.env_name),
        retention_days: RETENTION_DAYS,
        traffic_type: "ALL".to_string(),
    }
}

fn new_key(ctx: &DeploymentContext) -> NewKeySpec {
    let account = match &ctx.account {
        Some(account) => format!("arn:aws:iam::{account}:root"),
        None => "account-root".to_string(),
    };
    NewKeySpec {
        alias: "Logs".to_string(),
        description: "Used for cloudwatch logs encryption key".to_string(),
        enable_key_rotation: true,
        policy: vec![
            KeyPolicyStatement {
                principal: LOGS_PRINCIPAL.to_string(),
                actions: [
                    "kms:Encrypt*",
                    "kms:Decrypt*",
                    "kms:ReEncrypt*",
                    "kms:GenerateDataKey*",
                    "kms:Describe*",
                ]
                .iter()
                .map(|a| a.to_string())
                .collect(),
                resources: vec!["*".to_string()],
            },
            KeyPolicyStatement {
                principal: account,
                actions: vec!["kms:*".to_string()],
                resources: vec!["*".to_string()],
            },
        ],
    }
}
