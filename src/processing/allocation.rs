//! Concrete CIDR assignment for planned subnets.
//!
//! Blocks are handed out in plan order, each aligned to its own mask, starting
//! at the VPC network address.

use crate::error::TopologyError;
use crate::models::{align_up, ip_after_subnet, Ipv4Cidr, NetworkPlan, SubnetAllocation};
use std::net::Ipv4Addr;

/// Assign a CIDR to every subnet instance of `network`.
pub fn allocate_subnets(network: &NetworkPlan) -> Result<Vec<SubnetAllocation>, TopologyError> {
    let vpc = network.vpc_cidr;
    let mut next_ip: Option<Ipv4Addr> = Some(vpc.network());
    let mut allocations = Vec::with_capacity(network.subnets.len());

    for subnet in &network.subnets {
        let exhausted = || TopologyError::AddressSpaceExhausted {
            subnet: subnet.subnet_id.clone(),
            mask: subnet.mask_bits,
            vpc_cidr: vpc.to_string(),
        };
        if subnet.mask_bits < vpc.mask {
            return Err(TopologyError::SubnetLargerThanVpc {
                subnet: subnet.subnet_id.clone(),
                mask: subnet.mask_bits,
                vpc_cidr: vpc.to_string(),
            });
        }

        let start = next_ip
            .ok_or_else(exhausted)
            .and_then(|ip| align_up(ip, subnet.mask_bits).map_err(|_| exhausted()))?;
        let cidr = Ipv4Cidr::from_parts(start, subnet.mask_bits).map_err(|_| exhausted())?;
        if !vpc.contains(&cidr) {
            return Err(exhausted());
        }
        log::debug!("allocate {} -> {cidr}", subnet.subnet_id);
        allocations.push(SubnetAllocation {
            subnet_id: subnet.subnet_id.clone(),
            cidr,
        });

        // None once the block ends at 255.255.255.255
        next_ip = ip_after_subnet(start, subnet.mask_bits).ok();
    }

    Ok(allocations)
}
