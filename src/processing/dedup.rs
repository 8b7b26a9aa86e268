//! Route de-duplication.
//!
//! The provider rejects a second identical route on the same table, so route
//! lists are reduced to one entry per (route table, destination).

use crate::models::{Ipv4Cidr, RouteEntry};
use itertools::Itertools;
use std::collections::HashSet;

/// Keep the first route for each (route table, destination) pair, preserving order.
pub fn dedup_routes(routes: Vec<RouteEntry>) -> Vec<RouteEntry> {
    let before = routes.len();
    let routes: Vec<RouteEntry> = routes
        .into_iter()
        .unique_by(|r| (r.route_table.clone(), r.destination))
        .collect();
    if routes.len() < before {
        log::debug!(
            "dedup_routes: dropped {} duplicate route(s)",
            before - routes.len()
        );
    }
    routes
}

/// Drop routes whose (route table, destination) already appears in `existing`.
pub fn without_existing(routes: Vec<RouteEntry>, existing: &[RouteEntry]) -> Vec<RouteEntry> {
    let taken: HashSet<(&str, Ipv4Cidr)> = existing
        .iter()
        .map(|r| (r.route_table.as_str(), r.destination))
        .collect();
    routes
        .into_iter()
        .filter(|r| {
            let clash = taken.contains(&(r.route_table.as_str(), r.destination));
            if clash {
                log::warn!(
                    "route {} to {} on {} duplicates an existing route, skipped",
                    r.id,
                    r.destination,
                    r.route_table
                );
            }
            !clash
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteTarget;

    fn route(id: &str, table: &str, dest: &str) -> RouteEntry {
        RouteEntry {
            id: id.to_string(),
            route_table: table.to_string(),
            destination: Ipv4Cidr::new(dest).unwrap(),
            target: RouteTarget::TransitGateway("tgw-1".to_string()),
            depends_on: vec![],
        }
    }

    #[test]
    fn test_dedup_routes_shared_table() {
        let routes = vec![
            route("r0", "rtA", "0.0.0.0/0"),
            route("r1", "rtA", "0.0.0.0/0"),
            route("r2", "rtA", "10.1.0.0/16"),
            route("r3", "rtB", "0.0.0.0/0"),
        ];
        let result = dedup_routes(routes);
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r2", "r3"], "first occurrence wins, order kept");
    }

    #[test]
    fn test_dedup_routes_empty() {
        assert!(dedup_routes(vec![]).is_empty());
    }

    #[test]
    fn test_without_existing() {
        let existing = vec![route("d0", "rtA", "0.0.0.0/0")];
        let extra = vec![route("a0", "rtA", "0.0.0.0/0"), route("a1", "rtB", "0.0.0.0/0")];
        let result = without_existing(extra, &existing);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a1");
    }
}
