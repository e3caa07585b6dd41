//! Foreign key dependency resolution.
//!
//! Orders a table selection so that referenced tables come before the tables
//! referencing them, which lets transfers run with constraints enabled. The
//! sort is an explicit caller step; the orchestrator migrates in exactly the
//! order it is given.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::TableRef;
use crate::client::DbClient;
use crate::error::Result;

/// Sort `tables` so referenced tables precede referencing ones, fetching
/// foreign keys from `client`.
///
/// The output is always a permutation of the input. Self-references and
/// references to tables outside the selection are ignored. Cyclic components
/// never fail the sort; their members are appended in input order.
pub async fn topological_order(
    client: &Arc<dyn DbClient>,
    tables: &[TableRef],
) -> Result<Vec<TableRef>> {
    let mut edges = Vec::new();
    for (idx, table) in tables.iter().enumerate() {
        for fk in client.foreign_keys(table).await? {
            edges.push((idx, fk.references));
        }
    }
    Ok(order_tables(tables, &edges))
}

/// Pure ordering over an index arena. `edges` holds (referencing input index,
/// referenced table) pairs.
fn order_tables(tables: &[TableRef], edges: &[(usize, TableRef)]) -> Vec<TableRef> {
    let index_of: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.full_name(), i))
        .collect();

    // dependents[b] lists tables referencing b; in_degree counts unmet
    // references per table.
    let n = tables.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for (from, referenced) in edges {
        match index_of.get(&referenced.full_name()) {
            Some(&to) if to != *from => {
                dependents[to].push(*from);
                in_degree[*from] += 1;
            }
            _ => {}
        }
    }

    // Kahn's algorithm, always taking the lowest ready input index so equal
    // inputs produce equal outputs.
    let mut ordered = Vec::with_capacity(n);
    let mut placed = vec![false; n];

    loop {
        let next = (0..n).find(|&i| !placed[i] && in_degree[i] == 0);
        let Some(i) = next else { break };
        placed[i] = true;
        ordered.push(i);
        for &dep in &dependents[i] {
            in_degree[dep] -= 1;
        }
    }

    if ordered.len() < n {
        // Remaining tables form at least one cycle.
        let cyclic: Vec<&TableRef> = (0..n).filter(|&i| !placed[i]).map(|i| &tables[i]).collect();
        warn!(
            "Circular foreign key dependencies among {} tables; keeping input order for: {}",
            cyclic.len(),
            cyclic
                .iter()
                .map(|t| t.full_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        ordered.extend((0..n).filter(|&i| !placed[i]));
    }

    debug!("Resolved migration order for {} tables", n);
    ordered.into_iter().map(|i| tables[i].clone()).collect()
}
