//! Foreign-key dependency ordering.
//!
//! Tables are ordered with Kahn's algorithm: a table becomes ready once every
//! table it references has been emitted. Among ready tables the one whose name
//! sorts first is emitted next, so the same schema always yields the same order.

use model::schema::{load_order::LoadOrder, table::TableDescriptor};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// No valid load order exists. `tables` lists the tables that lie on (or
    /// between) foreign-key cycles, sorted by name.
    #[error("Cyclic foreign-key dependency between tables: {}", tables.join(", "))]
    Cycle { tables: Vec<String> },

    /// A foreign key points at a table outside the ordered set.
    #[error("Table '{table}' references unknown table '{referenced}'")]
    UnknownTable { table: String, referenced: String },
}

/// Computes a load order for `tables`: referenced tables first, dependents after.
pub fn load_order<'a, I>(tables: I) -> Result<LoadOrder, OrderError>
where
    I: IntoIterator<Item = &'a TableDescriptor>,
{
    let graph = DependencyGraph::build(tables)?;
    let order = graph.sort()?;
    debug!(order = ?order, "Computed table load order");
    Ok(order)
}

struct DependencyGraph<'a> {
    names: Vec<&'a str>,
    /// Number of distinct tables each table still waits on. Self references count.
    in_degree: Vec<usize>,
    /// `dependents[i]` holds every table with a foreign key into table `i`.
    dependents: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    fn build<I>(tables: I) -> Result<Self, OrderError>
    where
        I: IntoIterator<Item = &'a TableDescriptor>,
    {
        let by_name: BTreeMap<&'a str, &'a TableDescriptor> = tables
            .into_iter()
            .map(|table| (table.name.as_str(), table))
            .collect();

        let names: Vec<&str> = by_name.keys().copied().collect();
        let index: BTreeMap<&str, usize> =
            names.iter().enumerate().map(|(i, name)| (*name, i)).collect();

        let mut in_degree = vec![0usize; names.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); names.len()];

        for (i, table) in by_name.values().enumerate() {
            let mut referenced: Vec<&str> = table
                .foreign_keys
                .iter()
                .map(|fk| fk.referenced_table.as_str())
                .collect();
            referenced.sort_unstable();
            referenced.dedup();

            for target in referenced {
                let Some(&target_idx) = index.get(target) else {
                    return Err(OrderError::UnknownTable {
                        table: table.name.clone(),
                        referenced: target.to_string(),
                    });
                };
                in_degree[i] += 1;
                dependents[target_idx].push(i);
            }
        }

        Ok(Self {
            names,
            in_degree,
            dependents,
        })
    }

    fn sort(mut self) -> Result<LoadOrder, OrderError> {
        let mut ready: BinaryHeap<Reverse<(&str, usize)>> = self
            .in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| Reverse((self.names[i], i)))
            .collect();

        let mut order = Vec::with_capacity(self.names.len());
        let mut emitted = vec![false; self.names.len()];

        while let Some(Reverse((name, idx))) = ready.pop() {
            order.push(name.to_string());
            emitted[idx] = true;
            for &dep in &self.dependents[idx] {
                self.in_degree[dep] -= 1;
                if self.in_degree[dep] == 0 {
                    ready.push(Reverse((self.names[dep], dep)));
                }
            }
        }

        if order.len() < self.names.len() {
            return Err(OrderError::Cycle {
                tables: self.cycle_members(&emitted),
            });
        }

        Ok(LoadOrder::new(order))
    }

    /// Strips tables that merely hang off a cycle (nothing left depends on
    /// them) until only cycle participants remain.
    fn cycle_members(&self, emitted: &[bool]) -> Vec<String> {
        let mut remaining: Vec<bool> = emitted.iter().map(|e| !e).collect();

        loop {
            let leaves: Vec<usize> = (0..self.names.len())
                .filter(|&i| remaining[i])
                .filter(|&i| !self.dependents[i].iter().any(|&d| remaining[d]))
                .collect();
            if leaves.is_empty() {
                break;
            }
            for i in leaves {
                remaining[i] = false;
            }
        }

        self.names
            .iter()
            .enumerate()
            .filter(|(i, _)| remaining[*i])
            .map(|(_, name)| name.to_string())
            .collect()
    }
}
