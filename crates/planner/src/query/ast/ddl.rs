//! Schema-changing statements applied to a destination as one unit.

use crate::query::ast::{create_table::CreateTable, drop_table::DropTable};

#[derive(Debug, Clone, PartialEq)]
pub enum DdlStatement {
    Drop(DropTable),
    Create(CreateTable),
}

impl DdlStatement {
    /// Name of the table the statement touches.
    pub fn table(&self) -> &str {
        match self {
            DdlStatement::Drop(drop) => &drop.table.name,
            DdlStatement::Create(create) => &create.table.name,
        }
    }
}
