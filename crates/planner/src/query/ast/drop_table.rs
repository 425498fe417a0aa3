use crate::query::ast::common::TableRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub table: TableRef,
    pub if_exists: bool,
}
