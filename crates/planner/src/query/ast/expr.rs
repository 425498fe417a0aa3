//! Defines the AST for SQL expressions.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// A bound parameter value.
    Value(Value),

    /// Raw SQL emitted verbatim, e.g. a reflected column default.
    Literal(String),

    /// A Postgres-style cast, e.g. `"col"::text`.
    Cast { expr: Box<Expr>, data_type: String },

    /// An aliased expression, e.g. `"col"::text AS "col"`.
    Alias { expr: Box<Expr>, alias: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'users' in 'users.id'
    pub name: String,              // e.g., the 'id' in 'users.id'
}

impl Expr {
    pub fn cast(self, data_type: &str) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.to_string(),
        }
    }

    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }
}
