use crate::query::{
    ast::create_table::{ColumnDef, CreateTable, TableConstraint},
    renderer::{Render, Renderer},
};

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE TABLE ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");

        let num_cols = self.columns.len();
        for (i, col) in self.columns.iter().enumerate() {
            r.sql.push_str("\n\t");
            col.render(r);
            if i < num_cols - 1 || !self.constraints.is_empty() {
                r.sql.push(',');
            }
        }

        for (i, constraint) in self.constraints.iter().enumerate() {
            r.sql.push_str("\n\t");
            constraint.render(r);
            if i < self.constraints.len() - 1 {
                r.sql.push(',');
            }
        }

        r.sql.push_str("\n);");
    }
}

impl Render for ColumnDef {
    fn render(&self, r: &mut Renderer) {
        // Name and Type
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
        r.sql.push(' ');
        r.sql.push_str(&r.dialect.render_data_type(&self.data_type));

        // Constraints
        if self.is_identity {
            r.sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if !self.is_nullable {
            r.sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            r.sql.push_str(" DEFAULT ");
            default.render(r);
        }
    }
}

impl Render for TableConstraint {
    fn render(&self, r: &mut Renderer) {
        match self {
            TableConstraint::PrimaryKey { columns } => {
                r.sql.push_str("PRIMARY KEY (");
                r.push_quoted_list(columns);
                r.sql.push(')');
            }
            TableConstraint::Unique { columns } => {
                r.sql.push_str("UNIQUE (");
                r.push_quoted_list(columns);
                r.sql.push(')');
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                references,
                referenced_columns,
            } => {
                if let Some(name) = name {
                    r.sql.push_str("CONSTRAINT ");
                    r.sql.push_str(&r.dialect.quote_identifier(name));
                    r.sql.push(' ');
                }
                r.sql.push_str("FOREIGN KEY (");
                r.push_quoted_list(columns);
                r.sql.push_str(") REFERENCES ");
                r.render_table_ref(references);
                r.sql.push_str(" (");
                r.push_quoted_list(referenced_columns);
                r.sql.push(')');
            }
        }
    }
}
