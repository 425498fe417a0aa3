use crate::query::{
    ast::insert::Insert,
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        // 1. INSERT INTO table (...)
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);

        if self.columns.is_empty() {
            r.sql.push_str(" DEFAULT VALUES;");
            return;
        }

        r.sql.push_str(" (");
        r.push_quoted_list(&self.columns);
        r.sql.push(')');

        // 2. VALUES (...)
        r.sql.push_str(" VALUES ");
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql.push('(');
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    r.sql.push_str(", ");
                }
                val.render(r);
            }
            r.sql.push(')');
        }
        r.sql.push(';');
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::query::{
        ast::{common::TableRef, expr::Expr, insert::Insert},
        dialect::Postgres,
        renderer::{Render, Renderer},
    };

    fn value(val: Value) -> Expr {
        Expr::Value(val)
    }

    #[test]
    fn test_render_batch_insert_postgres() {
        let ast = Insert {
            table: TableRef {
                schema: None,
                name: "users".to_string(),
            },
            columns: vec!["name".to_string(), "is_active".to_string()],
            values: vec![
                vec![
                    value(Value::String("Alice".to_string())),
                    value(Value::Boolean(true)),
                ],
                vec![
                    value(Value::String("Bob".to_string())),
                    value(Value::Boolean(false)),
                ],
            ],
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        let expected_sql =
            r#"INSERT INTO "users" ("name", "is_active") VALUES ($1, $2), ($3, $4);"#;
        assert_eq!(sql, expected_sql);
        assert_eq!(
            params,
            vec![
                Value::String("Alice".to_string()),
                Value::Boolean(true),
                Value::String("Bob".to_string()),
                Value::Boolean(false)
            ]
        );
    }

    #[test]
    fn test_render_insert_without_columns() {
        let ast = Insert {
            table: TableRef::new("heartbeat"),
            columns: vec![],
            values: vec![vec![]],
        };

        let mut renderer = Renderer::new(&Postgres);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(sql, r#"INSERT INTO "heartbeat" DEFAULT VALUES;"#);
        assert!(params.is_empty());
    }
}
