use crate::query::{
    ast::select::Select,
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        if self.columns.is_empty() {
            r.sql.push('*');
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                col.render(r);
            }
        }

        if let Some(from) = &self.from {
            r.sql.push_str(" FROM ");
            r.render_table_ref(from);
        }
        r.sql.push(';');
    }
}
