use crate::query::{
    ast::ddl::DdlStatement,
    renderer::{Render, Renderer},
};

impl Render for DdlStatement {
    fn render(&self, r: &mut Renderer) {
        match self {
            DdlStatement::Drop(drop) => drop.render(r),
            DdlStatement::Create(create) => create.render(r),
        }
    }
}
