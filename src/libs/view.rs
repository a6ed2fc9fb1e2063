use super::todo::{Category, Todo};
use anyhow::Result;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn todos(todos: &[Todo], categories: &[Category]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "DONE", "ORDER", "TEXT", "CATEGORY", "NOTES", "UPDATED"]);
        for todo in todos {
            let category = todo
                .category_id
                .and_then(|id| categories.iter().find(|category| category.id == id))
                .map(|category| category.name.clone())
                .unwrap_or_default();
            table.add_row(row![
                todo.id,
                if todo.completed { "x" } else { "" },
                todo.order,
                todo.text,
                category,
                todo.notes.as_deref().unwrap_or(""),
                todo.updated_at.format("%Y-%m-%d %H:%M")
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn categories(categories: &[Category]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME", "COLOR"]);
        for category in categories {
            table.add_row(row![category.id, category.name, category.color]);
        }
        table.printstd();

        Ok(())
    }
}
