use super::Console;
use crate::output::Output;
use catalog_core::overview::{rows, OverviewRow};
use catalog_core::search_items;
use catalog_models::{CatalogItem, CatalogKind};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_list(console: &Console, search: Option<String>, output: &Output) -> Result<()> {
    let mut mirror = console.catalog_mirror()?;
    let snapshot = mirror.snapshot();
    mirror.close();

    let query = search.unwrap_or_default();
    let visible: Vec<CatalogItem> = search_items(&snapshot, &query).into_iter().cloned().collect();
    let rows = rows(&visible);

    if !output.is_human() {
        output.json(&json!({ "type": "list", "search": query, "items": rows }));
        return Ok(());
    }

    if rows.is_empty() {
        if query.trim().is_empty() {
            output.info("The catalog is empty");
        } else {
            output.info(format!("No items match '{}'", query));
        }
        return Ok(());
    }

    println!("{}", render_table(&rows));
    output.info(format!("{} of {} items", rows.len(), snapshot.len()).bright_black().to_string());
    Ok(())
}

fn render_table(rows: &[OverviewRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Type").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Seasons").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Episodes").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for row in rows {
        let kind = match row.kind {
            CatalogKind::Movie => Cell::new(row.kind).fg(comfy_table::Color::Cyan),
            CatalogKind::Series => Cell::new(row.kind).fg(comfy_table::Color::Magenta),
        };
        // Movies have no episode columns
        let (seasons, episodes) = if row.can_append {
            (row.seasons.to_string(), row.episodes.to_string())
        } else {
            ("-".to_string(), "-".to_string())
        };
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(&row.title),
            kind,
            Cell::new(seasons),
            Cell::new(episodes),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}
