use super::Console;
use crate::output::Output;
use catalog_core::OverviewCounts;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;

pub async fn run_stats(console: &Console, output: &Output) -> Result<()> {
    let mut mirrors = console.mirrors()?;
    let counts = OverviewCounts::from_snapshots(&mirrors.catalog.snapshot(), &mirrors.users.snapshot());
    mirrors.close();

    if output.is_human() {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Total Users").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Total Items").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Movies"),
            Cell::new("Series"),
        ]);
        table.add_row(vec![
            Cell::new(counts.users),
            Cell::new(counts.total_items),
            Cell::new(counts.movies),
            Cell::new(counts.series),
        ]);
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", table);
    } else {
        output.json(&json!({ "type": "stats", "counts": counts }));
    }
    Ok(())
}
