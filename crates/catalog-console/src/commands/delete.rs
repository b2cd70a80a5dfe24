use super::prompts::prompt_yes_no;
use super::{fail, Console};
use crate::output::Output;
use catalog_core::{search_items, CatalogError, Selection};
use color_eyre::Result;
use serde_json::json;

pub async fn run_delete(
    console: &Console,
    ids: Vec<String>,
    all_matching: Option<String>,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let mut mirror = console.catalog_mirror()?;
    let snapshot = mirror.snapshot();
    mirror.close();

    let mut selection = Selection::new();
    match &all_matching {
        Some(search) => selection.select_all(search_items(&snapshot, search)),
        None => {
            for id in &ids {
                if !selection.contains(id) {
                    selection.toggle(id);
                }
            }
            selection.retain_existing(&snapshot);
            let unknown: Vec<&str> = ids
                .iter()
                .map(String::as_str)
                .filter(|id| !selection.contains(id))
                .collect();
            if !unknown.is_empty() {
                output.warn(format!("Not in the catalog, skipped: {}", unknown.join(", ")));
            }
        }
    }

    if selection.is_empty() {
        output.warn("Nothing to delete");
        return Ok(());
    }

    let ids = selection.ids();
    if !yes && output.is_human() {
        let prompt = if ids.len() == 1 {
            format!("Delete {}?", ids[0])
        } else {
            format!("Delete {} items?", ids.len())
        };
        if !prompt_yes_no(&prompt, Some(false))? {
            output.info("Cancelled");
            return Ok(());
        }
    }

    let gateway = console.gateway();
    let result = if ids.len() == 1 {
        gateway.delete(&ids[0]).await.map(|()| ids.clone())
    } else {
        gateway.bulk_delete(&ids).await.map(|report| report.deleted)
    };

    // Landed deletes stay landed, so persist before reporting
    console.save()?;

    match result {
        Ok(deleted) => {
            output.success(format!("Deleted {} item(s)", deleted.len()));
            output.json(&json!({ "type": "deleted", "ids": deleted }));
            Ok(())
        }
        Err(err) => {
            if let CatalogError::PartialBulkFailure { failed, .. } = &err {
                output.warn(format!("Not deleted: {}", failed.join(", ")));
            }
            Err(fail(output, err))
        }
    }
}
