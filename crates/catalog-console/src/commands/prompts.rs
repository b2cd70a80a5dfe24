use color_eyre::Result;
use dialoguer::{Confirm, Input};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

    if let Some(default_value) = default.filter(|d| !d.is_empty()) {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt until something other than whitespace is entered
pub fn prompt_required(prompt: &str, default: Option<&str>) -> Result<String> {
    loop {
        let value = prompt_string(prompt, default)?;
        if !value.trim().is_empty() {
            return Ok(value);
        }
        eprintln!("{} is required.", prompt);
    }
}

/// Prompt for a comma-separated list; blank entries are dropped
pub fn prompt_list(prompt: &str, default: &[String]) -> Result<Vec<String>> {
    let joined = default.join(", ");
    let raw = prompt_string(prompt, Some(&joined))?;
    Ok(split_list(&raw))
}

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
