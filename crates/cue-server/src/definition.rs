use anyhow::{bail, Context, Result};
use cue_core::Definition;
use std::path::Path;

/// Read a show definition from a `.json`, `.yaml` or `.yml` file.
pub fn load_definition(path: &Path) -> Result<Definition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let definition: Definition = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON definition {}", path.display()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML definition {}", path.display()))?,
        _ => bail!(
            "Unsupported definition format {} (expected .json, .yaml or .yml)",
            path.display()
        ),
    };

    if definition.id.trim().is_empty() {
        bail!("Definition {} has an empty id", path.display());
    }

    Ok(definition)
}
