//! Startup seeding of variant documents from a directory of JSON files.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::models::resume::VariantKey;
use crate::patch::schema::validate_resume_value;
use crate::store::ResumeStore;

/// Inserts each `*.json` document in `dir` whose variant has no current
/// document. Existing documents are never overwritten. Returns how many
/// documents were inserted.
pub async fn seed_from_dir(store: &dyn ResumeStore, dir: &Path) -> Result<usize> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read seed directory {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut inserted = 0;
    for path in paths {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;

        let variant: VariantKey = value
            .get("variantKey")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("{} has no variantKey", path.display()))?
            .parse()
            .with_context(|| format!("{} has an unknown variantKey", path.display()))?;

        let resume = match validate_resume_value(&value, variant) {
            Ok(resume) => resume,
            Err(violations) => {
                let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
                bail!("{} is not a valid resume: {}", path.display(), listed.join("; "));
            }
        };

        if store.get_resume(variant).await?.is_some() {
            warn!("Skipping seed {}: {variant} already has a document", path.display());
            continue;
        }

        store.save_resume(&resume).await?;
        info!("Seeded {variant} from {}", path.display());
        inserted += 1;
    }

    Ok(inserted)
}
