//! Pipeline definition validation for the `validate` command

use crate::core::definition::PipelineDefinition;
use anyhow::{Context, Result};
use std::path::Path;

/// Load a definition file and fail when it has structural problems
///
/// Dangling references and duplicate node names are accepted when deploying
/// but make this check fail.
pub fn validate_definition(path: &Path) -> Result<PipelineDefinition> {
    let definition = PipelineDefinition::from_file(path)
        .with_context(|| format!("Failed to load pipeline definition [{}]", path.display()))?;

    let problems = definition.validate();
    if !problems.is_empty() {
        anyhow::bail!(
            "{} problem(s) in [{}]:\n  {}",
            problems.len(),
            path.display(),
            problems.join("\n  ")
        );
    }

    Ok(definition)
}
