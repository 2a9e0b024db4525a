use context_protocol::error::ProjectMismatch;
use context_protocol::model::Project;

use crate::error::{MultiProjectError, Result};

/// Checks that every project in `projects` shares the same embedding
/// dimensions and model id before any store is loaded for a cross-project
/// search. A project with an empty `model_id` is treated as legacy data
/// and considered compatible with anything.
pub fn validate_compatible(projects: &[Project]) -> Result<()> {
    let reference = projects.iter().find(|p| !p.model_id.is_empty());
    let Some(reference) = reference else {
        return Ok(());
    };

    let offending: Vec<ProjectMismatch> = projects
        .iter()
        .filter(|p| !p.model_id.is_empty())
        .filter(|p| p.model_id != reference.model_id || p.dimensions != reference.dimensions)
        .map(|p| ProjectMismatch {
            project_id: p.id.clone(),
            expected_model: reference.model_id.clone(),
            found_model: p.model_id.clone(),
            expected_dimensions: reference.dimensions,
            found_dimensions: p.dimensions,
        })
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(MultiProjectError::EmbeddingMismatch { offending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn project(id: &str, model_id: &str, dimensions: u32) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_string(),
            root_path: PathBuf::from("/tmp"),
            model_id: model_id.to_string(),
            dimensions,
            file_count: 0,
            chunk_count: 0,
            last_indexed_at: None,
            updated_at: 0,
            description: None,
            tags: BTreeSet::new(),
            ignore_patterns: Vec::new(),
        }
    }

    #[test]
    fn matching_projects_are_compatible() {
        let projects = vec![project("a", "bge-small", 384), project("b", "bge-small", 384)];
        assert!(validate_compatible(&projects).is_ok());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let projects = vec![project("a", "bge-small", 1024), project("b", "bge-small", 768)];
        let err = validate_compatible(&projects).unwrap_err();
        match err {
            MultiProjectError::EmbeddingMismatch { offending } => {
                assert_eq!(offending.len(), 1);
                assert_eq!(offending[0].project_id, "b");
            }
            _ => panic!("expected EmbeddingMismatch"),
        }
    }

    #[test]
    fn legacy_empty_model_id_is_always_compatible() {
        let projects = vec![project("a", "bge-small", 384), project("b", "", 999)];
        assert!(validate_compatible(&projects).is_ok());
    }
}
