//! Import result aggregation.
//!
//! A pure fold from the ordered outcome stream into the report returned to
//! the caller. Totals are derived from bucket lengths, so the count
//! invariants hold by construction.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportedKind {
    Document,
    Folder,
}

/// Per-item result of the import pipeline.
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Imported {
        local_id: Uuid,
        remote_id: String,
        kind: ImportedKind,
    },
    Skipped {
        remote_id: String,
        display_name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedItem {
    pub id: String,
    pub name: String,
    pub error: String,
}

/// Aggregate result returned to the caller. Created once per import call,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub imported_document_ids: Vec<String>,
    pub imported_folder_ids: Vec<String>,
    pub skipped_items: Vec<SkippedItem>,
    pub total_documents_imported: usize,
    pub total_folders_imported: usize,
    pub total_skipped: usize,
}

/// Bucket the ordered outcome stream into the report shape.
pub fn aggregate(outcomes: Vec<ImportOutcome>) -> ImportReport {
    let mut imported_document_ids = Vec::new();
    let mut imported_folder_ids = Vec::new();
    let mut skipped_items = Vec::new();

    for outcome in outcomes {
        match outcome {
            ImportOutcome::Imported { local_id, kind, .. } => match kind {
                ImportedKind::Document => imported_document_ids.push(local_id.to_string()),
                ImportedKind::Folder => imported_folder_ids.push(local_id.to_string()),
            },
            ImportOutcome::Skipped {
                remote_id,
                display_name,
                reason,
            } => skipped_items.push(SkippedItem {
                id: remote_id,
                name: display_name,
                error: reason,
            }),
        }
    }

    ImportReport {
        total_documents_imported: imported_document_ids.len(),
        total_folders_imported: imported_folder_ids.len(),
        total_skipped: skipped_items.len(),
        imported_document_ids,
        imported_folder_ids,
        skipped_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imported(kind: ImportedKind) -> ImportOutcome {
        ImportOutcome::Imported {
            local_id: Uuid::new_v4(),
            remote_id: "r".to_string(),
            kind,
        }
    }

    fn skipped(id: &str, reason: &str) -> ImportOutcome {
        ImportOutcome::Skipped {
            remote_id: id.to_string(),
            display_name: format!("name-{id}"),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_counts_match_list_lengths() {
        let report = aggregate(vec![
            imported(ImportedKind::Document),
            imported(ImportedKind::Folder),
            skipped("a", "not found"),
            imported(ImportedKind::Document),
            skipped("b", "quota exceeded"),
        ]);

        assert_eq!(report.total_documents_imported, report.imported_document_ids.len());
        assert_eq!(report.total_folders_imported, report.imported_folder_ids.len());
        assert_eq!(report.total_skipped, report.skipped_items.len());
        assert_eq!(report.total_documents_imported, 2);
        assert_eq!(report.total_folders_imported, 1);
        assert_eq!(report.total_skipped, 2);
    }

    #[test]
    fn test_skipped_order_preserved() {
        let report = aggregate(vec![
            skipped("first", "x"),
            imported(ImportedKind::Document),
            skipped("second", "y"),
        ]);

        assert_eq!(report.skipped_items[0].id, "first");
        assert_eq!(report.skipped_items[1].id, "second");
    }

    #[test]
    fn test_empty_outcomes() {
        let report = aggregate(Vec::new());
        assert_eq!(report.total_documents_imported, 0);
        assert_eq!(report.total_folders_imported, 0);
        assert_eq!(report.total_skipped, 0);
    }
}
