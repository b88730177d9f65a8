//! Change detection between the file-system and database document sets.

use designsync_core::{DesignDocument, DocumentSet};

/// Documents that must be written to bring the database in line with the
/// file system.
///
/// For each file-system document, in set order: absent from the database ⇒
/// pushed as-is (a create, no revision); content drift under revision-blind
/// equality ⇒ pushed as a copy carrying the database's current revision (an
/// update). Documents present only in the database are never reported — push
/// is additive and corrective, never subtractive.
///
/// Database sets produced by the extractor always carry a revision. The
/// function accepts any [`DocumentSet`], though, and a caller-built entry
/// without one cannot anchor an update; the drifted document is then pushed
/// as-is and the resulting conflict surfaces on the next fetch.
pub fn changed_documents(
    from_file_system: &DocumentSet,
    from_database: &DocumentSet,
) -> Vec<DesignDocument> {
    let mut changed = Vec::new();
    for doc in from_file_system.values() {
        match from_database.get(doc.id()) {
            None => changed.push(doc.clone()),
            Some(db_doc) if db_doc != doc => changed.push(match db_doc.revision() {
                Some(revision) => doc.copy_with_revision(revision),
                None => doc.clone(),
            }),
            Some(_) => {}
        }
    }
    changed
}
