//! Keep a subsequence of pages in a document

use super::{OperationError, OperationResult};
use lopdf::Document;
use std::collections::BTreeSet;
use tracing::debug;

/// Keep only the given pages (1-based), in their original order
///
/// Every other page is removed from the page tree and objects that become
/// unreachable are dropped. Returns the number of pages left.
///
/// # Errors
///
/// `PageIndexOutOfBounds` if a page number is 0 or past the end of the
/// document, `NoPagesToProcess` if `keep` is empty.
pub fn retain_pages(doc: &mut Document, keep: &[u32]) -> OperationResult<usize> {
    let pages = doc.get_pages();
    let total = pages.len();

    if let Some(&bad) = keep.iter().find(|&&n| n == 0 || n as usize > total) {
        return Err(OperationError::PageIndexOutOfBounds(bad as usize, total));
    }

    let keep: BTreeSet<u32> = keep.iter().copied().collect();
    if keep.is_empty() {
        return Err(OperationError::NoPagesToProcess);
    }

    let to_delete: Vec<u32> = pages
        .keys()
        .filter(|number| !keep.contains(number))
        .copied()
        .collect();

    if !to_delete.is_empty() {
        doc.delete_pages(&to_delete);
        let pruned = doc.prune_objects();
        doc.renumber_objects();
        debug!(
            deleted = to_delete.len(),
            pruned = pruned.len(),
            "removed pages from document"
        );
    }

    Ok(keep.len())
}
