use crate::error::PatchError;

/// Outcome of [`insert_after_marker`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Insertion carries the new content; check `inserted` before writing"]
pub struct Insertion {
    pub content: String,
    pub inserted: bool,
}

/// Insert `block` on the line right after `marker`, at most once.
///
/// The candidate text is `marker + "\n" + block`. When that exact text is
/// already present the content comes back untouched with `inserted = false`;
/// otherwise the first occurrence of `marker` is replaced by the candidate.
pub fn insert_after_marker(
    content: &str,
    marker: &str,
    block: &str,
) -> Result<Insertion, PatchError> {
    if marker.is_empty() || !content.contains(marker) {
        return Err(PatchError::MarkerMissing {
            marker: marker.to_string(),
        });
    }

    let candidate = format!("{marker}\n{block}");

    if content.contains(&candidate) {
        tracing::debug!(marker, "block already present after marker");
        return Ok(Insertion {
            content: content.to_string(),
            inserted: false,
        });
    }

    Ok(Insertion {
        content: content.replacen(marker, &candidate, 1),
        inserted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_once() {
        let content = "server {\n    $MARKER$\n}\n";
        let first = insert_after_marker(content, "$MARKER$", "X\n").unwrap();
        assert!(first.inserted);
        assert_eq!(first.content, "server {\n    $MARKER$\nX\n\n}\n");

        let second = insert_after_marker(&first.content, "$MARKER$", "X\n").unwrap();
        assert!(!second.inserted);
        assert_eq!(second.content, first.content);
        assert_eq!(second.content.matches("$MARKER$\nX\n").count(), 1);
    }

    #[test]
    fn test_missing_marker() {
        let err = insert_after_marker("server {}", "$MARKER$", "X\n").unwrap_err();
        assert!(matches!(err, PatchError::MarkerMissing { .. }));
    }

    #[test]
    fn test_only_first_occurrence_is_used() {
        let content = "$M$\n--\n$M$\n";
        let out = insert_after_marker(content, "$M$", "B\n").unwrap();
        assert_eq!(out.content, "$M$\nB\n\n--\n$M$\n");
    }

    #[test]
    fn test_different_block_is_inserted() {
        let content = "$M$\nA\n";
        let out = insert_after_marker(content, "$M$", "B\n").unwrap();
        assert!(out.inserted);
        assert_eq!(out.content, "$M$\nB\n\nA\n");
    }

    proptest! {
        #[test]
        fn prop_insertion_is_idempotent(
            head in "[a-z \n{}]{0,40}",
            tail in "[a-z \n{}]{0,40}",
            block in "[a-z ;\n]{1,30}",
        ) {
            let doc = format!("{head}$MAIN_LOGO${tail}");
            let once = insert_after_marker(&doc, "$MAIN_LOGO$", &block).unwrap();
            let twice = insert_after_marker(&once.content, "$MAIN_LOGO$", &block).unwrap();
            prop_assert!(!twice.inserted);
            prop_assert_eq!(&twice.content, &once.content);
        }
    }
}
