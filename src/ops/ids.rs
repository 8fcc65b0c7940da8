use crate::io::store::{LogStore, Query, StoreError};

/// The ticket number a new `Open` log receives: one past the highest
/// existing number, or 1 when there is none.
pub fn next_custom_id<I>(existing: I) -> Result<u64, StoreError>
where
    I: IntoIterator<Item = Option<u64>>,
{
    match existing.into_iter().flatten().max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted(max)),
    }
}

/// Read the next ticket number from a store without reserving it.
///
/// Used for previews (`dl next-id`, the add form). The number actually
/// assigned is decided inside the store's write, so a concurrent writer may
/// take this one first.
pub fn query_next_custom_id(store: &dyn LogStore) -> Result<u64, StoreError> {
    let top = store.query(&Query::max_custom_id())?;
    next_custom_id(top.into_iter().map(|r| r.custom_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory_store::MemoryStore;
    use crate::model::document::LogDocument;

    #[test]
    fn next_after_max() {
        assert_eq!(next_custom_id([Some(3), None, Some(7), Some(2)]).unwrap(), 8);
    }

    #[test]
    fn first_ticket_is_one() {
        assert_eq!(next_custom_id([None, None]).unwrap(), 1);
        assert_eq!(next_custom_id(std::iter::empty()).unwrap(), 1);
    }

    #[test]
    fn exhausted_numbers_are_an_error() {
        let err = next_custom_id([Some(3), Some(u64::MAX)]).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(u64::MAX)));
        assert_eq!(next_custom_id([Some(u64::MAX - 1)]).unwrap(), u64::MAX);
    }

    #[test]
    fn store_refuses_to_open_past_the_last_number() {
        use crate::model::{Category, LogDraft, LogType};

        let store = MemoryStore::with_documents([(
            "top".to_string(),
            LogDocument {
                log_type: Some("Open".into()),
                custom_id: Some(u64::MAX),
                entry: "x".into(),
                ..Default::default()
            },
        )]);
        let draft = LogDraft {
            log_type: LogType::Open,
            categories: vec![Category::Work],
            subject: None,
            entry: "one too many".into(),
            task_ref: None,
            date_string: "2025-05-01".into(),
            timestamp: "2025-05-01T09:00".into(),
            attachments: Vec::new(),
            links: Vec::new(),
        };
        let err = store.create(draft).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(_)));
        assert!(matches!(
            query_next_custom_id(&store),
            Err(StoreError::IdsExhausted(_))
        ));
        assert_eq!(store.query(&Query::all()).unwrap().len(), 1);
    }

    #[test]
    fn store_query_previews_next_number() {
        let doc = |custom_id: Option<u64>| LogDocument {
            log_type: Some("Open".into()),
            custom_id,
            entry: "x".into(),
            ..Default::default()
        };
        let store = MemoryStore::with_documents([
            ("a".to_string(), doc(Some(7))),
            ("b".to_string(), doc(None)),
            ("c".to_string(), doc(Some(3))),
        ]);
        assert_eq!(query_next_custom_id(&store).unwrap(), 8);
        assert_eq!(query_next_custom_id(&MemoryStore::new()).unwrap(), 1);
    }
}
