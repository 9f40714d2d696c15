use super::*;

#[test]
fn vector_literal_format() {
    assert_eq!(vector_literal(&[1.0, 2.5, -3.0]), "[1,2.5,-3]");
    assert_eq!(vector_literal(&[]), "[]");
}

#[test]
fn documents_schema_matches_embedding_dimension() {
    assert!(CREATE_DOCUMENTS_TABLE.contains("embedding vector(1536)"));
    assert!(CREATE_DOCUMENTS_TABLE.contains("metadata jsonb"));
    assert!(CREATE_DOCUMENTS_TABLE.contains("document_type text NOT NULL"));
}

#[test]
fn embedding_index_uses_ivfflat_cosine() {
    assert!(CREATE_EMBEDDING_INDEX.contains("ivfflat"));
    assert!(CREATE_EMBEDDING_INDEX.contains("vector_cosine_ops"));
    assert!(CREATE_EMBEDDING_INDEX.contains("lists = 100"));
}

// Re-running setup fails once objects exist; only the extension is guarded.
#[test]
fn provisioning_statements_are_unguarded() {
    for statement in [
        CREATE_DOCUMENTS_TABLE,
        CREATE_CHAT_HISTORY_TABLE,
        CREATE_USER_SESSIONS_TABLE,
        CREATE_EMBEDDING_INDEX,
        CREATE_DOCUMENT_TYPE_INDEX,
        CREATE_SESSION_INDEX,
    ] {
        assert!(!statement.contains("IF NOT EXISTS"), "{statement}");
    }
    assert!(CREATE_VECTOR_EXTENSION.contains("IF NOT EXISTS"));
}

#[test]
fn insert_outcomes_distinguish_rejection() {
    let id = Uuid::new_v4();
    assert_ne!(
        InsertOutcome::Inserted(id),
        InsertOutcome::Rejected("duplicate".to_string())
    );
}
