use std::sync::Arc;

use api::{InMemoryBackend, VocabularyEntry};
use quiz_core::model::{LessonId, QuestionId};
use services::{FavoriteService, QuizError};

fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.insert(VocabularyEntry {
        id: QuestionId::new(1),
        lesson: LessonId::new(1),
        english: "apple".to_string(),
        chinese: "苹果".to_string(),
        part_of_speech: Some("n.".to_string()),
    });
    backend
}

#[tokio::test]
async fn toggle_reports_the_confirmed_state() {
    let backend = seeded_backend();
    let service = FavoriteService::new(Arc::new(backend.clone()));
    let id = QuestionId::new(1);

    assert!(service.toggle(id).await.unwrap());
    assert!(backend.is_favorite(id));

    assert!(!service.toggle(id).await.unwrap());
    assert!(!backend.is_favorite(id));
}

#[tokio::test]
async fn failed_toggle_changes_nothing() {
    let backend = seeded_backend();
    let service = FavoriteService::new(Arc::new(backend.clone()));
    let unknown = QuestionId::new(404);

    let err = service.toggle(unknown).await.unwrap_err();
    assert!(matches!(err, QuizError::Backend(_)));
    assert!(!backend.is_favorite(unknown));
}
