use std::sync::Arc;

use api::QuizBackend;
use quiz_core::model::QuestionId;

use crate::error::QuizError;

/// Toggles the favorite flag on vocabulary items.
///
/// The returned state is the one the server confirmed; callers must not
/// update any displayed affordance before this call returns. A failed
/// toggle therefore changes nothing anywhere, which is what keeps the star
/// icon and the stored flag from drifting apart.
#[derive(Clone)]
pub struct FavoriteService {
    backend: Arc<dyn QuizBackend>,
}

impl FavoriteService {
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>) -> Self {
        Self { backend }
    }

    /// Flip the favorite flag, returning the confirmed new state.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Backend` when the item does not exist or the
    /// request fails; the flag is unchanged in that case.
    pub async fn toggle(&self, id: QuestionId) -> Result<bool, QuizError> {
        let confirmed = self.backend.toggle_favorite(id).await?;
        tracing::debug!(%id, favorite = confirmed, "favorite toggle confirmed");
        Ok(confirmed)
    }
}
