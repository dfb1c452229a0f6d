use folio_core::roles::Actor;

use crate::engine::Engine;
use crate::error::EngineResult;

impl Engine {
    /// Count one edit action against `actor`'s window.
    ///
    /// The hit is recorded before the check, so refused attempts still
    /// count toward the window.
    pub(crate) async fn take_rate_slot(&self, actor: &Actor) -> EngineResult<()> {
        let now = self.now();
        let key = actor.rate_key();
        let window = self.store.record_rate_hit(&key, now).await?;
        if let Err(e) = window.check(self.config.edit_rate_limit, now) {
            tracing::warn!(actor = %key, hits = window.hits, "Edit rate limit exceeded");
            return Err(e.into());
        }
        Ok(())
    }
}
