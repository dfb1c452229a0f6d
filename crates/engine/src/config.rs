use folio_core::rate_limit::DEFAULT_EDIT_RATE_LIMIT;

/// Tunables the engine reads on every request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Edit actions (submit, revert, move) allowed per actor per window.
    pub edit_rate_limit: i64,
    /// Whether callers without a token may propose edits to unprotected pages.
    pub anonymous_can_edit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            edit_rate_limit: DEFAULT_EDIT_RATE_LIMIT,
            anonymous_can_edit: false,
        }
    }
}
