//! Shared handler state.

use lectern_classroom::Classroom;
use lectern_core::Locale;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub classroom: Classroom,
    /// Language of user-facing messages
    pub locale: Locale,
}

impl AppState {
    pub fn new(classroom: Classroom, locale: Locale) -> Self {
        Self { classroom, locale }
    }
}
