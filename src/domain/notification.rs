/// A broadcast payload whose title and body are known to be non-blank.
///
/// Both values are delivered verbatim as provider data fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    title: String,
    body: String,
}

impl Notification {
    /// Builds a notification, rejecting blank fields.
    ///
    /// # Errors
    /// Returns a message naming the offending field if `title` or `body` is empty or whitespace.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, String> {
        let title = title.into();
        let body = body.into();
        if title.trim().is_empty() {
            return Err("Title cannot be empty".into());
        }
        if body.trim().is_empty() {
            return Err("Body cannot be empty".into());
        }
        Ok(Self { title, body })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Aggregate outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Recipients the provider accepted.
    pub sent: usize,
    /// Recipients the provider rejected, for any reason.
    pub failed: usize,
    /// Tokens removed from the store because the provider reported them unregistered.
    pub pruned: usize,
}
