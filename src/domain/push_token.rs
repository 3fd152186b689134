/// A registered device push token.
///
/// `id` is assigned by the token store and is the only handle used for deletion; `token` is the opaque
/// provider credential and is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PushToken {
    pub id: String,
    pub token: String,
}

impl PushToken {
    #[must_use]
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self { id: id.into(), token: token.into() }
    }
}
