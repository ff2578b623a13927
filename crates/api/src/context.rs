/// Raw bearer credential presented with a request, if any.
///
/// Inserted for every request by [`crate::middleware::auth_middleware`];
/// verification happens later, per route, through the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken(Option<String>);

impl BearerToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
