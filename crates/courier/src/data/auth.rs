use crate::core::basic_credentials;
use crate::data::Header;

/// Produces the `Authorization` header of a request.
pub trait AuthProvider: Send + Sync {
    fn header(&self) -> Header;
}

/// `Authorization: Basic base64(user:pass)`.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str { &self.username }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl AuthProvider for BasicAuth {
    fn header(&self) -> Header { Header::new("Authorization", basic_credentials(&self.username, &self.password)) }
}

/// An `Authorization` value used verbatim, e.g. `Bearer <token>`.
#[derive(Clone)]
pub struct RawAuth {
    value: String,
}

impl RawAuth {
    pub fn new(value: impl Into<String>) -> Self { Self { value: value.into() } }
}

impl std::fmt::Debug for RawAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("RawAuth").finish_non_exhaustive() }
}

impl AuthProvider for RawAuth {
    fn header(&self) -> Header { Header::new("Authorization", self.value.clone()) }
}
