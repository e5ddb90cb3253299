use std::time::Duration;

/// Transport-level configuration for [`ReqwestTransport`](crate::ReqwestTransport).
///
/// # Examples
///
/// ```
/// use courier::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::default()
///     .user_agent("my-app/1.0")
///     .connect_timeout(Duration::from_secs(3))
///     .max_redirects(0);
/// assert_eq!(options.max_redirects, 0);
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `User-Agent` sent with every request.
    ///
    /// Default: `courier/<version>`
    pub user_agent: String,

    /// Limit for establishing a connection.
    ///
    /// Default: 30s
    pub connect_timeout: Duration,

    /// Default whole-request timeout; per-request timeouts override it.
    ///
    /// Default: None
    pub timeout: Option<Duration>,

    /// Maximum redirects followed; 0 disables following.
    ///
    /// Default: 10
    pub max_redirects: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent:      concat!("courier/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(30),
            timeout:         None,
            max_redirects:   10,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}
