//! Cookie persistence shared between requests.
//!
//! Every client resolves a [`CookieStore`] at execution time: its own if one
//! was configured, otherwise the process-wide store returned by [`global`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::core::{domain_matches, parse_set_cookie};

/// Host-scoped cookie storage.
///
/// Implementations must be safe to share between concurrently running
/// requests.
pub trait CookieStore: Send + Sync {
    /// Store a cookie that only applies to `host` itself.
    fn insert(&self, host: &str, name: &str, value: &str);

    /// Apply a `Set-Cookie` header received from `host`.
    fn store_response(&self, host: &str, set_cookie: &str);

    /// The `Cookie` header value for a request to `host`, if any cookie
    /// applies.
    fn cookie_header(&self, host: &str) -> Option<String>;

    fn clear(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    name:      String,
    value:     String,
    domain:    String,
    host_only: bool,
}

impl StoredCookie {
    fn applies_to(&self, host: &str) -> bool {
        if self.host_only {
            self.domain.eq_ignore_ascii_case(host)
        } else {
            domain_matches(host, &self.domain)
        }
    }

    fn same_slot(&self, other: &StoredCookie) -> bool { self.name == other.name && self.domain == other.domain }
}

/// In-memory [`CookieStore`] keeping cookies in insertion order.
///
/// A `Domain` attribute is honored only when the responding host falls
/// under it; cookies without one are host-only. `Max-Age` of zero or less
/// removes the cookie. Other attributes are ignored.
///
/// # Examples
///
/// ```
/// use courier::cookies::{CookieJar, CookieStore};
///
/// let jar = CookieJar::new();
/// jar.store_response("api.example.com", "session=abc; Domain=example.com");
/// assert_eq!(jar.cookie_header("www.example.com").as_deref(), Some("session=abc"));
/// assert_eq!(jar.cookie_header("example.org"), None);
/// ```
#[derive(Default)]
pub struct CookieJar {
    cookies: Mutex<Vec<StoredCookie>>,
}

impl CookieJar {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredCookie>> { self.cookies.lock().unwrap_or_else(PoisonError::into_inner) }

    fn upsert(&self, cookie: StoredCookie) {
        let mut cookies = self.lock();
        match cookies.iter_mut().find(|c| c.same_slot(&cookie)) {
            Some(existing) => *existing = cookie,
            None => cookies.push(cookie),
        }
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("CookieJar").field("len", &self.len()).finish() }
}

impl CookieStore for CookieJar {
    fn insert(&self, host: &str, name: &str, value: &str) {
        self.upsert(StoredCookie {
            name:      name.to_string(),
            value:     value.to_string(),
            domain:    host.to_ascii_lowercase(),
            host_only: true,
        });
    }

    fn store_response(&self, host: &str, set_cookie: &str) {
        let Some(parsed) = parse_set_cookie(set_cookie) else {
            tracing::debug!(host, "ignoring malformed set-cookie header");
            return;
        };

        let (domain, host_only) = match parsed.domain {
            Some(ref domain) if domain_matches(host, domain) => (domain.clone(), false),
            Some(ref domain) => {
                tracing::debug!(host, domain = %domain, cookie = %parsed.name, "rejecting cookie for foreign domain");
                return;
            }
            None => (host.to_ascii_lowercase(), true),
        };

        let cookie = StoredCookie {
            name: parsed.name.clone(),
            value: parsed.value.clone(),
            domain,
            host_only,
        };

        if parsed.is_removal() {
            self.lock().retain(|c| !c.same_slot(&cookie));
        } else {
            self.upsert(cookie);
        }
    }

    fn cookie_header(&self, host: &str) -> Option<String> {
        let header = self
            .lock()
            .iter()
            .filter(|c| c.applies_to(host))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }

    fn clear(&self) { self.lock().clear(); }
}

static GLOBAL: Lazy<RwLock<Arc<dyn CookieStore>>> = Lazy::new(|| RwLock::new(Arc::new(CookieJar::new())));

/// The process-wide store used by clients without their own.
pub fn global() -> Arc<dyn CookieStore> { Arc::clone(&GLOBAL.read().unwrap_or_else(PoisonError::into_inner)) }

/// Replace the process-wide store, returning the previous one.
///
/// Requests already executing keep the store they resolved at start.
pub fn set_global(store: Arc<dyn CookieStore>) -> Arc<dyn CookieStore> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, store)
}
