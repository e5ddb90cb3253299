use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::{encode_component, flatten};
use crate::error::Result;

/// An immutable header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name:  String,
    value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name:  name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn value(&self) -> &str { &self.value }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool { self.name.eq_ignore_ascii_case(name) }

    pub fn into_parts(self) -> (String, String) { (self.name, self.value) }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}: {}", self.name, self.value) }
}

/// An ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, header: Header) { self.0.push(header); }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> { self.0.iter().find(|h| h.is(name)).map(Header::value) }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |h| h.is(name)).map(Header::value)
    }

    pub fn contains(&self, name: &str) -> bool { self.0.iter().any(|h| h.is(name)) }

    /// Remove every header called `name`.
    pub fn remove(&mut self, name: &str) { self.0.retain(|h| !h.is(name)); }

    /// The parsed `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> { self.get("content-length")?.trim().parse().ok() }

    pub fn iter(&self) -> impl Iterator<Item = &Header> { self.0.iter() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl From<Vec<Header>> for Headers {
    fn from(headers: Vec<Header>) -> Self { Self(headers) }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl IntoIterator for Headers {
    type IntoIter = std::vec::IntoIter<Header>;
    type Item = Header;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

/// Produces the header set of a request.
pub trait HeaderProvider: Send + Sync {
    fn headers(&self) -> Vec<Header>;
}

/// Headers from an explicit key/value list.
#[derive(Debug, Clone, Default)]
pub struct MapHeaders {
    headers: Vec<Header>,
}

impl MapHeaders {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: pairs.into_iter().map(|(k, v)| Header::new(k, v)).collect(),
        }
    }
}

impl HeaderProvider for MapHeaders {
    fn headers(&self) -> Vec<Header> { self.headers.clone() }
}

/// Headers taken from the fields of a serializable value.
///
/// Field values are percent-encoded so arbitrary strings stay valid header
/// values.
#[derive(Debug, Clone)]
pub struct ObjectHeaders {
    headers: Vec<Header>,
}

impl ObjectHeaders {
    /// # Errors
    ///
    /// Fails with [`Error::Serialize`](crate::Error::Serialize) if `value` is
    /// not a struct or map.
    pub fn from_serialize<S: Serialize + ?Sized>(value: &S) -> Result<Self> {
        let headers = flatten(value)?
            .into_iter()
            .map(|(name, value)| {
                let encoded = encode_component(&value).into_owned();
                Header::new(name, encoded)
            })
            .collect();
        Ok(Self { headers })
    }
}

impl HeaderProvider for ObjectHeaders {
    fn headers(&self) -> Vec<Header> { self.headers.clone() }
}

/// Concatenation of several providers, in provider order.
#[derive(Clone, Default)]
pub struct MultiHeaders {
    providers: Vec<Arc<dyn HeaderProvider>>,
}

impl MultiHeaders {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn with_arc(mut self, provider: Arc<dyn HeaderProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

impl fmt::Debug for MultiHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiHeaders")
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl HeaderProvider for MultiHeaders {
    fn headers(&self) -> Vec<Header> { self.providers.iter().flat_map(|p| p.headers()).collect() }
}
