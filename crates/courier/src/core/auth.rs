use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Build the value of a `Basic` `Authorization` header.
///
/// # Examples
///
/// ```
/// use courier::core::basic_credentials;
///
/// assert_eq!(basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
/// ```
pub fn basic_credentials(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
