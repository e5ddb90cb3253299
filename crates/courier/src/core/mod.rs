//! Pure transformations used by the providers and the cookie store.
//!
//! Nothing in here performs I/O: header values, form and multipart framing,
//! cookie parsing and object flattening are plain functions of their inputs.

mod auth;
mod cookie;
mod form;
mod multipart;
mod object;

pub use auth::basic_credentials;
pub use cookie::{SetCookie, domain_matches, parse_cookie_pairs, parse_set_cookie};
pub use form::{encode_component, encode_form};
pub use multipart::{BOUNDARY_LEN, closing_boundary, field_part, file_part_head, generate_boundary};
pub use object::flatten;
