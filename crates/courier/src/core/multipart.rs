use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated multipart boundary tokens.
pub const BOUNDARY_LEN: usize = 8;

/// Generate a random alphanumeric boundary token.
pub fn generate_boundary() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LEN)
        .map(char::from)
        .collect()
}

/// A complete form-field part, including its trailing CRLF.
pub fn field_part(boundary: &str, name: &str, value: &str) -> String {
    format!("--{boundary}\r\ncontent-disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

/// Everything of a file part that precedes the file bytes.
pub fn file_part_head(boundary: &str, name: &str, file_name: &str, content_type: &str) -> String {
    format!(
        "--{boundary}\r\ncontent-disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
}

/// The closing delimiter written once after the last part.
pub fn closing_boundary(boundary: &str) -> String { format!("--{boundary}--\r\n") }

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_boundary_shape() {
        let boundary = generate_boundary();
        assert_eq!(boundary.len(), BOUNDARY_LEN);
        assert!(boundary.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_consecutive_boundaries_differ() {
        let mut previous = generate_boundary();
        for _ in 0..1000 {
            let next = generate_boundary();
            assert_ne!(previous, next);
            previous = next;
        }
    }

    #[test]
    fn test_boundaries_rarely_collide() {
        let seen: HashSet<String> = (0..1000).map(|_| generate_boundary()).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_field_part() {
        assert_eq!(
            field_part("XyZ12345", "k", "v"),
            "--XyZ12345\r\ncontent-disposition: form-data; name=\"k\"\r\n\r\nv\r\n"
        );
    }

    #[test]
    fn test_file_part_head() {
        assert_eq!(
            file_part_head("b", "upload", "a.txt", "text/plain"),
            "--b\r\ncontent-disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\n"
        );
    }

    #[test]
    fn test_closing_boundary() {
        assert_eq!(closing_boundary("b"), "--b--\r\n");
    }
}
