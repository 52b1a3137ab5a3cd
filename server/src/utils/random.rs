use rand::{distributions::Alphanumeric, Rng};

pub const SLUG_LEN: usize = 10;
pub const TOKEN_LEN: usize = 32;

/// Lowercase alphanumeric slug for public event URLs.
pub fn random_slug() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Mixed-case check-in token printed on a guest's pass.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_shape() {
        let slug = random_slug();
        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_tokens_differ() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert_ne!(a, b);
    }
}
