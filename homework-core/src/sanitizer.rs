//! Secret redaction for text bound for logs or chat.

/// Placeholder substituted for every secret occurrence.
pub const REDACTED: &str = "[REDACTED]";

/// Secrets shorter than this are not redacted.
const MIN_SECRET_LEN: usize = 4;

/// Scrubs known secrets (API tokens) out of text headed for logs or chat.
#[derive(Clone, Default)]
pub struct Sanitizer {
    secrets: Vec<String>,
}

impl Sanitizer {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut secrets: Vec<String> = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s| s.len() >= MIN_SECRET_LEN)
            .collect();
        // Longest first so a secret containing another is replaced whole
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        Self { secrets }
    }

    pub fn sanitize(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret, REDACTED))
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
