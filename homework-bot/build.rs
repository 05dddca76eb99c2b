//! Build metadata behind `get_bot_version`.

const GIT_HASH_VAR: &str = "HOMEWORK_BOT_GIT_HASH";
const SHORT_HASH_LEN: usize = 8;

/// Normalised short form of a pinned commit hash, if it looks like one.
fn short_hash(raw: &str) -> Option<String> {
    let hash = raw.trim();
    if hash.len() < 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash[..hash.len().min(SHORT_HASH_LEN)].to_ascii_lowercase())
}

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Deployments without a .git directory can pin the commit instead
    println!("cargo:rerun-if-env-changed={}", GIT_HASH_VAR);
    if let Ok(raw) = std::env::var(GIT_HASH_VAR) {
        match short_hash(&raw) {
            Some(hash) => println!("cargo:rustc-env={}={}", GIT_HASH_VAR, hash),
            None => println!(
                "cargo:warning=ignoring {}={:?}: not a commit hash",
                GIT_HASH_VAR, raw
            ),
        }
    }
}
