//! Content fingerprinting for cache keys.
//!
//! xxHash3 is not cryptographic but is fast and collision-resistant enough for
//! content-addressed cache keys; the two cache scopes live in separate stores,
//! so their key spaces cannot collide even for equal digests.

use std::path::Path;

use tokio::io::AsyncReadExt;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

const READ_CHUNK: usize = 8192;

/// Fingerprint a whole media file together with the target language.
///
/// The digest is streamed so large videos are never held in memory. The
/// target language is folded in because a cached job result is only valid for
/// the language it was translated into.
pub async fn media_fingerprint(
    path: &Path,
    target_language: &str,
) -> Result<String, std::io::Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Xxh3::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    hasher.update(&[0xff]);
    hasher.update(target_language.as_bytes());
    Ok(format!("{:016x}", hasher.digest()))
}

/// Fingerprint one text segment for the segment-translation cache.
/// Key is over (text, target language) so the same line translated into two
/// languages occupies two entries.
pub fn segment_fingerprint(text: &str, target_language: &str) -> String {
    let mut input = Vec::with_capacity(text.len() + target_language.len() + 1);
    input.extend_from_slice(text.as_bytes());
    input.push(0xff);
    input.extend_from_slice(target_language.as_bytes());
    format!("{:016x}", xxh3_64(&input))
}
