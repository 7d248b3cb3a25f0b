//! Source fingerprints stored alongside imported resources

use crate::buffer::{BinaryCodec, ByteBuffer};
use crate::error::{Result, TesseraError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

const SCHEME: &str = "sha256:";
const DIGEST_LEN: usize = 32;

/// SHA-256 digest of an imported source file.
///
/// The catalog compares it on re-import and writes it into cache frames,
/// always in its textual `sha256:<64 hex>` form.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ContentHash([u8; DIGEST_LEN]);

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Stream a file through the hasher
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for ContentHash {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || TesseraError::ParseError(format!("bad source hash '{}'", s));
        let hex = s.strip_prefix(SCHEME).ok_or_else(malformed)?.as_bytes();
        if hex.len() != DIGEST_LEN * 2 {
            return Err(malformed());
        }

        let mut digest = [0u8; DIGEST_LEN];
        for (byte, pair) in digest.iter_mut().zip(hex.chunks_exact(2)) {
            let hi = nibble(pair[0]).ok_or_else(malformed)?;
            let lo = nibble(pair[1]).ok_or_else(malformed)?;
            *byte = hi << 4 | lo;
        }
        Ok(Self(digest))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SCHEME)?;
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.0[..6].iter().map(|b| format!("{:02x}", b)).collect();
        write!(f, "ContentHash({}..)", short)
    }
}

impl BinaryCodec for ContentHash {
    fn encode(&self, buffer: &mut ByteBuffer) {
        buffer.write_str(&self.to_string());
    }

    fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
        buffer.read::<String>()?.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_changes_fingerprint() {
        let before = ContentHash::of(b"v 0 0 0\n");
        assert_eq!(before, ContentHash::of(b"v 0 0 0\n"));
        assert_ne!(before, ContentHash::of(b"v 0 0 1\n"));
    }

    #[test]
    fn test_textual_form() {
        let text = ContentHash::of(b"").to_string();
        assert_eq!(
            text,
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(text.parse::<ContentHash>().unwrap(), ContentHash::of(b""));
        assert_eq!(
            text.to_uppercase().replacen("SHA256:", "sha256:", 1).parse::<ContentHash>().unwrap(),
            ContentHash::of(b"")
        );
    }

    #[test]
    fn test_rejects_malformed_text() {
        let not_hex = format!("sha256:{}", "zz".repeat(32));
        for bad in ["md5:abc", "sha256:tooshort", "e3b0c442", not_hex.as_str()] {
            assert!(matches!(bad.parse::<ContentHash>(), Err(TesseraError::ParseError(_))));
        }
    }

    #[test]
    fn test_travels_through_buffer() {
        let hash = ContentHash::of(b"void main() {}");
        let mut buffer = ByteBuffer::new();
        buffer.write(&hash);
        assert_eq!(buffer.read::<ContentHash>().unwrap(), hash);

        let mut garbage = ByteBuffer::new();
        garbage.write_str("sha256:nope");
        assert!(garbage.read::<ContentHash>().is_err());
    }

    #[test]
    fn test_from_file_streams_contents() {
        let path = std::env::temp_dir().join(format!("tessera_hash_{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, vec![7u8; 100_000]).unwrap();
        assert_eq!(ContentHash::from_file(&path).unwrap(), ContentHash::of(&[7u8; 100_000]));
        std::fs::remove_file(&path).ok();
        assert!(ContentHash::from_file(&path).is_err());
    }
}
