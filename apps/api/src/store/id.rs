use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

/// Length of every artifact id, in characters.
pub const ARTIFACT_ID_LEN: usize = 32;

/// Opaque download token. 122 bits from the OS CSPRNG (UUID v4), rendered as
/// 32 lowercase hex characters. It is the only access control on the download
/// endpoint, so it is never derived from user or request data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn generate() -> Self {
        ArtifactId(Uuid::new_v4().simple().to_string())
    }

    /// Accepts only well-formed ids: exactly 32 lowercase hex characters.
    /// Anything else cannot name a stored artifact (and never reaches a
    /// backend, so it cannot smuggle in path separators).
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == ARTIFACT_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| ArtifactId(raw.to_string()))
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pluggable id source; production always uses [`ArtifactId::generate`].
pub type IdGenerator = Arc<dyn Fn() -> ArtifactId + Send + Sync>;

pub fn default_id_generator() -> IdGenerator {
    Arc::new(ArtifactId::generate)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_ids_have_fixed_length_and_parse() {
        let id = ArtifactId::generate();
        assert_eq!(id.as_str().len(), ARTIFACT_ID_LEN);
        assert_eq!(ArtifactId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn test_generated_ids_do_not_repeat() {
        let ids: HashSet<_> = (0..10_000).map(|_| ArtifactId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert!(ArtifactId::parse("").is_none());
        assert!(ArtifactId::parse("../../etc/passwd").is_none());
        assert!(ArtifactId::parse(&"A".repeat(ARTIFACT_ID_LEN)).is_none());
        assert!(ArtifactId::parse(&"a".repeat(ARTIFACT_ID_LEN + 1)).is_none());
        assert!(ArtifactId::parse("resume_1_1700000000000.pdf").is_none());
    }
}
