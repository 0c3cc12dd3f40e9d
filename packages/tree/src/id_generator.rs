use uuid::Uuid;

/// Random per-generator suffix: six hex digits of a v4 UUID
pub fn session_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Sequential ID generator for canvas elements
///
/// Produces `{prefix}-{count}-{suffix}`. The counter makes ids unique
/// within a session; the random suffix keeps sessions from colliding with
/// ids assigned by an earlier session and persisted by the host.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    suffix: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_parts(prefix, session_suffix())
    }

    pub fn from_parts(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn next_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}-{}", self.prefix, self.count, self.suffix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of ids handed out so far
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::from_parts("el", "f00d42");

        assert_eq!(gen.next_id(), "el-1-f00d42");
        assert_eq!(gen.next_id(), "el-2-f00d42");
        assert_eq!(gen.count(), 2);
    }

    #[test]
    fn test_suffix_differs_between_sessions() {
        let a = IdGenerator::new("el");
        let b = IdGenerator::new("el");

        assert_eq!(a.suffix().len(), 6);
        assert_ne!(a.suffix(), b.suffix());
    }
}
