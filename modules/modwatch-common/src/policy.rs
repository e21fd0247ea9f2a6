use crate::types::Severity;

/// Which severity levels an ingestion path may create incidents for.
///
/// The automated pipeline deliberately excludes medium: those go through
/// human triage instead of being persisted unattended. The manual path
/// admits all three. The asymmetry is a business rule, so it lives here
/// as a named policy rather than an inline conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityPolicy {
    name: &'static str,
    allow_medium: bool,
}

impl SeverityPolicy {
    /// Policy for the automated ingestion path: low and high only.
    pub fn automated() -> Self {
        Self {
            name: "automated",
            allow_medium: false,
        }
    }

    /// Policy for the manual/administrative path: all severities.
    pub fn manual() -> Self {
        Self {
            name: "manual",
            allow_medium: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn admits(&self, severity: Severity) -> bool {
        match severity {
            Severity::Medium => self.allow_medium,
            Severity::Low | Severity::High => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automated_path_filters_medium() {
        let policy = SeverityPolicy::automated();
        assert!(policy.admits(Severity::Low));
        assert!(!policy.admits(Severity::Medium));
        assert!(policy.admits(Severity::High));
    }

    #[test]
    fn manual_path_admits_all() {
        let policy = SeverityPolicy::manual();
        assert!(policy.admits(Severity::Low));
        assert!(policy.admits(Severity::Medium));
        assert!(policy.admits(Severity::High));
    }
}
