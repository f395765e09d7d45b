use crate::core::routine::job::Job;
use std::collections::HashSet;

/// Represents an issue found while validating a composite unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A hard error: the job cannot be ordered or dispatched as declared.
    Error(String),
    /// A warning: the job can run, but some child will likely fail.
    Warning(String),
}

/// The result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Error(msg.into()));
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Warning(msg.into()));
    }

    pub fn is_safe(&self) -> bool {
        !self.issues.iter().any(|i| matches!(i, ValidationIssue::Error(_)))
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| matches!(i, ValidationIssue::Warning(_)))
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().filter_map(|i| match i {
            ValidationIssue::Error(msg) => Some(msg.as_str()),
            ValidationIssue::Warning(_) => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().filter_map(|i| match i {
            ValidationIssue::Warning(msg) => Some(msg.as_str()),
            ValidationIssue::Error(_) => None,
        })
    }

    /// Logs every issue through the `log` facade.
    pub fn log_summary(&self) {
        if self.is_safe() && !self.has_warnings() {
            log::debug!("Job validation passed");
            return;
        }

        for issue in &self.issues {
            match issue {
                ValidationIssue::Error(msg) => log::error!("Validation error: {}", msg),
                ValidationIssue::Warning(msg) => log::warn!("Validation warning: {}", msg),
            }
        }
    }
}

/// Checks that a job's children and dependency edges are consistent.
pub fn validate_job(job: &Job) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut names = HashSet::new();

    for child in job.children() {
        if !names.insert(child.name()) {
            result.add_error(format!(
                "Job '{}' has more than one child named '{}'.",
                job.core.name,
                child.name()
            ));
        }
        if let Some(sig) = child.process_signature() {
            if sig.is_remote() && !sig.is_selectable() {
                result.add_warning(format!(
                    "Child '{}' of job '{}' has a signature without an operation: {}",
                    child.name(),
                    job.core.name,
                    sig
                ));
            }
        }
    }

    let mut edges = HashSet::new();
    for dep in job.dependencies() {
        if dep.consumer == dep.producer {
            result.add_error(format!(
                "Child '{}' of job '{}' depends on itself.",
                dep.consumer, job.core.name
            ));
        }
        if !edges.insert((dep.consumer.as_str(), dep.producer.as_str())) {
            result.add_warning(format!(
                "Dependency '{}' -> '{}' of job '{}' is declared twice.",
                dep.producer, dep.consumer, job.core.name
            ));
        }
        for end in [&dep.consumer, &dep.producer] {
            if !names.contains(end.as_str()) {
                result.add_error(format!(
                    "Dependency '{}' -> '{}' of job '{}' names unknown child '{}'.",
                    dep.producer, dep.consumer, job.core.name, end
                ));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routine::task::Task;
    use crate::core::signature::Signature;

    #[test]
    fn test_valid_job() {
        let job = Job::new("j")
            .with_child(Task::new("a", Signature::net("a", "A")))
            .with_child(Task::new("b", Signature::net("b", "B")))
            .with_dependency("b", "a");
        let result = validate_job(&job);
        assert!(result.is_safe());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_duplicate_and_unknown_names_are_errors() {
        let job = Job::new("j")
            .with_child(Task::new("a", Signature::net("a", "A")))
            .with_child(Task::new("a", Signature::net("a", "A")))
            .with_dependency("ghost", "a");
        let result = validate_job(&job);
        assert!(!result.is_safe());
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_self_dependency_is_an_error_and_repeats_warn() {
        let job = Job::new("j")
            .with_child(Task::new("a", Signature::net("a", "A")))
            .with_child(Task::new("b", Signature::net("b", "B")))
            .with_dependency("a", "a")
            .with_dependency("b", "a")
            .with_dependency("b", "a");
        let result = validate_job(&job);
        assert_eq!(result.errors().collect::<Vec<_>>(), vec!["Child 'a' of job 'j' depends on itself."]);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_unselectable_child_is_a_warning() {
        let job = Job::new("j").with_child(Task::new("a", Signature::net("", "A")));
        let result = validate_job(&job);
        assert!(result.is_safe());
        assert!(result.has_warnings());
    }
}
