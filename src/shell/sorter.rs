use crate::core::error::DispatchError;
use crate::core::routine::job::Job;
use crate::core::validation::validate_job;
use std::collections::{BTreeSet, HashMap};

/// Reorders the children of `job` so every producer precedes its consumers.
///
/// Kahn's algorithm, always taking the ready child that was declared first, so
/// unrelated children keep their relative order. Cycles and dependencies on unknown
/// children are configuration errors.
pub fn sort_job(job: &mut Job) -> Result<(), DispatchError> {
    let validation = validate_job(job);
    if !validation.is_safe() {
        validation.log_summary();
        return Err(DispatchError::Configuration(
            validation.errors().collect::<Vec<_>>().join(" "),
        ));
    }
    if job.dependencies.is_empty() {
        return Ok(());
    }

    let index: HashMap<&str, usize> = job
        .children
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name(), i))
        .collect();

    let n = job.children.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for dep in &job.dependencies {
        // validated above
        let (Some(&consumer), Some(&producer)) = (
            index.get(dep.consumer.as_str()),
            index.get(dep.producer.as_str()),
        ) else {
            continue;
        };
        dependents[producer].push(consumer);
        in_degree[consumer] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != n {
        let cycle_members: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d > 0)
            .map(|(i, _)| job.children[i].name())
            .collect();
        return Err(DispatchError::Configuration(format!(
            "cyclic dependency in job '{}' among: {}",
            job.core.name,
            cycle_members.join(", ")
        )));
    }

    let mut slots: Vec<_> = std::mem::take(&mut job.children)
        .into_iter()
        .map(Some)
        .collect();
    job.children = order.into_iter().filter_map(|i| slots[i].take()).collect();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routine::task::Task;
    use crate::core::signature::Signature;

    fn task(name: &str) -> Task {
        Task::new(name, Signature::net(name, "Worker"))
    }

    fn names(job: &Job) -> Vec<&str> {
        job.children().iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_producers_precede_consumers() {
        let mut job = Job::new("j")
            .with_child(task("c"))
            .with_child(task("b"))
            .with_child(task("a"))
            .with_dependency("c", "b")
            .with_dependency("b", "a");
        sort_job(&mut job).unwrap();
        assert_eq!(names(&job), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unrelated_children_keep_declared_order() {
        let mut job = Job::new("j")
            .with_child(task("x"))
            .with_child(task("consumer"))
            .with_child(task("y"))
            .with_child(task("producer"))
            .with_dependency("consumer", "producer");
        sort_job(&mut job).unwrap();
        assert_eq!(names(&job), vec!["x", "y", "producer", "consumer"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut job = Job::new("j")
            .with_child(task("a"))
            .with_child(task("b"))
            .with_child(task("free"))
            .with_dependency("a", "b")
            .with_dependency("b", "a");
        let err = sort_job(&mut job).unwrap_err();
        match err {
            DispatchError::Configuration(msg) => {
                assert!(msg.contains("a, b"));
                assert!(!msg.contains("free"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_child_is_rejected() {
        let mut job = Job::new("j")
            .with_child(task("a"))
            .with_dependency("a", "ghost");
        assert!(matches!(
            sort_job(&mut job),
            Err(DispatchError::Configuration(_))
        ));
    }
}
