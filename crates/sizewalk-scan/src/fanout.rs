//! Bounded fan-out over a list of subdirectories.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::gate::AdmissionGate;

/// Runs one task per path in parallel and joins on all of them.
///
/// Each task has two steps. The `read` step runs while holding a permit
/// from the shared [`AdmissionGate`]; the `then` step runs after the permit
/// is released, so it may fan out again without holding up other tasks.
/// Nested fan-outs therefore share one cap on in-flight reads instead of
/// each level adding its own.
pub struct FanOut<'g> {
    gate: &'g AdmissionGate,
}

impl<'g> FanOut<'g> {
    /// Create a fan-out admitting tasks through `gate`.
    pub fn new(gate: &'g AdmissionGate) -> Self {
        Self { gate }
    }

    /// Run every task to completion and return the surviving results.
    ///
    /// Results come back in the order of `paths`, whatever order the tasks
    /// finished in. Tasks returning `None` are compacted out.
    pub fn run<R, T, Read, Then>(&self, paths: &[PathBuf], read: Read, then: Then) -> Vec<T>
    where
        R: Send,
        T: Send,
        Read: Fn(&Path) -> R + Sync,
        Then: Fn(&Path, R) -> Option<T> + Sync,
    {
        // Each task owns the slot at its own index; collect preserves order.
        let slots: Vec<Option<T>> = paths
            .par_iter()
            .map(|path| {
                let staged = {
                    let _permit = self.gate.acquire();
                    read(path)
                };
                then(path, staged)
            })
            .collect();

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/p/{i}"))).collect()
    }

    #[test]
    fn test_results_follow_input_order() {
        let gate = AdmissionGate::new(4);
        let input = paths(20);

        // Later paths finish first
        let out = FanOut::new(&gate).run(
            &input,
            |p| {
                let i: u64 = p.file_name().unwrap().to_str().unwrap().parse().unwrap();
                thread::sleep(Duration::from_millis(20 - i));
                i
            },
            |_, i| Some(i),
        );

        assert_eq!(out, (0..20).collect::<Vec<u64>>());
    }

    #[test]
    fn test_absent_results_are_compacted() {
        let gate = AdmissionGate::new(3);
        let input = paths(10);

        let out = FanOut::new(&gate).run(
            &input,
            |p| p.to_path_buf(),
            |_, p| {
                let i: usize = p.file_name()?.to_str()?.parse().ok()?;
                (i % 3 == 0).then_some(i)
            },
        );

        assert_eq!(out, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_reads_are_capped_by_gate() {
        let gate = AdmissionGate::new(2);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let out = FanOut::new(&gate).run(
            &paths(16),
            |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
            },
            |_, ()| Some(()),
        );

        assert_eq!(out.len(), 16);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_empty_input() {
        let gate = AdmissionGate::new(1);
        let out: Vec<()> = FanOut::new(&gate).run(&[], |_| (), |_, ()| Some(()));
        assert!(out.is_empty());
    }
}
