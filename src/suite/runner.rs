//! Suite scheduling and reporting
//!
//! Leaves are flattened together with the hook chain of their ancestors and
//! executed with bounded concurrency on the current task. Leaves of one suite
//! share its live context, so they run one at a time; concurrency applies
//! across suites. A failing leaf never stops its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::common::Error;
use crate::context::ContextSnapshot;

use super::{Group, LeafBody, LeafHooks};

/// Outcome of a leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

/// Result of a single leaf
#[derive(Debug, Clone)]
pub struct LeafReport {
    /// Group labels from the suite root down to the leaf label
    pub path: Vec<String>,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl LeafReport {
    pub fn name(&self) -> String {
        self.path.join(" / ")
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub leaves: Vec<LeafReport>,
    pub duration: Duration,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.leaves.iter().filter(|l| l.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.leaves.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Print the failure list and totals
    pub fn print_summary(&self) {
        let failures: Vec<_> = self.leaves.iter().filter(|l| !l.passed()).collect();
        if !failures.is_empty() {
            println!("\n{}", "Failures:".red().bold());
            for leaf in failures {
                if let Outcome::Failed(reason) = &leaf.outcome {
                    println!("  {} {}", "✗".red(), leaf.name());
                    println!("    {}", reason.dimmed());
                }
            }
        }

        let totals = format!(
            "{} passed, {} failed, {} total in {:.2?}",
            self.passed(),
            self.failed(),
            self.leaves.len(),
            self.duration
        );
        if self.is_success() {
            println!("\n{} {}\n", "✓".green().bold(), totals.green().bold());
        } else {
            println!("\n{} {}\n", "✗".red().bold(), totals.red().bold());
        }
    }
}

/// A leaf together with the hooks of every ancestor group
struct Scheduled {
    path: Vec<String>,
    hooks: Vec<Arc<dyn LeafHooks>>,
    body: LeafBody,
    /// Held from the first pre-leaf hook to the last post-leaf hook
    suite_lock: Arc<Mutex<()>>,
}

/// Executes suites
pub struct Runner {
    parallelism: usize,
    print_progress: bool,
}

impl Runner {
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
            print_progress: false,
        }
    }

    /// Print a line per finished leaf
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.print_progress = enabled;
        self
    }

    /// Run every leaf of every suite
    pub async fn run(&self, suites: &[Group]) -> RunReport {
        let started = Instant::now();

        let mut scheduled = Vec::new();
        for suite in suites {
            let suite_lock = Arc::new(Mutex::new(()));
            flatten(
                suite,
                &suite_lock,
                &mut Vec::new(),
                &mut Vec::new(),
                &mut scheduled,
            );
        }
        tracing::info!(
            "Running {} leaves from {} suites (parallelism {})",
            scheduled.len(),
            suites.len(),
            self.parallelism
        );

        let mut results = stream::iter(scheduled)
            .map(run_leaf)
            .buffer_unordered(self.parallelism);

        let mut leaves = Vec::new();
        while let Some(report) = results.next().await {
            if self.print_progress {
                match &report.outcome {
                    Outcome::Passed => println!("  {} {}", "✓".green(), report.name()),
                    Outcome::Failed(_) => println!("  {} {}", "✗".red(), report.name()),
                }
            }
            leaves.push(report);
        }

        RunReport {
            leaves,
            duration: started.elapsed(),
        }
    }
}

fn flatten(
    group: &Group,
    suite_lock: &Arc<Mutex<()>>,
    path: &mut Vec<String>,
    hooks: &mut Vec<Arc<dyn LeafHooks>>,
    out: &mut Vec<Scheduled>,
) {
    path.push(group.label.clone());
    let pushed_hooks = match &group.hooks {
        Some(h) => {
            hooks.push(h.clone());
            true
        }
        None => false,
    };

    for child in &group.groups {
        flatten(child, suite_lock, path, hooks, out);
    }
    for leaf in &group.leaves {
        let mut leaf_path = path.clone();
        leaf_path.push(leaf.label.clone());
        out.push(Scheduled {
            path: leaf_path,
            hooks: hooks.clone(),
            body: leaf.body.clone(),
            suite_lock: suite_lock.clone(),
        });
    }

    if pushed_hooks {
        hooks.pop();
    }
    path.pop();
}

async fn run_leaf(leaf: Scheduled) -> LeafReport {
    let _suite = leaf.suite_lock.lock().await;
    let started = Instant::now();
    let name = leaf.path.join(" / ");
    tracing::info!("LEAF {}", name);

    let mut failure: Option<Error> = None;
    let mut snapshots: Vec<Option<ContextSnapshot>> = Vec::with_capacity(leaf.hooks.len());

    for hooks in &leaf.hooks {
        match hooks.before_leaf().await {
            Ok(snapshot) => snapshots.push(Some(snapshot)),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if failure.is_none() {
        if let Err(e) = (leaf.body)().await {
            failure = Some(e);
        }
    }

    // Every ancestor finishes the leaf, even those whose pre-leaf hook never ran
    for (i, hooks) in leaf.hooks.iter().enumerate().rev() {
        let snapshot = snapshots.get_mut(i).and_then(Option::take);
        if let Err(e) = hooks.after_leaf(snapshot).await {
            match failure {
                None => failure = Some(e),
                Some(_) => tracing::warn!("{}: additional failure: {}", name, e),
            }
        }
    }

    let outcome = match failure {
        None => Outcome::Passed,
        Some(e) => {
            tracing::warn!("{} failed: {}", name, e);
            Outcome::Failed(e.to_string())
        }
    };

    LeafReport {
        path: leaf.path,
        outcome,
        duration: started.elapsed(),
    }
}
