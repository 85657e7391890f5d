//! Decision counters aggregated per rule and scope class
//!
//! Architecture: Observer - the collector subscribes to scanner decisions
//! - Counters live behind one mutex keyed by (rule, scope class)
//! - Percentages are integer basis points so the summary never rounds up
//! - Not-applicable outcomes stay out of every bucket

use crate::domain::decision::{Decision, DecisionEvent, DecisionObserver, ScopeClass};
use crate::rules::ModifierRule;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct BucketCounts {
    added: u64,
    already_present: u64,
    skipped: u64,
}

impl BucketCounts {
    fn total(&self) -> u64 {
        self.added + self.already_present + self.skipped
    }

    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::AddModifier => self.added += 1,
            Decision::AlreadyPresent => self.already_present += 1,
            Decision::SkippedAnnotated => self.skipped += 1,
            Decision::NotApplicable => {}
        }
    }
}

/// Thread-safe tally of every observable rule decision
#[derive(Debug, Default)]
pub struct MetricsCollector {
    buckets: Mutex<HashMap<(ModifierRule, ScopeClass), BucketCounts>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, rule: ModifierRule, scope_class: ScopeClass, decision: Decision) {
        if !decision.is_observable() {
            return;
        }
        if let Ok(mut buckets) = self.buckets.lock() {
            buckets.entry((rule, scope_class)).or_default().record(decision);
        }
    }

    /// Counters for one rule, or `None` when it never inspected anything
    pub fn snapshot(&self, rule: ModifierRule) -> Option<RuleMetrics> {
        let buckets = self.buckets.lock().ok()?;
        let counts = buckets.get(&(rule, rule.scope_class())).copied()?;
        if counts.total() == 0 {
            return None;
        }
        Some(RuleMetrics {
            rule,
            inspected: counts.total(),
            added: counts.added,
            already_present: counts.already_present,
            skipped: counts.skipped,
        })
    }

    pub fn snapshot_all(&self, rules: &[ModifierRule]) -> Vec<(ModifierRule, Option<RuleMetrics>)> {
        rules.iter().map(|&rule| (rule, self.snapshot(rule))).collect()
    }
}

impl DecisionObserver for MetricsCollector {
    fn decision(&self, event: &DecisionEvent<'_>) {
        self.record(event.rule, event.scope_class, event.decision);
    }
}

/// Point-in-time counters for one rule with a non-zero inspection count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMetrics {
    pub rule: ModifierRule,
    pub inspected: u64,
    pub added: u64,
    pub already_present: u64,
    pub skipped: u64,
}

impl RuleMetrics {
    pub fn added_share(&self) -> Percentage {
        Percentage::of(self.added, self.inspected)
    }

    pub fn already_present_share(&self) -> Percentage {
        Percentage::of(self.already_present, self.inspected)
    }

    pub fn skipped_share(&self) -> Percentage {
        Percentage::of(self.skipped, self.inspected)
    }
}

/// Two-decimal percentage held as basis points; division floors, so shares
/// never display above their exact value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percentage(u64);

impl Percentage {
    pub fn of(count: u64, total: u64) -> Self {
        debug_assert!(total > 0, "percentage of an empty population");
        if total == 0 {
            return Self(0);
        }
        Self(count.saturating_mul(10_000) / total)
    }

    pub fn basis_points(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format!("{}.{:02}", self.0 / 100, self.0 % 100);
        f.pad(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_even_split_shares() {
        let collector = MetricsCollector::new();
        collector.record(
            ModifierRule::FieldImmutability,
            ScopeClass::Field,
            Decision::AddModifier,
        );
        collector.record(
            ModifierRule::FieldImmutability,
            ScopeClass::Field,
            Decision::AlreadyPresent,
        );

        let metrics = collector.snapshot(ModifierRule::FieldImmutability).unwrap();
        assert_eq!(metrics.inspected, 2);
        assert_eq!(metrics.added_share().to_string(), "50.00");
        assert_eq!(metrics.already_present_share().to_string(), "50.00");
        assert_eq!(metrics.skipped_share().to_string(), "0.00");
    }

    #[test]
    fn test_thirds_floor_instead_of_rounding() {
        assert_eq!(Percentage::of(1, 3).to_string(), "33.33");
        assert_eq!(Percentage::of(2, 3).to_string(), "66.66");
        assert_eq!(Percentage::of(3, 3).to_string(), "100.00");
    }

    #[test]
    fn test_percentage_pads_right_aligned() {
        assert_eq!(format!("{:>6}", Percentage::of(1, 20)), "  5.00");
        assert_eq!(format!("{:>6}", Percentage::of(20, 20)), "100.00");
    }

    #[test]
    fn test_not_applicable_never_counted() {
        let collector = MetricsCollector::new();
        collector.record(
            ModifierRule::MethodAccess,
            ScopeClass::Method,
            Decision::NotApplicable,
        );

        assert!(collector.snapshot(ModifierRule::MethodAccess).is_none());
    }

    #[test]
    fn test_untouched_rule_has_no_snapshot() {
        let collector = MetricsCollector::new();
        assert!(collector.snapshot(ModifierRule::LocalVariableImmutability).is_none());
    }

    #[test]
    fn test_snapshot_all_preserves_rule_order() {
        let collector = MetricsCollector::new();
        collector.record(
            ModifierRule::ParameterImmutability,
            ScopeClass::Parameter,
            Decision::SkippedAnnotated,
        );

        let all = collector.snapshot_all(&ModifierRule::ALL);
        assert_eq!(all.len(), ModifierRule::ALL.len());
        for (position, (rule, _)) in all.iter().enumerate() {
            assert_eq!(*rule, ModifierRule::ALL[position]);
        }
        assert!(all
            .iter()
            .all(|(rule, metrics)| (*rule == ModifierRule::ParameterImmutability)
                == metrics.is_some()));
    }

    #[test]
    fn test_concurrent_recording_loses_nothing() {
        let collector = Arc::new(MetricsCollector::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let collector = collector.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    collector.record(
                        ModifierRule::FieldImmutability,
                        ScopeClass::Field,
                        Decision::AddModifier,
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = collector.snapshot(ModifierRule::FieldImmutability).unwrap();
        assert_eq!(metrics.inspected, 800);
        assert_eq!(metrics.added, 800);
        assert_eq!(metrics.added_share().to_string(), "100.00");
    }
}
