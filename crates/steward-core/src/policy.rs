//! Compliance checkers and policy decorators
//!
//! A [`ComplianceChecker`] decides whether a bucket already matches policy;
//! a [`PolicyDecorator`] produces the metadata the bucket should have. Both
//! are plain strategy values, and closures of the right shape implement them.

use crate::metadata::{BucketSnapshot, Lifecycle, LifecycleRule, RuleCondition, DELETE_ACTION};

/// Verdict of a [`ComplianceChecker`], carrying the inspected snapshot
#[derive(Clone, Debug, PartialEq)]
pub enum Compliance {
    /// Bucket already satisfies the policy
    Compliant(BucketSnapshot),
    /// Bucket must be decorated and updated
    NonCompliant(BucketSnapshot),
}

impl Compliance {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant(_))
    }

    /// Take the snapshot back out of the verdict
    pub fn into_snapshot(self) -> BucketSnapshot {
        match self {
            Self::Compliant(s) | Self::NonCompliant(s) => s,
        }
    }
}

/// Decides whether a bucket matches policy; must not alter the snapshot
pub trait ComplianceChecker: Send + Sync {
    fn check(&self, snapshot: BucketSnapshot) -> Compliance;
}

impl<F> ComplianceChecker for F
where
    F: Fn(BucketSnapshot) -> Compliance + Send + Sync,
{
    fn check(&self, snapshot: BucketSnapshot) -> Compliance {
        self(snapshot)
    }
}

/// Maps current (or default) bucket metadata to the desired metadata
///
/// Implementations must be deterministic and free of side effects.
pub trait PolicyDecorator: Send + Sync {
    fn decorate(&self, snapshot: BucketSnapshot) -> BucketSnapshot;
}

impl<F> PolicyDecorator for F
where
    F: Fn(BucketSnapshot) -> BucketSnapshot + Send + Sync,
{
    fn decorate(&self, snapshot: BucketSnapshot) -> BucketSnapshot {
        self(snapshot)
    }
}

/// Objects in the bucket are deleted once they are `days` old
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiringLifecycle {
    days: u32,
}

impl ExpiringLifecycle {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Time-to-live in days
    pub fn days(&self) -> u32 {
        self.days
    }

    fn rule_matches(&self, rule: &LifecycleRule) -> bool {
        let age_only = RuleCondition {
            age: Some(self.days),
            ..Default::default()
        };
        rule.action.action_type == DELETE_ACTION && rule.condition == age_only
    }
}

impl ComplianceChecker for ExpiringLifecycle {
    fn check(&self, snapshot: BucketSnapshot) -> Compliance {
        let compliant = match snapshot.lifecycle.rule.as_slice() {
            [rule] => self.rule_matches(rule),
            _ => false,
        };

        if compliant {
            Compliance::Compliant(snapshot)
        } else {
            Compliance::NonCompliant(snapshot)
        }
    }
}

impl PolicyDecorator for ExpiringLifecycle {
    fn decorate(&self, snapshot: BucketSnapshot) -> BucketSnapshot {
        snapshot.with_lifecycle(Lifecycle::new(vec![LifecycleRule::delete_after_days(self.days)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RuleAction;

    fn bucket_with(rules: Vec<LifecycleRule>) -> BucketSnapshot {
        BucketSnapshot::named("ci-artifacts")
            .with_label("team", "build")
            .with_lifecycle(Lifecycle::new(rules))
    }

    #[test]
    fn test_expiring_compliance() {
        let policy = ExpiringLifecycle::new(30);

        assert!(policy.check(bucket_with(vec![LifecycleRule::delete_after_days(30)])).is_compliant());
        assert!(!policy.check(bucket_with(vec![])).is_compliant());
        assert!(!policy.check(bucket_with(vec![LifecycleRule::delete_after_days(7)])).is_compliant());
        assert!(!policy
            .check(bucket_with(vec![
                LifecycleRule::delete_after_days(30),
                LifecycleRule::delete_after_days(30),
            ]))
            .is_compliant());

        let archive = LifecycleRule {
            action: RuleAction::set_storage_class("NEARLINE"),
            condition: RuleCondition {
                age: Some(30),
                ..Default::default()
            },
        };
        assert!(!policy.check(bucket_with(vec![archive])).is_compliant());

        let mut extra_condition = LifecycleRule::delete_after_days(30);
        extra_condition.condition.is_live = Some(false);
        assert!(!policy.check(bucket_with(vec![extra_condition])).is_compliant());
    }

    #[test]
    fn test_check_returns_snapshot_untouched() {
        let snapshot = bucket_with(vec![LifecycleRule::delete_after_days(3)]);
        let verdict = ExpiringLifecycle::new(30).check(snapshot.clone());
        assert_eq!(verdict, Compliance::NonCompliant(snapshot));
    }

    #[test]
    fn test_expiring_decorator_only_touches_lifecycle() {
        let policy = ExpiringLifecycle::new(14);
        let before = bucket_with(vec![LifecycleRule::delete_after_days(3), LifecycleRule::delete_after_days(9)]);

        let after = policy.decorate(before.clone());
        assert_eq!(after.lifecycle.rule, vec![LifecycleRule::delete_after_days(14)]);
        assert_eq!(after.labels, before.labels);
        assert_eq!(after.name, before.name);
        assert!(policy.check(after).is_compliant());
    }

    #[test]
    fn test_closures_as_strategies() {
        let checker = |s: BucketSnapshot| {
            if s.labels.contains_key("team") {
                Compliance::Compliant(s)
            } else {
                Compliance::NonCompliant(s)
            }
        };
        let decorator = |s: BucketSnapshot| s.with_label("team", "build");

        let bare = BucketSnapshot::named("ci-artifacts");
        assert!(!checker.check(bare.clone()).is_compliant());
        assert!(checker.check(decorator.decorate(bare)).is_compliant());
    }
}
