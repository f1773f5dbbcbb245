//! Unit tests for reconcile_helpers module

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use crds::{
        ComponentVersion, OPERATOR_VERSION_NAME, PlatformCondition, VirtPlatform, VirtPlatformSpec,
        VirtPlatformStatus,
    };
    use operands::request::{
        CONDITION_AVAILABLE, CONDITION_DEGRADED, CONDITION_PROGRESSING, CONDITION_RECONCILE_COMPLETE,
    };
    use operands::{ConditionMessage, PassSummary};

    use crate::reconcile_helpers::*;

    fn platform(generation: Option<i64>, status: Option<VirtPlatformStatus>) -> VirtPlatform {
        let mut platform = VirtPlatform::new("virtops", VirtPlatformSpec::default());
        platform.metadata.namespace = Some("virtops".to_string());
        platform.metadata.generation = generation;
        platform.status = status;
        platform
    }

    fn observed(generation: i64) -> VirtPlatformStatus {
        VirtPlatformStatus {
            observed_generation: Some(generation),
            ..Default::default()
        }
    }

    fn with_version(version: &str) -> VirtPlatformStatus {
        VirtPlatformStatus {
            versions: vec![ComponentVersion {
                name: OPERATOR_VERSION_NAME.to_string(),
                version: version.to_string(),
            }],
            ..Default::default()
        }
    }

    fn summary(created: usize, all_upgrade_done: bool) -> PassSummary {
        PassSummary {
            created,
            all_upgrade_done,
            ..Default::default()
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn condition<'a>(status: &'a VirtPlatformStatus, kind: &str) -> &'a PlatformCondition {
        status.conditions.iter().find(|c| c.type_ == kind).unwrap()
    }

    #[test]
    fn test_operator_triggered_on_new_generation() {
        assert!(is_operator_triggered(&platform(Some(2), Some(observed(1)))));
        assert!(is_operator_triggered(&platform(Some(1), None)));
    }

    #[test]
    fn test_external_when_generation_observed() {
        assert!(!is_operator_triggered(&platform(Some(3), Some(observed(3)))));
        assert!(!is_operator_triggered(&platform(None, None)));
    }

    #[test]
    fn test_upgrade_detection() {
        assert!(is_upgrade(&platform(Some(1), Some(with_version("1.0.0"))), "1.2.3"));
        assert!(!is_upgrade(&platform(Some(1), Some(with_version("1.2.3"))), "1.2.3"));
        // Fresh install
        assert!(!is_upgrade(&platform(Some(1), None), "1.2.3"));
    }

    #[test]
    fn test_finalizer_add_and_remove() {
        let mut p = platform(Some(1), None);
        p.metadata.finalizers = Some(vec!["other/finalizer".to_string()]);

        let added = finalizers_with(&p).unwrap();
        assert_eq!(added, vec!["other/finalizer".to_string(), PLATFORM_FINALIZER.to_string()]);

        p.metadata.finalizers = Some(added);
        assert!(has_finalizer(&p));
        assert!(finalizers_with(&p).is_none());
        assert_eq!(finalizers_without(&p), vec!["other/finalizer".to_string()]);
    }

    #[test]
    fn test_set_condition_keeps_transition_time_when_status_unchanged() {
        let mut conditions = Vec::new();
        let complete = ConditionMessage::new(CONDITION_RECONCILE_COMPLETE, true, "ReconcileCompleted", "done");
        set_condition(&mut conditions, &complete, at(100));
        set_condition(&mut conditions, &complete, at(200));

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time, Some(at(100)));

        let failed = ConditionMessage::new(CONDITION_RECONCILE_COMPLETE, false, "ReconcileFailed", "boom");
        set_condition(&mut conditions, &failed, at(300));
        assert_eq!(conditions[0].status, "False");
        assert_eq!(conditions[0].reason, "ReconcileFailed");
        assert_eq!(conditions[0].last_transition_time, Some(at(300)));
    }

    #[test]
    fn test_build_status_success_records_generation_and_version() {
        let p = platform(Some(4), Some(observed(3)));
        let messages = vec![ConditionMessage::new(CONDITION_RECONCILE_COMPLETE, true, "ReconcileCompleted", "ok")];

        let status = build_status(&p, &messages, Some(&summary(0, true)), false, "1.2.3", at(10));

        assert_eq!(status.observed_generation, Some(4));
        assert_eq!(status.version_of(OPERATOR_VERSION_NAME), Some("1.2.3"));
        assert_eq!(condition(&status, CONDITION_RECONCILE_COMPLETE).status, "True");
        assert_eq!(condition(&status, CONDITION_AVAILABLE).status, "True");
        assert_eq!(condition(&status, CONDITION_PROGRESSING).status, "False");
        assert_eq!(condition(&status, CONDITION_DEGRADED).status, "False");
    }

    #[test]
    fn test_build_status_failure_keeps_generation() {
        let p = platform(Some(4), Some(observed(3)));
        let messages = vec![ConditionMessage::new(CONDITION_RECONCILE_COMPLETE, false, "ReconcileFailed", "boom")];

        let status = build_status(&p, &messages, None, false, "1.2.3", at(10));

        assert_eq!(status.observed_generation, Some(3));
        assert!(status.versions.is_empty());
        assert_eq!(condition(&status, CONDITION_RECONCILE_COMPLETE).message, "boom");
        assert_eq!(condition(&status, CONDITION_DEGRADED).status, "True");
    }

    #[test]
    fn test_build_status_upgrade_in_progress_keeps_old_version() {
        let p = platform(Some(1), Some(with_version("1.0.0")));

        let status = build_status(&p, &[], Some(&summary(0, false)), true, "1.2.3", at(10));

        assert_eq!(status.version_of(OPERATOR_VERSION_NAME), Some("1.0.0"));
        assert_eq!(condition(&status, CONDITION_AVAILABLE).status, "False");
        assert_eq!(condition(&status, CONDITION_PROGRESSING).reason, "Reconciling");
    }

    #[test]
    fn test_blocked_status_only_touches_given_conditions() {
        let p = platform(Some(2), Some(observed(2)));
        let messages = vec![ConditionMessage::new(CONDITION_RECONCILE_COMPLETE, false, "UninstallBlocked", "1 vm")];

        let status = blocked_status(&p, &messages, at(10));

        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.observed_generation, Some(2));
    }

    #[test]
    fn test_requeue_after() {
        assert_eq!(requeue_after(&summary(1, true), false), REQUEUE_CHANGED);
        assert_eq!(requeue_after(&summary(0, false), true), REQUEUE_CHANGED);
        assert_eq!(requeue_after(&summary(0, true), false), REQUEUE_STEADY);
        // Not upgrading: an unfinished rollout is picked up by the watch
        assert_eq!(requeue_after(&summary(0, false), false), REQUEUE_STEADY);
    }
}
