//! Unit tests for ClusterServiceVersion annotation hooks

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crds::{ClusterServiceVersion, CONSOLE_PLUGINS_ANNOTATION};
    use resource_store::{StoreError, StoreOp};

    use crate::components::csv::{cluster_service_version, LEGACY_UPGRADE_ANNOTATION};
    use crate::config::OperatorConfig;
    use crate::generic::{GenericOperand, Operand};
    use crate::hooks::{CsvAnnotationHooks, OperandHooks};
    use crate::test_utils::*;

    const CSV_NAME: &str = "virtops-operator.v1.2.3";

    fn config() -> Arc<OperatorConfig> {
        let mut config = test_config();
        config.csv_name = Some(CSV_NAME.to_string());
        Arc::new(config)
    }

    fn hooks() -> CsvAnnotationHooks {
        CsvAnnotationHooks::new(config(), cluster_service_version)
    }

    /// The CSV as OLM installed it, with whatever annotations it has
    fn installed(annotations: &[(&str, &str)]) -> ClusterServiceVersion {
        let mut csv = hooks().empty(&test_platform());
        csv.spec.fields.insert("displayName".to_string(), serde_json::json!("VirtOps"));
        csv.metadata.annotations = Some(labels(annotations));
        csv
    }

    #[test]
    fn test_desired_annotations_include_plugins_and_user_entries() {
        let mut platform = test_platform();
        platform.spec.annotations = labels(&[("example.com/tier", "gold")]);
        let desired = hooks().build_desired(&platform).unwrap();
        let annotations = desired.metadata.annotations.unwrap();
        assert_eq!(annotations[CONSOLE_PLUGINS_ANNOTATION], "[\"kubevirt-plugin\"]");
        assert_eq!(annotations["example.com/tier"], "gold");
    }

    #[test]
    fn test_patch_contains_only_differences() {
        let hooks = hooks();
        let desired = hooks.build_desired(&test_platform()).unwrap();
        let found = installed(&[("olm.operatorGroup", "virtops")]);

        let patch = hooks.patch_for(&found, &desired).unwrap();

        assert_eq!(
            patch,
            serde_json::json!({
                "metadata": { "annotations": { CONSOLE_PLUGINS_ANNOTATION: "[\"kubevirt-plugin\"]" } }
            })
        );
    }

    #[tokio::test]
    async fn test_ensure_patches_without_replacing() {
        let (mock, store) = new_store();
        let found = installed(&[("olm.operatorGroup", "virtops")]);
        seed(&mock, &found);

        let res = GenericOperand::new(store, hooks())
            .ensure(&mut operator_request(test_platform()))
            .await;

        assert!(res.is_ok(), "unexpected error: {:?}", res.err);
        assert!(res.updated);
        assert_eq!(mock.count(StoreOp::Patch), 1);
        assert_eq!(mock.count(StoreOp::Update), 0);
        let now = stored(&mock, &found).unwrap();
        let annotations = now.metadata.annotations.unwrap();
        assert_eq!(annotations["olm.operatorGroup"], "virtops");
        assert!(annotations.contains_key(CONSOLE_PLUGINS_ANNOTATION));
        assert_eq!(now.spec.fields["displayName"], "VirtOps");
    }

    #[tokio::test]
    async fn test_absent_csv_is_never_created() {
        let (mock, store) = new_store();

        let res = GenericOperand::new(store, hooks())
            .ensure(&mut operator_request(test_platform()))
            .await;

        assert!(res.is_ok());
        assert!(!res.created);
        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_upgrade_removes_legacy_annotation() {
        let (mock, store) = new_store();
        let found = installed(&[
            (CONSOLE_PLUGINS_ANNOTATION, "[\"kubevirt-plugin\"]"),
            (LEGACY_UPGRADE_ANNOTATION, "true"),
        ]);
        seed(&mock, &found);
        let mut req = operator_request(test_platform()).upgrade_mode(true);

        let res = GenericOperand::new(store, hooks()).ensure(&mut req).await;

        assert!(res.is_ok());
        assert!(!res.updated);
        let annotations = stored(&mock, &found).unwrap().metadata.annotations.unwrap();
        assert!(!annotations.contains_key(LEGACY_UPGRADE_ANNOTATION));
        assert!(annotations.contains_key(CONSOLE_PLUGINS_ANNOTATION));
    }

    #[tokio::test]
    async fn test_legacy_annotation_kept_outside_upgrades() {
        let (mock, store) = new_store();
        let found = installed(&[
            (CONSOLE_PLUGINS_ANNOTATION, "[\"kubevirt-plugin\"]"),
            (LEGACY_UPGRADE_ANNOTATION, "true"),
        ]);
        seed(&mock, &found);

        GenericOperand::new(store, hooks())
            .ensure(&mut operator_request(test_platform()))
            .await;

        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_finalize_failure_does_not_fail_the_result() {
        let (mock, store) = new_store();
        let found = installed(&[
            (CONSOLE_PLUGINS_ANNOTATION, "[\"kubevirt-plugin\"]"),
            (LEGACY_UPGRADE_ANNOTATION, "true"),
        ]);
        seed(&mock, &found);
        mock.fail_next(StoreOp::Patch, StoreError::Rejected("webhook unavailable".to_string()));
        let mut req = operator_request(test_platform()).upgrade_mode(true);

        let res = GenericOperand::new(store, hooks()).ensure(&mut req).await;

        assert!(res.is_ok());
        let annotations = stored(&mock, &found).unwrap().metadata.annotations.unwrap();
        assert!(annotations.contains_key(LEGACY_UPGRADE_ANNOTATION));
    }
}
