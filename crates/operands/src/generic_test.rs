//! Unit tests for the generic operand

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crds::VirtPlatform;
    use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
    use k8s_openapi::api::core::v1::{ConfigMap, Container, PodSpec, PodTemplateSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
    use kube::api::ObjectMeta;
    use kube::core::TypeMeta;
    use resource_store::{StoreError, StoreOp};
    use tokio_util::sync::CancellationToken;

    use crate::config::OperatorConfig;
    use crate::error::OperandError;
    use crate::generic::{GenericOperand, Operand};
    use crate::hooks::{ConfigMapHooks, DaemonSetHooks};
    use crate::object::{api_resource, to_dynamic};
    use crate::test_utils::*;

    const CM_NAME: &str = "kubevirt-ui-features";
    const DS_NAME: &str = "test-labeller";

    fn features(_platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConfigMap, OperandError> {
        Ok(ConfigMap {
            metadata: ObjectMeta {
                name: Some(CM_NAME.to_string()),
                namespace: Some(config.namespace.clone()),
                labels: Some(labels(&[("app", "virtops")])),
                ..Default::default()
            },
            data: Some(labels(&[("loadBalancerEnabled", "true")])),
            ..Default::default()
        })
    }

    fn config_map_operand(store: Arc<dyn resource_store::ResourceStoreTrait>) -> GenericOperand<ConfigMapHooks> {
        GenericOperand::new(store, ConfigMapHooks::new(CM_NAME, Arc::new(test_config()), features))
    }

    fn daemon_set(selector: &str, service_account: &str, extra_labels: &[(&str, &str)]) -> DaemonSet {
        let mut ds_labels = labels(&[("app", "virtops")]);
        ds_labels.extend(labels(extra_labels));
        DaemonSet {
            metadata: ObjectMeta {
                name: Some(DS_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                labels: Some(ds_labels),
                ..Default::default()
            },
            spec: Some(DaemonSetSpec {
                selector: LabelSelector {
                    match_labels: Some(labels(&[("name", selector)])),
                    match_expressions: None,
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels(&[("name", selector)])),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        service_account_name: Some(service_account.to_string()),
                        containers: vec![Container {
                            name: "labeller".to_string(),
                            image: Some("labeller:v1".to_string()),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn desired_selector_x(_p: &VirtPlatform, _c: &OperatorConfig) -> Result<DaemonSet, OperandError> {
        Ok(daemon_set("X", "default", &[]))
    }

    fn desired_custom_sa(_p: &VirtPlatform, _c: &OperatorConfig) -> Result<DaemonSet, OperandError> {
        Ok(daemon_set("X", "custom", &[("extra", "label")]))
    }

    #[tokio::test]
    async fn test_creates_when_absent() {
        let (mock, store) = new_store();
        let operand = config_map_operand(store);
        let mut req = operator_request(test_platform());

        let res = operand.ensure(&mut req).await;

        assert!(res.is_ok(), "unexpected error: {:?}", res.err);
        assert!(res.created);
        assert!(!res.updated && !res.deleted);
        assert!(!res.upgrade_done);
        assert_eq!(mock.count(StoreOp::Create), 1);
        assert_eq!(mock.mutations(), 1);
        let stored: ConfigMap = stored(&mock, &features(&test_platform(), &test_config()).unwrap()).unwrap();
        assert_eq!(stored.data.unwrap()["loadBalancerEnabled"], "true");
    }

    #[tokio::test]
    async fn test_second_pass_is_a_no_op() {
        let (mock, store) = new_store();
        let operand = config_map_operand(store);

        let first = operand.ensure(&mut operator_request(test_platform())).await;
        assert!(first.created);
        mock.clear_calls();

        let second = operand.ensure(&mut operator_request(test_platform())).await;
        assert!(second.is_ok());
        assert!(!second.changed());
        assert!(!second.overwritten);
        assert!(second.upgrade_done);
        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_external_drift_is_overwritten() {
        let (mock, store) = new_store();
        let mut drifted = features(&test_platform(), &test_config()).unwrap();
        drifted.data = Some(labels(&[("loadBalancerEnabled", "false"), ("user", "x")]));
        let seeded = seed(&mock, &drifted);

        let res = config_map_operand(store).ensure(&mut external_request(test_platform())).await;

        assert!(res.is_ok());
        assert!(res.updated);
        assert!(res.overwritten);
        assert_eq!(mock.count(StoreOp::Update), 1);
        let now: ConfigMap = stored(&mock, &drifted).unwrap();
        assert_eq!(now.metadata.uid, seeded.metadata.uid);
        assert_eq!(now.data, Some(labels(&[("loadBalancerEnabled", "true")])));
    }

    #[tokio::test]
    async fn test_operator_triggered_update_is_not_overwritten() {
        let (mock, store) = new_store();
        let mut old = features(&test_platform(), &test_config()).unwrap();
        old.data = Some(labels(&[("loadBalancerEnabled", "false")]));
        seed(&mock, &old);

        let res = config_map_operand(store).ensure(&mut operator_request(test_platform())).await;

        assert!(res.updated);
        assert!(!res.overwritten);
    }

    #[tokio::test]
    async fn test_user_labels_survive_update() {
        let (mock, store) = new_store();
        let mut found = features(&test_platform(), &test_config()).unwrap();
        found.metadata.labels = Some(labels(&[("app", "old"), ("team", "infra")]));
        let seeded = seed(&mock, &found);

        let res = config_map_operand(store).ensure(&mut external_request(test_platform())).await;

        assert!(res.updated);
        let now: ConfigMap = stored(&mock, &found).unwrap();
        assert_eq!(now.metadata.uid, seeded.metadata.uid);
        assert_eq!(now.metadata.labels, Some(labels(&[("app", "virtops"), ("team", "infra")])));
    }

    #[tokio::test]
    async fn test_selector_change_recreates_daemon_set() {
        let (mock, store) = new_store();
        let mut found = daemon_set("Y", "default", &[("team", "infra"), ("app", "stale")]);
        found.metadata.uid = Some("old-uid".to_string());
        seed(&mock, &found);
        let operand = GenericOperand::new(
            store,
            DaemonSetHooks::new(DS_NAME, Arc::new(test_config()), desired_selector_x),
        );

        let res = operand.ensure(&mut external_request(test_platform())).await;

        assert!(res.is_ok(), "unexpected error: {:?}", res.err);
        assert!(res.updated);
        assert!(!res.created);
        assert!(res.overwritten);
        assert_eq!(mock.count(StoreOp::Delete), 1);
        assert_eq!(mock.count(StoreOp::Create), 1);
        let now: DaemonSet = stored(&mock, &found).unwrap();
        assert_ne!(now.metadata.uid.as_deref(), Some("old-uid"));
        assert_eq!(now.metadata.labels, Some(labels(&[("app", "virtops"), ("team", "infra")])));
        assert_eq!(
            now.spec.unwrap().selector.match_labels,
            Some(labels(&[("name", "X")]))
        );
    }

    #[tokio::test]
    async fn test_service_account_change_updates_in_place() {
        let (mock, store) = new_store();
        let mut found = daemon_set("X", "default", &[]);
        found.metadata.uid = Some("old-uid".to_string());
        seed(&mock, &found);
        let operand = GenericOperand::new(
            store,
            DaemonSetHooks::new(DS_NAME, Arc::new(test_config()), desired_custom_sa),
        );

        let res = operand.ensure(&mut operator_request(test_platform())).await;

        assert!(res.is_ok(), "unexpected error: {:?}", res.err);
        assert!(res.updated);
        assert_eq!(mock.count(StoreOp::Delete), 0);
        let now: DaemonSet = stored(&mock, &found).unwrap();
        assert_eq!(now.metadata.uid.as_deref(), Some("old-uid"));
        assert_eq!(now.metadata.labels.as_ref().unwrap()["extra"], "label");
        let pod = now.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("custom"));
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_reported() {
        let (mock, store) = new_store();
        let mut wrong = to_dynamic(&features(&test_platform(), &test_config()).unwrap()).unwrap();
        wrong.types = Some(TypeMeta {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
        });
        mock.insert(&api_resource::<ConfigMap>(), wrong);

        let res = config_map_operand(store).ensure(&mut operator_request(test_platform())).await;

        match res.err {
            Some(OperandError::KindMismatch { expected, found }) => {
                assert_eq!(expected, "ConfigMap");
                assert_eq!(found, "Secret");
            }
            other => panic!("expected kind mismatch, got {other:?}"),
        }
        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let (mock, store) = new_store();
        mock.fail_next(StoreOp::Create, StoreError::Rejected("admission denied".to_string()));

        let res = config_map_operand(store).ensure(&mut operator_request(test_platform())).await;

        assert!(!res.created);
        assert!(matches!(res.err, Some(OperandError::Store(StoreError::Rejected(_)))));
        assert!(!mock.contains(&key(&features(&test_platform(), &test_config()).unwrap())));
    }

    #[tokio::test]
    async fn test_update_conflict_is_returned_without_retry() {
        let (mock, store) = new_store();
        let mut drifted = features(&test_platform(), &test_config()).unwrap();
        drifted.data = Some(labels(&[("loadBalancerEnabled", "false")]));
        seed(&mock, &drifted);
        mock.fail_next(StoreOp::Update, StoreError::Conflict("stale resourceVersion".to_string()));

        let res = config_map_operand(store).ensure(&mut external_request(test_platform())).await;

        assert!(matches!(res.err, Some(OperandError::Store(StoreError::Conflict(_)))));
        assert!(!res.updated);
        assert!(!res.overwritten);
        assert_eq!(mock.count(StoreOp::Update), 1);
        assert_eq!(mock.mutations(), 1);
        let now: ConfigMap = stored(&mock, &drifted).unwrap();
        assert_eq!(now.data, Some(labels(&[("loadBalancerEnabled", "false")])));
    }

    #[tokio::test]
    async fn test_cancelled_request_aborts_pending_call() {
        let (mock, store) = new_store();
        mock.stall(StoreOp::Get);
        let token = CancellationToken::new();
        let mut req = operator_request(test_platform()).with_cancellation(token.clone());
        token.cancel();

        let res = config_map_operand(store).ensure(&mut req).await;

        assert!(matches!(res.err, Some(OperandError::Cancelled)));
        assert_eq!(mock.mutations(), 0);
    }

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    fn counted(platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConfigMap, OperandError> {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        features(platform, config)
    }

    #[tokio::test]
    async fn test_desired_object_is_built_once_per_pass() {
        let (_mock, store) = new_store();
        let operand = GenericOperand::new(store, ConfigMapHooks::new(CM_NAME, Arc::new(test_config()), counted));
        let mut req = operator_request(test_platform());
        let before = BUILDS.load(Ordering::SeqCst);

        operand.ensure(&mut req).await;
        operand.ensure(&mut req).await;
        assert_eq!(BUILDS.load(Ordering::SeqCst) - before, 1);

        req.reset();
        operand.ensure(&mut req).await;
        assert_eq!(BUILDS.load(Ordering::SeqCst) - before, 2);
    }

    #[tokio::test]
    async fn test_ensure_deleted_removes_and_then_no_ops() {
        let (mock, store) = new_store();
        let operand = config_map_operand(store);
        seed(&mock, &features(&test_platform(), &test_config()).unwrap());
        let req = operator_request(test_platform());

        let first = operand.ensure_deleted(&req).await;
        assert!(first.deleted);
        assert!(first.upgrade_done);

        mock.clear_calls();
        let second = operand.ensure_deleted(&req).await;
        assert!(second.is_ok());
        assert!(!second.deleted);
        assert_eq!(mock.mutations(), 0);
    }
}
