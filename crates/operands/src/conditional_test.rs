//! Unit tests for feature-gated operands

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crds::{FeatureGates, VirtPlatform};
    use k8s_openapi::api::core::v1::ConfigMap;
    use resource_store::{ResourceStoreTrait, StoreError, StoreOp};

    use crate::components::ui;
    use crate::conditional::ConditionalOperand;
    use crate::error::OperandError;
    use crate::generic::{GenericOperand, Operand};
    use crate::hooks::ConfigMapHooks;
    use crate::test_utils::*;

    fn plugin_gate(platform: &VirtPlatform) -> bool {
        platform.spec.feature_gates.deploy_console_plugin
    }

    fn nginx_operand(store: Arc<dyn ResourceStoreTrait>) -> ConditionalOperand<ConfigMapHooks> {
        let hooks = ConfigMapHooks::new(ui::NGINX_CONFIG_MAP_NAME, Arc::new(test_config()), ui::nginx_config_map);
        ConditionalOperand::new(GenericOperand::new(store, hooks), plugin_gate)
    }

    fn disabled() -> VirtPlatform {
        platform_with_gates(FeatureGates {
            deploy_console_plugin: false,
            ..Default::default()
        })
    }

    fn nginx() -> ConfigMap {
        ui::nginx_config_map(&test_platform(), &test_config()).unwrap()
    }

    #[tokio::test]
    async fn test_enabled_gate_delegates_to_ensure() {
        let (mock, store) = new_store();

        let res = nginx_operand(store).ensure(&mut operator_request(test_platform())).await;

        assert!(res.created);
        assert!(mock.contains(&key(&nginx())));
    }

    #[tokio::test]
    async fn test_disabled_gate_deletes_existing_resource() {
        let (mock, store) = new_store();
        seed(&mock, &nginx());
        let operand = nginx_operand(store);

        let res = operand.ensure(&mut operator_request(disabled())).await;

        assert!(res.is_ok());
        assert!(res.deleted);
        assert!(!res.created && !res.updated);
        assert!(!mock.contains(&key(&nginx())));

        mock.clear_calls();
        let again = operand.ensure(&mut operator_request(disabled())).await;
        assert!(again.is_ok());
        assert!(!again.deleted);
        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_disabled_gate_with_nothing_deployed_is_a_no_op() {
        let (mock, store) = new_store();

        let res = nginx_operand(store).ensure(&mut operator_request(disabled())).await;

        assert!(res.is_ok());
        assert!(!res.changed());
        assert_eq!(mock.count(StoreOp::Get), 1);
        assert_eq!(mock.mutations(), 0);
    }

    #[tokio::test]
    async fn test_delete_failure_is_surfaced() {
        let (mock, store) = new_store();
        seed(&mock, &nginx());
        mock.fail_next(StoreOp::Delete, StoreError::Rejected("forbidden".to_string()));

        let res = nginx_operand(store).ensure(&mut operator_request(disabled())).await;

        assert!(!res.deleted);
        assert!(matches!(res.err, Some(OperandError::Store(StoreError::Rejected(_)))));
        assert!(mock.contains(&key(&nginx())));
    }
}
