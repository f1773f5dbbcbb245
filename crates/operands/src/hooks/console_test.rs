//! Unit tests for console plugin and console registration hooks

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crds::{Console, ConsoleSpec, CLUSTER_CONSOLE_NAME};
    use resource_store::StoreOp;

    use crate::components::ui;
    use crate::generic::{GenericOperand, Operand};
    use crate::hooks::{ConsolePluginHooks, ConsoleRegistrationHooks, OperandHooks};
    use crate::test_utils::*;

    fn registration() -> ConsoleRegistrationHooks {
        ConsoleRegistrationHooks::new(Arc::new(test_config()), ui::console_registration)
    }

    fn console(plugins: &[&str]) -> Console {
        Console::new(
            CLUSTER_CONSOLE_NAME,
            ConsoleSpec {
                plugins: plugins.iter().map(|p| p.to_string()).collect(),
                extra: [("customization".to_string(), serde_json::json!({"brand": "okd"}))].into(),
            },
        )
    }

    #[test]
    fn test_console_plugin_points_at_services() {
        let plugin = ui::console_plugin(&test_platform(), &test_config()).unwrap();
        let backend = plugin.spec.backend.service.unwrap();
        assert_eq!(backend.name, ui::PLUGIN_SERVICE_NAME);
        assert_eq!(backend.namespace, TEST_NAMESPACE);
        assert_eq!(backend.port, ui::PLUGIN_PORT);
        let proxy = &plugin.spec.proxy[0];
        assert_eq!(proxy.alias, ui::PROXY_DEPLOYMENT_NAME);
        assert_eq!(proxy.authorization.as_deref(), Some("UserToken"));
        assert_eq!(proxy.endpoint.service.as_ref().unwrap().port, ui::PROXY_PORT);
    }

    #[test]
    fn test_console_plugin_spec_drift_is_replaced() {
        let hooks = ConsolePluginHooks::new(ui::PLUGIN_NAME, Arc::new(test_config()), ui::console_plugin);
        let desired = hooks.build_desired(&test_platform()).unwrap();
        let mut found = desired.clone();
        found.spec.display_name = "Renamed".to_string();

        assert!(!hooks.matches_desired(&found, &desired));
        hooks.converge(&mut found, &desired);
        assert_eq!(found.spec, desired.spec);
    }

    #[test]
    fn test_registration_appends_plugin_once() {
        let hooks = registration();
        let desired = hooks.build_desired(&test_platform()).unwrap();
        let mut found = console(&["monitoring-plugin"]);

        assert!(!hooks.matches_desired(&found, &desired));
        hooks.converge(&mut found, &desired);
        hooks.converge(&mut found, &desired);
        assert_eq!(found.spec.plugins, vec!["monitoring-plugin", ui::PLUGIN_NAME]);
        assert!(found.spec.extra.contains_key("customization"));
        assert!(hooks.matches_desired(&found, &desired));
    }

    #[tokio::test]
    async fn test_missing_console_is_not_created() {
        let (mock, store) = new_store();
        let operand = GenericOperand::new(store, registration());

        let res = operand.ensure(&mut operator_request(test_platform())).await;

        assert!(res.is_ok());
        assert!(!res.changed());
        assert!(res.upgrade_done);
        assert_eq!(mock.mutations(), 0);

        let deleted = operand.ensure_deleted(&operator_request(test_platform())).await;
        assert!(!deleted.deleted);
        assert_eq!(mock.count(StoreOp::Delete), 0);
    }

    #[tokio::test]
    async fn test_registration_keeps_console_settings() {
        let (mock, store) = new_store();
        seed(&mock, &console(&[]));
        let operand = GenericOperand::new(store, registration());

        let res = operand.ensure(&mut external_request(test_platform())).await;

        assert!(res.updated);
        assert!(res.overwritten);
        let now = stored(&mock, &console(&[])).unwrap();
        assert_eq!(now.spec.plugins, vec![ui::PLUGIN_NAME]);
        assert_eq!(now.spec.extra["customization"]["brand"], "okd");
    }
}
