//! Standard labels stamped on every managed resource.

use std::collections::BTreeMap;

use crate::config::OperatorConfig;

pub const APP_LABEL: &str = "app";
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const VERSION_LABEL: &str = "app.kubernetes.io/version";

pub const MANAGED_BY: &str = "virtops-operator";
pub const PART_OF: &str = "virtops";

/// Component a resource belongs to, written to `app.kubernetes.io/component`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Compute,
    UiPlugin,
    UiProxy,
    UiConfig,
    NodeLabeller,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Compute => "compute",
            Component::UiPlugin => "kubevirt-console-plugin",
            Component::UiProxy => "kubevirt-apiserver-proxy",
            Component::UiConfig => "kubevirt-ui-config",
            Component::NodeLabeller => "kubevirt-node-labeller",
        }
    }
}

/// Full label set for a resource owned by `platform_name`
pub fn get_labels(platform_name: &str, component: Component, config: &OperatorConfig) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_string(), platform_name.to_string()),
        (COMPONENT_LABEL.to_string(), component.as_str().to_string()),
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string()),
        (PART_OF_LABEL.to_string(), PART_OF.to_string()),
        (VERSION_LABEL.to_string(), config.version.clone()),
    ])
}

/// Labels used in workload selectors. Never includes the version, which
/// changes on every upgrade while selectors are immutable.
pub fn selector_labels(name: &str, component: Component) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("name".to_string(), name.to_string()),
        (COMPONENT_LABEL.to_string(), component.as_str().to_string()),
        (PART_OF_LABEL.to_string(), PART_OF.to_string()),
    ])
}

/// Every desired entry is present in `found` with the same value.
pub fn labels_match(desired: Option<&BTreeMap<String, String>>, found: Option<&BTreeMap<String, String>>) -> bool {
    let Some(desired) = desired else {
        return true;
    };
    let empty = BTreeMap::new();
    let found = found.unwrap_or(&empty);
    desired.iter().all(|(k, v)| found.get(k) == Some(v))
}

/// Merge desired entries into `found`, keeping entries only `found` has.
pub fn merge_labels(found: &mut Option<BTreeMap<String, String>>, desired: Option<&BTreeMap<String, String>>) {
    let Some(desired) = desired else {
        return;
    };
    let target = found.get_or_insert_with(BTreeMap::new);
    for (k, v) in desired {
        target.insert(k.clone(), v.clone());
    }
}
