//! Console UI plugin and API proxy resources.

use std::collections::BTreeMap;

use crds::{
    Console, ConsolePlugin, ConsolePluginBackend, ConsolePluginProxy, ConsolePluginProxyEndpoint,
    ConsolePluginService, ConsolePluginSpec, ConsoleSpec, VirtPlatform, CLUSTER_CONSOLE_NAME,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, PodAffinityTerm, PodAntiAffinity,
    PodSpec, PodTemplateSpec, ResourceRequirements, SecretVolumeSource, Service, ServicePort, ServiceSpec,
    Volume, VolumeMount, WeightedPodAffinityTerm,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;

use super::{platform_name, Scheduling, PRIORITY_CLASS_NAME, TERMINATION_MESSAGE_PATH, TERMINATION_MESSAGE_POLICY};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{get_labels, selector_labels, Component, COMPONENT_LABEL};

pub const PLUGIN_NAME: &str = "kubevirt-plugin";
pub const PLUGIN_DEPLOYMENT_NAME: &str = "kubevirt-console-plugin";
pub const PROXY_DEPLOYMENT_NAME: &str = "kubevirt-apiserver-proxy";
pub const PLUGIN_SERVICE_NAME: &str = "kubevirt-console-plugin-service";
pub const PROXY_SERVICE_NAME: &str = "kubevirt-apiserver-proxy-service";
pub const PLUGIN_SERVING_CERT_NAME: &str = "plugin-serving-cert";
pub const PROXY_SERVING_CERT_NAME: &str = "console-proxy-serving-cert";
pub const PLUGIN_SERVING_CERT_PATH: &str = "/var/serving-cert";
pub const PROXY_SERVING_CERT_PATH: &str = "/app/cert";
pub const NGINX_CONFIG_MAP_NAME: &str = "nginx-conf";
pub const USER_SETTINGS_CONFIG_MAP_NAME: &str = "kubevirt-user-settings";
pub const FEATURES_CONFIG_MAP_NAME: &str = "kubevirt-ui-features";
pub const UI_CONFIG_READER_ROLE_NAME: &str = "kubevirt-ui-config-reader";
pub const UI_CONFIG_READER_BINDING_NAME: &str = "kubevirt-ui-config-reader-rolebinding";

pub const PLUGIN_PORT: i32 = 9443;
const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
pub const PROXY_PORT: i32 = 8080;

const SERVING_CERT_ANNOTATION: &str = "service.beta.openshift.io/serving-cert-secret-name";
const REQUIRED_SCC_ANNOTATION: &str = "openshift.io/required-scc";

/// Default contents of the UI features config map
pub const UI_FEATURES: &[(&str, &str)] = &[
    ("automaticSubscriptionActivationKey", ""),
    ("automaticSubscriptionOrganizationId", ""),
    ("disabledGuestSystemLogsAccess", "false"),
    ("kubevirtApiserverProxy", "true"),
    ("loadBalancerEnabled", "true"),
    ("nodePortAddress", ""),
    ("nodePortEnabled", "false"),
];

fn nginx_config() -> String {
    format!(
        r#"error_log /dev/stdout info;
events {{}}
http {{
    access_log         /dev/stdout;
    include            /etc/nginx/mime.types;
    default_type       application/octet-stream;
    keepalive_timeout  65;
    add_header X-Content-Type-Options nosniff;
    server {{
        listen              {PLUGIN_PORT} ssl;
        ssl_certificate     {PLUGIN_SERVING_CERT_PATH}/tls.crt;
        ssl_certificate_key {PLUGIN_SERVING_CERT_PATH}/tls.key;
        root                /usr/share/nginx/html;

        location = /plugin-manifest.json {{
            add_header Cache-Control 'no-cache, no-store, must-revalidate, proxy-revalidate, max-age=0';
            add_header Pragma 'no-cache';
            add_header Expires '0';
        }}
        location = /plugin-entry.js {{
            add_header Cache-Control 'no-cache, no-store, must-revalidate, proxy-revalidate, max-age=0';
            add_header Pragma 'no-cache';
            add_header Expires '0';
        }}
    }}
}}
"#
    )
}

/// Soft anti-affinity spreading replicas across nodes, only when highly available
pub fn pod_anti_affinity(component: Component, highly_available: bool) -> Option<Affinity> {
    if !highly_available {
        return None;
    }
    Some(Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![WeightedPodAffinityTerm {
                weight: 90,
                pod_affinity_term: PodAffinityTerm {
                    label_selector: Some(LabelSelector {
                        match_expressions: Some(vec![LabelSelectorRequirement {
                            key: COMPONENT_LABEL.to_string(),
                            operator: "In".to_string(),
                            values: Some(vec![component.as_str().to_string()]),
                        }]),
                        match_labels: None,
                    }),
                    topology_key: "kubernetes.io/hostname".to_string(),
                    ..Default::default()
                },
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

struct UiDeployment<'a> {
    name: &'a str,
    image: &'a str,
    serving_cert_name: &'a str,
    serving_cert_path: &'a str,
    port: i32,
    component: Component,
}

fn ui_deployment(platform: &VirtPlatform, config: &OperatorConfig, d: UiDeployment<'_>) -> Deployment {
    let labels = get_labels(&platform_name(platform), d.component, config);
    let selector = selector_labels(d.name, d.component);
    let mut pod_labels = labels.clone();
    pod_labels.extend(selector.clone());

    let ha = platform.spec.highly_available;
    let scheduling = Scheduling::resolve(platform.spec.infra.as_ref(), pod_anti_affinity(d.component, ha));

    Deployment {
        metadata: ObjectMeta {
            name: Some(d.name.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(if ha { 2 } else { 1 }),
            selector: LabelSelector {
                match_labels: Some(selector),
                match_expressions: None,
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("RollingUpdate".to_string()),
                rolling_update: None,
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    annotations: Some(BTreeMap::from([(
                        REQUIRED_SCC_ANNOTATION.to_string(),
                        "restricted-v2".to_string(),
                    )])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some("default".to_string()),
                    containers: vec![Container {
                        name: d.name.to_string(),
                        image: Some(d.image.to_string()),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        resources: Some(ResourceRequirements {
                            requests: Some(BTreeMap::from([
                                ("cpu".to_string(), Quantity("10m".to_string())),
                                ("memory".to_string(), Quantity("100Mi".to_string())),
                            ])),
                            ..Default::default()
                        }),
                        ports: Some(vec![ContainerPort {
                            container_port: d.port,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
                        termination_message_policy: Some(TERMINATION_MESSAGE_POLICY.to_string()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: d.serving_cert_name.to_string(),
                            mount_path: d.serving_cert_path.to_string(),
                            read_only: Some(true),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    priority_class_name: Some(PRIORITY_CLASS_NAME.to_string()),
                    node_selector: scheduling.node_selector,
                    affinity: scheduling.affinity,
                    tolerations: scheduling.tolerations,
                    volumes: Some(vec![Volume {
                        name: d.serving_cert_name.to_string(),
                        secret: Some(SecretVolumeSource {
                            secret_name: Some(d.serving_cert_name.to_string()),
                            default_mode: Some(420),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Static plugin server (nginx) deployment
pub fn plugin_deployment(platform: &VirtPlatform, config: &OperatorConfig) -> Result<Deployment, OperandError> {
    let image = OperatorConfig::require_image(&config.ui_plugin_image, "UI_PLUGIN_IMAGE")?;
    let mut deployment = ui_deployment(
        platform,
        config,
        UiDeployment {
            name: PLUGIN_DEPLOYMENT_NAME,
            image,
            serving_cert_name: PLUGIN_SERVING_CERT_NAME,
            serving_cert_path: PLUGIN_SERVING_CERT_PATH,
            port: PLUGIN_PORT,
            component: Component::UiPlugin,
        },
    );

    if let Some(pod) = deployment.spec.as_mut().and_then(|s| s.template.spec.as_mut()) {
        if let Some(container) = pod.containers.first_mut() {
            container.volume_mounts.get_or_insert_with(Vec::new).push(VolumeMount {
                name: NGINX_CONFIG_MAP_NAME.to_string(),
                mount_path: "/etc/nginx/nginx.conf".to_string(),
                sub_path: Some("nginx.conf".to_string()),
                read_only: Some(true),
                ..Default::default()
            });
        }
        pod.volumes.get_or_insert_with(Vec::new).push(Volume {
            name: NGINX_CONFIG_MAP_NAME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: NGINX_CONFIG_MAP_NAME.to_string(),
                default_mode: Some(420),
                ..Default::default()
            }),
            ..Default::default()
        });
    }
    Ok(deployment)
}

/// API server proxy deployment used by the plugin
pub fn proxy_deployment(platform: &VirtPlatform, config: &OperatorConfig) -> Result<Deployment, OperandError> {
    let image = OperatorConfig::require_image(&config.ui_proxy_image, "UI_PROXY_IMAGE")?;
    Ok(ui_deployment(
        platform,
        config,
        UiDeployment {
            name: PROXY_DEPLOYMENT_NAME,
            image,
            serving_cert_name: PROXY_SERVING_CERT_NAME,
            serving_cert_path: PROXY_SERVING_CERT_PATH,
            port: PROXY_PORT,
            component: Component::UiProxy,
        },
    ))
}

fn ui_service(
    platform: &VirtPlatform,
    config: &OperatorConfig,
    name: &str,
    deployment: &str,
    serving_cert: &str,
    port: i32,
    component: Component,
) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(get_labels(&platform_name(platform), component, config)),
            annotations: Some(BTreeMap::from([(
                SERVING_CERT_ANNOTATION.to_string(),
                serving_cert.to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            ports: Some(vec![ServicePort {
                name: Some(format!("{deployment}-port")),
                port,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::Int(port)),
                ..Default::default()
            }]),
            selector: Some(BTreeMap::from([(COMPONENT_LABEL.to_string(), component.as_str().to_string())])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn plugin_service(platform: &VirtPlatform, config: &OperatorConfig) -> Result<Service, OperandError> {
    Ok(ui_service(
        platform,
        config,
        PLUGIN_SERVICE_NAME,
        PLUGIN_DEPLOYMENT_NAME,
        PLUGIN_SERVING_CERT_NAME,
        PLUGIN_PORT,
        Component::UiPlugin,
    ))
}

pub fn proxy_service(platform: &VirtPlatform, config: &OperatorConfig) -> Result<Service, OperandError> {
    Ok(ui_service(
        platform,
        config,
        PROXY_SERVICE_NAME,
        PROXY_DEPLOYMENT_NAME,
        PROXY_SERVING_CERT_NAME,
        PROXY_PORT,
        Component::UiProxy,
    ))
}

fn config_map(
    platform: &VirtPlatform,
    config: &OperatorConfig,
    name: &str,
    component: Component,
    data: BTreeMap<String, String>,
) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(get_labels(&platform_name(platform), component, config)),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

pub fn nginx_config_map(platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConfigMap, OperandError> {
    Ok(config_map(
        platform,
        config,
        NGINX_CONFIG_MAP_NAME,
        Component::UiPlugin,
        BTreeMap::from([("nginx.conf".to_string(), nginx_config())]),
    ))
}

/// Starts empty; the UI writes per-user settings into it.
pub fn user_settings_config_map(platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConfigMap, OperandError> {
    Ok(config_map(
        platform,
        config,
        USER_SETTINGS_CONFIG_MAP_NAME,
        Component::UiConfig,
        BTreeMap::new(),
    ))
}

pub fn features_config_map(platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConfigMap, OperandError> {
    let data = UI_FEATURES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Ok(config_map(platform, config, FEATURES_CONFIG_MAP_NAME, Component::UiConfig, data))
}

pub fn console_plugin(platform: &VirtPlatform, config: &OperatorConfig) -> Result<ConsolePlugin, OperandError> {
    let mut plugin = ConsolePlugin::new(
        PLUGIN_NAME,
        ConsolePluginSpec {
            display_name: "Kubevirt Console Plugin".to_string(),
            backend: ConsolePluginBackend {
                type_: "Service".to_string(),
                service: Some(ConsolePluginService {
                    name: PLUGIN_SERVICE_NAME.to_string(),
                    namespace: config.namespace.clone(),
                    port: PLUGIN_PORT,
                    base_path: Some("/".to_string()),
                }),
            },
            proxy: vec![ConsolePluginProxy {
                alias: PROXY_DEPLOYMENT_NAME.to_string(),
                authorization: Some("UserToken".to_string()),
                endpoint: ConsolePluginProxyEndpoint {
                    type_: "Service".to_string(),
                    service: Some(ConsolePluginService {
                        name: PROXY_SERVICE_NAME.to_string(),
                        namespace: config.namespace.clone(),
                        port: PROXY_PORT,
                        base_path: None,
                    }),
                },
            }],
        },
    );
    plugin.metadata.labels = Some(get_labels(&platform_name(platform), Component::UiPlugin, config));
    Ok(plugin)
}

/// The cluster Console; only its plugin list is owned here.
pub fn console_registration(_platform: &VirtPlatform, _config: &OperatorConfig) -> Result<Console, OperandError> {
    Ok(Console::new(
        CLUSTER_CONSOLE_NAME,
        ConsoleSpec {
            plugins: vec![PLUGIN_NAME.to_string()],
            ..Default::default()
        },
    ))
}

fn config_map_rule(name: &str, verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![String::new()]),
        resources: Some(vec!["configmaps".to_string()]),
        resource_names: Some(vec![name.to_string()]),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// Lets console users keep their settings and read the UI feature flags.
pub fn ui_config_reader_role(platform: &VirtPlatform, config: &OperatorConfig) -> Result<Role, OperandError> {
    Ok(Role {
        metadata: ObjectMeta {
            name: Some(UI_CONFIG_READER_ROLE_NAME.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(get_labels(&platform_name(platform), Component::UiPlugin, config)),
            ..Default::default()
        },
        rules: Some(vec![
            config_map_rule(USER_SETTINGS_CONFIG_MAP_NAME, &["get", "update", "patch"]),
            config_map_rule(FEATURES_CONFIG_MAP_NAME, &["get"]),
        ]),
    })
}

/// Grants the reader role to every authenticated user.
pub fn ui_config_reader_role_binding(
    platform: &VirtPlatform,
    config: &OperatorConfig,
) -> Result<RoleBinding, OperandError> {
    Ok(RoleBinding {
        metadata: ObjectMeta {
            name: Some(UI_CONFIG_READER_BINDING_NAME.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(get_labels(&platform_name(platform), Component::UiPlugin, config)),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "Role".to_string(),
            name: UI_CONFIG_READER_ROLE_NAME.to_string(),
        },
        subjects: Some(vec![Subject {
            api_group: Some(RBAC_API_GROUP.to_string()),
            kind: "Group".to_string(),
            name: "system:authenticated".to_string(),
            namespace: None,
        }]),
    })
}
