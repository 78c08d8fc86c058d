//! Generated build and deployment artifacts for user scripts.
//!
//! Everything here is a pure function of the script name (and namespace).
//! The descriptors are plain data; nothing in this crate applies them.

use serde_json::{Value, json};

use crate::naming::ScriptName;

/// File name of the dependency manifest at the project root.
pub const DEPENDENCY_MANIFEST_FILE: &str = "requirements.txt";
/// File name of a generated build file inside `dockerfiles/<stem>/`.
pub const BUILD_FILE: &str = "Dockerfile";
/// Extension of script files under `scripts/`.
pub const SCRIPT_EXTENSION: &str = "py";
/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Port every generated worker listens on.
pub const WORKER_PORT: u16 = 50051;

const WORKER_PORT_NAME: &str = "grpc";
const WORKER_COMPONENT: &str = "udf";

/// Build file for a script; the only substitution is the entrypoint file name.
pub fn generate_build_file(script_name: &str) -> String {
    let stem = ScriptName::new(script_name).file_stem();
    format!(
        r#"FROM python:3.10-slim

WORKDIR /app

COPY . /app

RUN pip install -r requirements.txt

CMD ["python", "-u","{stem}.{SCRIPT_EXTENSION}"]
"#
    )
}

/// Dependency manifest shared by every generated script.
pub fn generate_dependency_manifest() -> String {
    "pynumaflow>=1.0.0\n".to_string()
}

/// Service resource exposing a script's worker inside the cluster.
pub fn generate_service_descriptor(
    script_name: &str,
    namespace: Option<&str>,
) -> Value {
    let name = ScriptName::new(script_name).resource_name();
    let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);

    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": format!("{name}-service"),
            "namespace": namespace,
            "labels": labels(&name),
        },
        "spec": {
            "selector": {
                "app": name,
            },
            "ports": [
                {
                    "port": WORKER_PORT,
                    "targetPort": WORKER_PORT,
                    "protocol": "TCP",
                    "name": WORKER_PORT_NAME,
                }
            ],
            "type": "ClusterIP",
        },
    })
}

/// Deployment resource running a script's worker image.
pub fn generate_workload_descriptor(
    script_name: &str,
    namespace: Option<&str>,
) -> Value {
    let name = ScriptName::new(script_name).resource_name();
    let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);

    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": format!("{name}-deployment"),
            "namespace": namespace,
            "labels": labels(&name),
        },
        "spec": {
            "replicas": 1,
            "selector": {
                "matchLabels": {
                    "app": name,
                },
            },
            "template": {
                "metadata": {
                    "labels": labels(&name),
                },
                "spec": {
                    "containers": [
                        {
                            "name": name,
                            "image": format!("{name}:latest"),
                            "imagePullPolicy": "IfNotPresent",
                            "ports": [
                                {
                                    "containerPort": WORKER_PORT,
                                    "name": WORKER_PORT_NAME,
                                }
                            ],
                            "resources": {
                                "requests": {
                                    "memory": "128Mi",
                                    "cpu": "100m",
                                },
                                "limits": {
                                    "memory": "512Mi",
                                    "cpu": "500m",
                                },
                            },
                        }
                    ],
                },
            },
        },
    })
}

fn labels(name: &str) -> Value {
    json!({
        "app": name,
        "component": WORKER_COMPONENT,
    })
}

/// A script body paired with its build file, ready to be written side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBundle {
    /// `<stem>.py`
    pub script_file: String,
    pub script_body: String,
    /// always `Dockerfile`
    pub build_file: String,
    pub build_body: String,
}

impl ScriptBundle {
    pub fn for_script(
        script_name: &str,
        body: &str,
    ) -> Self {
        Self {
            script_file: format!("{}.{}", ScriptName::new(script_name).file_stem(), SCRIPT_EXTENSION),
            script_body: body.to_string(),
            build_file: BUILD_FILE.to_string(),
            build_body: generate_build_file(script_name),
        }
    }
}
