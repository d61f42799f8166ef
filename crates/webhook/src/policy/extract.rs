use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::Pod;

use crate::registry::TargetResources;

/// Extended resource names requested by any container or init-container of
/// the pod, restricted to the configured target set. Only resource
/// *requests* count, limits are ignored.
pub fn demanded_resources(pod: &Pod, targets: &TargetResources) -> BTreeSet<String> {
    let mut demanded = BTreeSet::new();

    let Some(spec) = pod.spec.as_ref() else {
        return demanded;
    };

    let init_containers = spec.init_containers.iter().flatten();
    for container in spec.containers.iter().chain(init_containers) {
        collect_requested_targets(container, targets, &mut demanded);
    }

    demanded
}

fn collect_requested_targets(
    container: &Container,
    targets: &TargetResources,
    demanded: &mut BTreeSet<String>,
) {
    let Some(requests) = container
        .resources
        .as_ref()
        .and_then(|resources| resources.requests.as_ref())
    else {
        return;
    };

    for resource_name in requests.keys() {
        if targets.contains(resource_name) {
            demanded.insert(resource_name.clone());
        }
    }
}

/// Toleration keys already present on the pod spec, restricted to the
/// target set. A wildcard toleration (empty key, Exists) never covers a
/// target resource: the webhook always synthesizes resource-specific
/// tolerations.
pub fn existing_toleration_keys(pod: &Pod, targets: &TargetResources) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();

    let tolerations = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.tolerations.as_ref());

    for toleration in tolerations.iter().flat_map(|t| t.iter()) {
        if let Some(key) = toleration.key.as_deref() {
            if !key.is_empty() && targets.contains(key) {
                keys.insert(key.to_string());
            }
        }
    }

    keys
}

/// Target resources the pod demands but does not yet tolerate. An empty
/// result means no mutation is needed.
pub fn tolerations_to_add(pod: &Pod, targets: &TargetResources) -> BTreeSet<String> {
    let demanded = demanded_resources(pod, targets);
    let existing = existing_toleration_keys(pod, targets);
    demanded.difference(&existing).cloned().collect()
}
