use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use poem::handler;
use poem::http::StatusCode;
use poem::web::Data;
use poem::Body;
use poem::Request;
use poem::Response;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::types::AdmissionRequest;
use super::types::AdmissionResponse;
use super::types::AdmissionReview;
use crate::policy::build_tolerations_patch;
use crate::policy::demanded_resources;
use crate::policy::existing_toleration_keys;
use crate::policy::tolerations_to_add;
use crate::registry::TargetResources;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Handle `POST /mutate`.
#[handler]
pub async fn handle_mutate(
    req: &Request,
    body: Body,
    Data(targets): Data<&Arc<TargetResources>>,
) -> Response {
    serve_admission(req, body, targets, mutate).await
}

/// Handle `POST /validate`.
#[handler]
pub async fn handle_validate(
    req: &Request,
    body: Body,
    Data(targets): Data<&Arc<TargetResources>>,
) -> Response {
    serve_admission(req, body, targets, validate).await
}

/// Shared transport flow for both endpoints: read body, check the media
/// type, decode the envelope, delegate to the evaluation function and write
/// the AdmissionReview reply. Decode failures stay inside the admission
/// protocol (HTTP 200 with a structured error response); only a response
/// marshal failure is a server fault.
async fn serve_admission(
    req: &Request,
    body: Body,
    targets: &TargetResources,
    evaluate: fn(&AdmissionRequest, &TargetResources) -> AdmissionResponse,
) -> Response {
    let body = body.into_vec().await.unwrap_or_default();
    if body.is_empty() {
        warn!("Rejecting admission request with empty body");
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("empty body");
    }

    if req.content_type() != Some(JSON_CONTENT_TYPE) {
        warn!(
            content_type = req.content_type().unwrap_or("<none>"),
            "Rejecting admission request with unexpected content type"
        );
        return Response::builder()
            .status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .body("invalid Content-Type, expect `application/json`");
    }

    let (review, response) = match serde_json::from_slice::<AdmissionReview>(&body) {
        Ok(review) => {
            let mut response = match review.request.as_ref() {
                Some(request) => evaluate(request, targets),
                None => {
                    warn!("Admission review carries no request");
                    AdmissionResponse::denied("admission review has no request")
                }
            };
            if let Some(request) = review.request.as_ref() {
                response.uid = request.uid.clone();
            }
            (review, response)
        }
        Err(e) => {
            warn!(error = %e, "Can't decode admission review body");
            (
                AdmissionReview::default(),
                AdmissionResponse::denied(e.to_string()),
            )
        }
    };

    let reply = response.into_review(&review);
    match serde_json::to_vec(&reply) {
        Ok(bytes) => Response::builder()
            .content_type(JSON_CONTENT_TYPE)
            .body(bytes),
        Err(e) => {
            error!(error = %e, "Couldn't encode admission response");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(format!("couldn't encode response: {e}"))
        }
    }
}

fn decode_pod(request: &AdmissionRequest) -> Result<Pod, AdmissionResponse> {
    let Some(object) = request.object.clone() else {
        return Err(AdmissionResponse::denied("admission request has no object"));
    };
    serde_json::from_value(object).map_err(|e| {
        warn!(error = %e, "Could not decode raw pod object");
        AdmissionResponse::denied(format!("could not decode pod object: {e}"))
    })
}

/// Mutating decision: compute the toleration delta and emit a JSON Patch
/// when it is non-empty.
pub fn mutate(request: &AdmissionRequest, targets: &TargetResources) -> AdmissionResponse {
    let pod = match decode_pod(request) {
        Ok(pod) => pod,
        Err(response) => return response,
    };

    let delta = tolerations_to_add(&pod, targets);
    if delta.is_empty() {
        debug!(
            pod_name = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
            "No mutation needed"
        );
        return AdmissionResponse::allowed();
    }

    match build_tolerations_patch(&pod, &delta) {
        Ok(patch) => {
            info!(
                pod_name = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
                patch = %String::from_utf8_lossy(&patch),
                "Appending tolerations for requested target resources"
            );
            AdmissionResponse::allowed().with_patch(&patch)
        }
        Err(e) => {
            warn!(error = ?e, "Could not build tolerations patch");
            AdmissionResponse::denied(format!("could not build tolerations patch: {e}"))
        }
    }
}

/// Validating decision: a pod may never tolerate a target resource it does
/// not request.
pub fn validate(request: &AdmissionRequest, targets: &TargetResources) -> AdmissionResponse {
    if !request.resource.is_pods() {
        debug!(
            resource = %request.resource.resource,
            "Skipping validation for non-pod admission request"
        );
        return AdmissionResponse::allowed();
    }

    let pod = match decode_pod(request) {
        Ok(pod) => pod,
        Err(response) => return response,
    };

    let demanded = demanded_resources(&pod, targets);
    let existing = existing_toleration_keys(&pod, targets);
    let offending: Vec<String> = existing.difference(&demanded).cloned().collect();

    if !offending.is_empty() {
        let keys = offending.join(", ");
        info!(
            pod_name = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
            keys = %keys,
            "Denying pod tolerating unrequested target resources"
        );
        return AdmissionResponse::denied(format!(
            "pod tolerates target resource(s) it does not request: {keys}"
        ));
    }

    AdmissionResponse::allowed()
}
