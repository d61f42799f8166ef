//! Wire types for the AdmissionReview envelope.
//!
//! Only the fields this webhook reads or writes are modeled; serde skips
//! everything else in the request. The `patch` field carries base64-encoded
//! RFC 6902 bytes, matching how the API server expects byte slices in JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde::Serialize;

pub const JSON_PATCH_TYPE: &str = "JSONPatch";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub resource: GroupVersionResource,
    /// The object under admission, raw. Decoding it into a concrete Pod is
    /// a fallible step owned by the evaluation functions.
    pub object: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn is_pods(&self) -> bool {
        self.resource == "pods"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub message: String,
}

impl AdmissionResponse {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            ..Default::default()
        }
    }

    /// Denial or internal failure carried as a structured response, the way
    /// the admission protocol requires. `allowed` stays false.
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            result: Some(Status {
                message: message.into(),
            }),
            ..Default::default()
        }
    }

    pub fn with_patch(mut self, patch: &[u8]) -> Self {
        self.patch = Some(STANDARD.encode(patch));
        self.patch_type = Some(JSON_PATCH_TYPE.to_string());
        self
    }

    /// Wrap the response in an outgoing AdmissionReview, echoing the
    /// envelope identity of the incoming review when it carried one.
    pub fn into_review(self, incoming: &AdmissionReview) -> AdmissionReview {
        AdmissionReview {
            kind: incoming
                .kind
                .clone()
                .or_else(|| Some("AdmissionReview".to_string())),
            api_version: incoming
                .api_version
                .clone()
                .or_else(|| Some("admission.k8s.io/v1".to_string())),
            request: None,
            response: Some(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decodes_with_unknown_fields() {
        let body = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "operation": "CREATE",
                "userInfo": {"username": "admin"},
                "object": {"kind": "Pod"},
            },
        });

        let review: AdmissionReview = serde_json::from_value(body).unwrap();
        let request = review.request.expect("request should decode");
        assert_eq!(request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert!(request.resource.is_pods());
        assert!(request.object.is_some());
    }

    #[test]
    fn response_serializes_patch_as_base64() {
        let response = AdmissionResponse::allowed().with_patch(b"[]");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["allowed"], true);
        assert_eq!(value["patch"], "W10=", "patch bytes must be base64");
        assert_eq!(value["patchType"], "JSONPatch");
    }

    #[test]
    fn response_omits_absent_fields() {
        let response = AdmissionResponse::allowed();
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("patch"));
        assert!(!object.contains_key("patchType"));
        assert!(!object.contains_key("result"));
    }

    #[test]
    fn into_review_echoes_envelope_identity() {
        let incoming = AdmissionReview {
            kind: Some("AdmissionReview".to_string()),
            api_version: Some("admission.k8s.io/v1beta1".to_string()),
            ..Default::default()
        };

        let review = AdmissionResponse::allowed().into_review(&incoming);
        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1beta1"));
        assert!(review.request.is_none());

        let review = AdmissionResponse::allowed().into_review(&AdmissionReview::default());
        assert_eq!(review.kind.as_deref(), Some("AdmissionReview"));
        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
    }

    #[test]
    fn denied_carries_the_message() {
        let response = AdmissionResponse::denied("bad pod");
        assert!(!response.allowed);
        assert_eq!(response.result.unwrap().message, "bad pod");
    }
}
