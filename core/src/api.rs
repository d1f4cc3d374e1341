//! Wire types for the adventures / tests / donations backend.
//!
//! Every JSON endpoint answers with the same envelope:
//! `{ "success": bool, "data": ..., "error": { "message": ... } }`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::MAX_PIN_IMAGES;
use crate::pins::PinType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server error {code}: {message}")]
    Status { code: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl<T> ApiEnvelope<T> {
    fn rejection(&self) -> ApiError {
        ApiError::Rejected(
            self.error
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| "server error".to_string()),
        )
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        self.data
            .ok_or_else(|| ApiError::Decode("envelope has no data".to_string()))
    }

    /// For endpoints whose payload the caller does not need.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }
}

/// Decode a 2xx body into its envelope payload.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope.into_result()
}

pub fn decode_ack(body: &str) -> Result<(), ApiError> {
    let envelope: ApiEnvelope<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope.into_ack()
}

/// Map a non-2xx response to an error, preferring the server's own message.
pub fn error_for_status(code: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|err| err.message)
        .unwrap_or_else(|| format!("server unavailable or returned an invalid response ({code})"));
    ApiError::Status { code, message }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Backend routes, relative to the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    RegionSummary,
    PinsByRegion {
        region_id: &'a str,
        limit: u32,
        offset: u32,
    },
    CreatePin,
    SubmitTest,
    DonationStatus,
    CertificateEligibility,
    GenerateCertificate,
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Self::CreatePin | Self::SubmitTest | Self::GenerateCertificate => Method::Post,
            _ => Method::Get,
        }
    }

    /// Path and query string; path segments are percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Self::RegionSummary => "/adventures/summary".to_string(),
            Self::PinsByRegion {
                region_id,
                limit,
                offset,
            } => format!(
                "/adventures/pins/{}?limit={limit}&offset={offset}&sortBy=newest",
                urlencoding::encode(region_id)
            ),
            Self::CreatePin => "/adventures/pins".to_string(),
            Self::SubmitTest => "/tests/submit".to_string(),
            Self::DonationStatus => "/donations/status".to_string(),
            Self::CertificateEligibility => "/certificates/eligibility".to_string(),
            Self::GenerateCertificate => "/certificates/generate".to_string(),
        }
    }

    /// Public routes work without a bearer token.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::RegionSummary | Self::PinsByRegion { .. })
    }
}

/// Id of a freshly created pin. Accepts `{id}`, `{pinId}` or `{pin: {id}}`,
/// with string or numeric ids.
pub fn created_pin_id(data: &serde_json::Value) -> Option<String> {
    let id = data
        .get("id")
        .or_else(|| data.get("pinId"))
        .or_else(|| data.get("pin").and_then(|pin| pin.get("id")))?;
    match id {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePinRequest {
    pub region_id: String,
    pub region_name: String,
    pub pin_type: PinType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl CreatePinRequest {
    /// Text parts of the `multipart/form-data` variant, in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("regionId", self.region_id.clone()),
            ("regionName", self.region_name.clone()),
            ("pinType", self.pin_type.as_str().to_string()),
            ("description", self.description.clone()),
        ];
        if let (Some(x), Some(y)) = (self.x, self.y) {
            fields.push(("x", x.to_string()));
            fields.push(("y", y.to_string()));
        }
        fields
    }
}

/// The leading files a pin submission may carry; extras are ignored.
pub fn attachable_images<T>(files: &[T]) -> &[T] {
    &files[..files.len().min(MAX_PIN_IMAGES)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRecord {
    pub id: String,
    pub region_id: String,
    #[serde(default)]
    pub region_name: Option<String>,
    pub pin_type: PinType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Pin listings come back either bare or wrapped with paging info.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PinList {
    Bare(Vec<PinRecord>),
    Paged {
        pins: Vec<PinRecord>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl PinList {
    pub fn into_vec(self) -> Vec<PinRecord> {
        match self {
            Self::Bare(pins) | Self::Paged { pins, .. } => pins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub region_id: String,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub pin_count: u32,
    #[serde(default)]
    pub visited_count: u32,
    #[serde(default)]
    pub want_to_visit_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission {
    pub region_id: String,
    pub region_name: String,
    pub score: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationStatus {
    pub has_donated: bool,
    pub status: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateEligibility {
    pub eligible: bool,
    pub passed_regions: u32,
    pub total_regions: u32,
    pub has_donated: bool,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_envelope_yields_data() {
        let body = r#"{"success":true,"data":{"hasDonated":true,"status":"verified"}}"#;
        let status: DonationStatus = decode_envelope(body).expect("valid envelope");
        assert!(status.has_donated);
        assert_eq!(status.status.as_deref(), Some("verified"));
        assert_eq!(status.amount, None);
    }

    #[test]
    fn unsuccessful_envelope_carries_server_message() {
        let body = r#"{"success":false,"error":{"message":"Region not found"}}"#;
        let err = decode_envelope::<RegionSummary>(body).unwrap_err();
        assert_eq!(err, ApiError::Rejected("Region not found".to_string()));
    }

    #[test]
    fn non_json_error_body_gets_generic_message() {
        let err = error_for_status(502, "<html>Bad Gateway</html>");
        match err {
            ApiError::Status { code, message } => {
                assert_eq!(code, 502);
                assert!(message.contains("502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let err = error_for_status(401, r#"{"success":false,"error":{"message":"Token expired"}}"#);
        assert_eq!(
            err,
            ApiError::Status {
                code: 401,
                message: "Token expired".to_string()
            }
        );
    }

    #[test]
    fn pin_list_accepts_bare_and_paged_payloads() {
        let bare = r#"{"success":true,"data":[{"id":"1","regionId":"Lvivska","pinType":"visited","description":"Castle"}]}"#;
        let pins = decode_envelope::<PinList>(bare).expect("bare list").into_vec();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].pin_type, PinType::Visited);

        let paged = r#"{"success":true,"data":{"pins":[{"id":"2","regionId":"Odeska","pinType":"wantToVisit","x":10.5,"y":3}],"total":1}}"#;
        let pins = decode_envelope::<PinList>(paged).expect("paged list").into_vec();
        assert_eq!(pins[0].pin_type, PinType::WantToVisit);
        assert_eq!(pins[0].x, Some(10.5));
        assert_eq!(pins[0].description, "");
    }

    #[test]
    fn create_pin_request_uses_camel_case_and_omits_missing_coordinates() {
        let req = CreatePinRequest {
            region_id: "Lvivska".to_string(),
            region_name: "Lviv".to_string(),
            pin_type: PinType::WantToVisit,
            description: "Coffee".to_string(),
            x: None,
            y: None,
        };
        let json = serde_json::to_value(&req).expect("serializable");
        assert_eq!(json["regionId"], "Lvivska");
        assert_eq!(json["pinType"], "wantToVisit");
        assert!(json.get("x").is_none());
    }

    #[test]
    fn ack_ignores_payload_shape() {
        assert_eq!(decode_ack(r#"{"success":true}"#), Ok(()));
        assert_eq!(decode_ack(r#"{"success":true,"data":{"score":7}}"#), Ok(()));
        assert!(matches!(
            decode_ack(r#"{"success":false}"#),
            Err(ApiError::Rejected(msg)) if msg == "server error"
        ));
    }

    #[test]
    fn multipart_fields_mirror_json_names() {
        let req = CreatePinRequest {
            region_id: "Odeska".to_string(),
            region_name: "Odesa".to_string(),
            pin_type: PinType::Visited,
            description: "Potemkin Stairs".to_string(),
            x: Some(12.5),
            y: Some(40.0),
        };
        let fields = req.form_fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["regionId", "regionName", "pinType", "description", "x", "y"]
        );
        assert_eq!(fields[2].1, "visited");
        assert_eq!(fields[4].1, "12.5");

        let without_point = CreatePinRequest { x: None, ..req };
        assert_eq!(without_point.form_fields().len(), 4);
    }

    #[test]
    fn image_attachments_are_capped() {
        let files: Vec<String> = (0..8).map(|i| format!("photo-{i}.jpg")).collect();
        let kept = attachable_images(&files);
        assert_eq!(kept.len(), MAX_PIN_IMAGES);
        assert_eq!(kept[0], "photo-0.jpg");
        assert_eq!(attachable_images(&files[..2]).len(), 2);
        assert!(attachable_images::<String>(&[]).is_empty());
    }

    #[test]
    fn endpoint_paths_match_backend_routes() {
        let pins = Endpoint::PinsByRegion {
            region_id: "Avtonomna Respublika Krym",
            limit: 50,
            offset: 0,
        };
        assert_eq!(
            pins.path(),
            "/adventures/pins/Avtonomna%20Respublika%20Krym?limit=50&offset=0&sortBy=newest"
        );
        assert_eq!(pins.method(), Method::Get);
        assert!(pins.is_public());

        assert_eq!(Endpoint::SubmitTest.path(), "/tests/submit");
        assert_eq!(Endpoint::SubmitTest.method(), Method::Post);
        assert!(!Endpoint::SubmitTest.is_public());
        assert_eq!(Endpoint::GenerateCertificate.method(), Method::Post);
    }

    #[test]
    fn created_pin_id_accepts_common_shapes() {
        let flat: serde_json::Value = serde_json::json!({"id": "abc"});
        let numeric: serde_json::Value = serde_json::json!({"pinId": 17});
        let nested: serde_json::Value = serde_json::json!({"pin": {"id": "n-1"}});
        assert_eq!(created_pin_id(&flat).as_deref(), Some("abc"));
        assert_eq!(created_pin_id(&numeric).as_deref(), Some("17"));
        assert_eq!(created_pin_id(&nested).as_deref(), Some("n-1"));
        assert_eq!(created_pin_id(&serde_json::json!({"ok": true})), None);
    }
}
