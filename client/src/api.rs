use gloo_net::http::{Request, RequestBuilder};
use oblast_map_core::api::{
    ApiError, CertificateEligibility, CreatePinRequest, DonationStatus, Endpoint, Method, PinList,
    PinRecord, RegionSummary, TestSubmission, attachable_images, created_pin_id, decode_ack,
    decode_envelope, error_for_status,
};
use oblast_map_core::config::{DEFAULT_API_BASE_URL, PINS_PAGE_LIMIT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use web_sys::{File, FormData};

use crate::session;

/// REST client for the adventures/certificates backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(option_env!("OBLAST_API_URL").unwrap_or(DEFAULT_API_BASE_URL))
    }
}

fn transport(err: gloo_net::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn form_error(err: JsValue) -> ApiError {
    ApiError::Transport(format!("could not build form data: {err:?}"))
}

async fn read_ok_body(request: Request) -> Result<String, ApiError> {
    let resp = request.send().await.map_err(transport)?;
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    if !resp.ok() {
        return Err(error_for_status(resp.status(), &body));
    }
    Ok(body)
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn builder(&self, endpoint: &Endpoint<'_>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let builder = match endpoint.method() {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
        };
        match session::token() {
            Some(token) if !endpoint.is_public() => {
                builder.header("Authorization", &format!("Bearer {token}"))
            }
            _ => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<T, ApiError> {
        let request = self.builder(&endpoint).build().map_err(transport)?;
        decode_envelope(&read_ok_body(request).await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.builder(&endpoint).json(body).map_err(transport)?;
        decode_envelope(&read_ok_body(request).await?)
    }

    pub async fn region_summary(&self) -> Result<Vec<RegionSummary>, ApiError> {
        self.get(Endpoint::RegionSummary).await
    }

    pub async fn pins_by_region(&self, region_id: &str) -> Result<Vec<PinRecord>, ApiError> {
        let list: PinList = self
            .get(Endpoint::PinsByRegion {
                region_id,
                limit: PINS_PAGE_LIMIT,
                offset: 0,
            })
            .await?;
        Ok(list.into_vec())
    }

    /// Submit a pin. Returns the backend id when the response carries one.
    pub async fn create_pin(&self, req: &CreatePinRequest) -> Result<Option<String>, ApiError> {
        let data: serde_json::Value = self.post(Endpoint::CreatePin, req).await?;
        Ok(created_pin_id(&data))
    }

    /// Submit a pin with photos as `multipart/form-data`.
    pub async fn create_pin_with_images(
        &self,
        req: &CreatePinRequest,
        files: &[File],
    ) -> Result<Option<String>, ApiError> {
        let form = FormData::new().map_err(form_error)?;
        for (name, value) in req.form_fields() {
            form.append_with_str(name, &value).map_err(form_error)?;
        }
        for file in attachable_images(files) {
            form.append_with_blob_and_filename("images", file, &file.name())
                .map_err(form_error)?;
        }
        // No explicit content type: the browser adds the multipart boundary.
        let request = self
            .builder(&Endpoint::CreatePin)
            .body(form)
            .map_err(transport)?;
        let data: serde_json::Value = decode_envelope(&read_ok_body(request).await?)?;
        Ok(created_pin_id(&data))
    }

    /// Record a finished region test.
    pub async fn submit_test(&self, submission: &TestSubmission) -> Result<(), ApiError> {
        let request = self
            .builder(&Endpoint::SubmitTest)
            .json(submission)
            .map_err(transport)?;
        decode_ack(&read_ok_body(request).await?)
    }

    pub async fn donation_status(&self) -> Result<DonationStatus, ApiError> {
        self.get(Endpoint::DonationStatus).await
    }

    pub async fn certificate_eligibility(&self) -> Result<CertificateEligibility, ApiError> {
        self.get(Endpoint::CertificateEligibility).await
    }

    /// Raw certificate document bytes.
    pub async fn download_certificate(&self) -> Result<Vec<u8>, ApiError> {
        let request = self
            .builder(&Endpoint::GenerateCertificate)
            .build()
            .map_err(transport)?;
        let resp = request.send().await.map_err(transport)?;
        if !resp.ok() {
            let body = resp.text().await.unwrap_or_default();
            return Err(error_for_status(resp.status(), &body));
        }
        resp.binary()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://example.org/api/v1/");
        assert_eq!(client.base_url, "https://example.org/api/v1");
    }
}
