//! Land title registry (LTSA) client and the subset of its models the API
//! consumes.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::LtsaConfig;
use crate::external::http::{build_client, join_url, send_json, HttpClientRequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelStatus {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
    #[serde(other)]
    Unknown,
}

impl Default for ParcelStatus {
    fn default() -> Self {
        ParcelStatus::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionOfLand {
    pub parcel_identifier: String,
    pub full_legal_description: String,
    #[serde(default)]
    pub parcel_status: ParcelStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummary {
    pub title_number: String,
    pub land_title_district: Option<String>,
    pub land_title_district_code: String,
    pub parcel_identifier: Option<String>,
    /// `REGISTERED` for an active title
    pub status: String,
    pub first_owner: Option<String>,
}

impl TitleSummary {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("REGISTERED")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummariesResponse {
    #[serde(default)]
    pub title_summaries: Vec<TitleSummary>,
}

/// An LTSA order. The product specific body is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtsaOrder {
    pub order_id: Option<String>,
    pub product_type: String,
    pub status: Option<String>,
    #[serde(default)]
    pub product_order_parameters: serde_json::Value,
    #[serde(default)]
    pub order_response: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWrapper {
    pub order: LtsaOrder,
}

/// Everything the registry returned for one parcel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtsaOrders {
    pub title_orders: Vec<LtsaOrder>,
    pub parcel_info: Option<LtsaOrder>,
}

#[async_trait::async_trait]
pub trait LtsaClient: Send + Sync {
    async fn get_title_summaries(&self, pid: &str) -> Result<Vec<TitleSummary>, HttpClientRequestError>;
    async fn post_title_order(
        &self,
        title_number: &str,
        land_title_district_code: &str,
    ) -> Result<LtsaOrder, HttpClientRequestError>;
    async fn post_parcel_info_order(&self, pid: &str) -> Result<LtsaOrder, HttpClientRequestError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

/// reqwest backed client. Logs in as the integrator on first use and
/// reuses the access token until the registry rejects it.
pub struct HttpLtsaClient {
    client: reqwest::Client,
    config: LtsaConfig,
    token: Mutex<Option<String>>,
}

impl HttpLtsaClient {
    pub fn new(config: LtsaConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, HttpClientRequestError> {
        let cached = self.token.lock().clone();
        if let Some(token) = cached {
            return Ok(token);
        }
        let url = join_url(&self.config.host, "login/integrator");
        let body = json!({
            "integratorUsername": self.config.integrator_username,
            "integratorPassword": self.config.integrator_password,
        });
        let login: LoginResponse = send_json(self.client.post(&url).json(&body), &url).await?;
        *self.token.lock() = Some(login.access_token.clone());
        log::debug!("Obtained LTSA access token");
        Ok(login.access_token)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, HttpClientRequestError> {
        let token = self.access_token().await?;
        let result = send_json(
            request.header("X-Authorization", format!("Bearer {}", token)),
            url,
        )
        .await;
        if matches!(&result, Err(e) if e.status == Some(401)) {
            // Expired token; the next call logs in again
            *self.token.lock() = None;
        }
        result
    }

    async fn post_order(&self, order: serde_json::Value) -> Result<LtsaOrder, HttpClientRequestError> {
        let url = join_url(&self.config.host, "orders");
        let wrapper: OrderWrapper = self
            .send(self.client.post(&url).json(&json!({ "order": order })), &url)
            .await?;
        Ok(wrapper.order)
    }
}

#[async_trait::async_trait]
impl LtsaClient for HttpLtsaClient {
    async fn get_title_summaries(&self, pid: &str) -> Result<Vec<TitleSummary>, HttpClientRequestError> {
        let url = join_url(
            &self.config.host,
            &format!("titleSummaries?filter=parcelIdentifier:{}", pid),
        );
        let response: TitleSummariesResponse = self.send(self.client.get(&url), &url).await?;
        Ok(response.title_summaries)
    }

    async fn post_title_order(
        &self,
        title_number: &str,
        land_title_district_code: &str,
    ) -> Result<LtsaOrder, HttpClientRequestError> {
        self.post_order(json!({
            "productType": "title",
            "fileReference": "PIMS",
            "productOrderParameters": {
                "titleNumber": title_number,
                "landTitleDistrictCode": land_title_district_code,
                "includeCancelledInfo": false,
            }
        }))
        .await
    }

    async fn post_parcel_info_order(&self, pid: &str) -> Result<LtsaOrder, HttpClientRequestError> {
        self.post_order(json!({
            "productType": "parcelInfo",
            "fileReference": "PIMS",
            "productOrderParameters": {
                "parcelIdentifier": pid,
            }
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parcel_status_reads_single_letter_codes() {
        let land: DescriptionOfLand = serde_json::from_str(
            r#"{"parcelIdentifier":"001505360","fullLegalDescription":"LOT 1","parcelStatus":"I"}"#,
        )
        .unwrap();
        assert_eq!(land.parcel_status, ParcelStatus::Inactive);

        let land: DescriptionOfLand = serde_json::from_str(
            r#"{"parcelIdentifier":"001505360","fullLegalDescription":"LOT 1","parcelStatus":"X"}"#,
        )
        .unwrap();
        assert_eq!(land.parcel_status, ParcelStatus::Unknown);
    }

    #[test]
    fn only_registered_titles_are_active() {
        let summary = TitleSummary {
            title_number: "CA1234567".to_string(),
            land_title_district: None,
            land_title_district_code: "VA".to_string(),
            parcel_identifier: Some("001505360".to_string()),
            status: "registered".to_string(),
            first_owner: None,
        };
        assert!(summary.is_active());
        assert!(!TitleSummary {
            status: "CANCELLED".to_string(),
            ..summary
        }
        .is_active());
    }
}
