use crate::error::ApiError;
use crate::model::{CalendarEntry, NewsAlert, NewsAlertLite, NewsEvent};
use crate::state::{DateRange, Detail, DetailKind, DisplayMode};

use http::{Request, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use url::form_urlencoded;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

/// Read access to the alerts/events API.
pub trait NewsApi: Clone + Send + Sync + 'static {
    fn find_alerts(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<NewsAlertLite>, ApiError>> + Send;

    fn find_events(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<NewsEvent>, ApiError>> + Send;

    fn get_alert(&self, id: &str) -> impl Future<Output = Result<NewsAlert, ApiError>> + Send;

    fn get_event(&self, id: &str) -> impl Future<Output = Result<NewsEvent, ApiError>> + Send;
}

#[derive(Clone, Debug)]
pub struct NewsClient {
    client: HttpsClient,
    api_host: String,
}

impl NewsClient {
    pub fn new(api_host: &str, insecure: bool) -> Result<Self, ApiError> {
        let api_host = api_host.trim_end_matches('/').to_string();
        // Fail early on a host that can never produce a valid request.
        api_host
            .parse::<Uri>()
            .map_err(|source| ApiError::InvalidUri {
                url: api_host.clone(),
                source,
            })?;

        let https_connector = if insecure {
            let tls_config = rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth();

            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            let (added, _ignored) = root_store.add_parsable_certificates(result.certs);

            if added == 0 {
                tracing::warn!("No valid system certificates found; only plain http will work");
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        };

        let client = Client::builder(TokioExecutor::new()).build(https_connector);
        Ok(Self { client, api_host })
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_host, path)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let uri: Uri = url.parse().map_err(|source| ApiError::InvalidUri {
            url: url.to_string(),
            source,
        })?;
        let req = Request::get(uri)
            .header(http::header::ACCEPT, "application/json")
            .body(String::new())?;

        tracing::debug!(url, "GET");
        let resp = self.client.request(req).await?;
        let status = resp.status();
        let body = resp.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let bytes = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Range queries answer `null` instead of `[]` when nothing matched.
    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ApiError> {
        let bytes = self.get_bytes(url).await?;
        if is_null_body(&bytes) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl NewsApi for NewsClient {
    async fn find_alerts(&self, range: DateRange) -> Result<Vec<NewsAlertLite>, ApiError> {
        let url = self.url(&format!(
            "find_alerts/{}/{}",
            range.start_str(),
            range.end_str()
        ));
        self.get_list(&url).await
    }

    async fn find_events(&self, range: DateRange) -> Result<Vec<NewsEvent>, ApiError> {
        let url = self.url(&format!(
            "find_events/{}/{}",
            range.start_str(),
            range.end_str()
        ));
        self.get_list(&url).await
    }

    async fn get_alert(&self, id: &str) -> Result<NewsAlert, ApiError> {
        let url = self.url(&format!("alert/{}", path_segment(id)));
        self.get_json(&url).await
    }

    async fn get_event(&self, id: &str) -> Result<NewsEvent, ApiError> {
        let url = self.url(&format!("event/{}", path_segment(id)));
        self.get_json(&url).await
    }
}

/// Escapes an identifier so it stays a single path segment.
fn path_segment(id: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    if encoded == "." || encoded == ".." {
        encoded.replace('.', "%2E")
    } else {
        encoded
    }
}

fn is_null_body(bytes: &[u8]) -> bool {
    let trimmed = bytes.trim_ascii();
    trimmed.is_empty() || trimmed == b"null" || trimmed == b"\"null\""
}

/// Range fetch backing the calendar. Failures are logged and yield an empty
/// list so the calendar always renders.
pub async fn fetch_entries<A: NewsApi>(
    api: &A,
    range: DateRange,
    mode: DisplayMode,
) -> Vec<CalendarEntry> {
    let result = match mode {
        DisplayMode::Alerts => api
            .find_alerts(range)
            .await
            .map(|alerts| alerts.iter().map(NewsAlertLite::to_entry).collect()),
        DisplayMode::Events => api
            .find_events(range)
            .await
            .map(|events| events.iter().map(NewsEvent::to_entry).collect()),
    };

    match result {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(%range, %mode, "Failed getting {} data: {}", mode, e);
            Vec::new()
        }
    }
}

pub async fn fetch_detail<A: NewsApi>(
    api: &A,
    kind: DetailKind,
    id: &str,
) -> Result<Detail, ApiError> {
    match kind {
        DetailKind::Alert => api.get_alert(id).await.map(Detail::Alert),
        DetailKind::Event => api.get_event(id).await.map(Detail::Event),
    }
}

#[derive(Debug)]
struct NoVerifier;
impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &[rustls::pki_types::CertificateDer<'_>],
        _: &rustls::pki_types::ServerName<'_>,
        _: &[u8],
        _: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }
    fn verify_tls12_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn verify_tls13_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            RSA_PSS_SHA256,
            ED25519,
        ]
    }
}
