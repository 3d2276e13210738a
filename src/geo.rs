use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::GeoSeriesAccession;
use crate::error::KiraError;

const GEO_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/geo/series";

pub trait GeoClient: Send + Sync {
    fn download_url(&self, url: &str, destination: &Path) -> Result<(), KiraError>;
}

#[derive(Clone)]
pub struct GeoHttpClient {
    client: Client,
}

impl GeoHttpClient {
    pub fn new() -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-geo/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::GeoHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| KiraError::GeoHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<(), KiraError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "GEO request failed".to_string());
            return Err(KiraError::GeoStatus { status, message });
        }
        let parent = destination
            .parent()
            .ok_or_else(|| KiraError::Filesystem("invalid destination path".to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("kira-geo-download")
            .tempfile_in(parent)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, temp.as_file_mut())
            .map_err(|err| KiraError::GeoHttp(err.to_string()))?;
        temp.persist(destination)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, KiraError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::debug!(status, attempt, "retrying GEO request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::debug!(error = %err, attempt, "retrying GEO request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(KiraError::GeoHttp(err.to_string()));
                }
            }
        }
    }
}

impl GeoClient for GeoHttpClient {
    fn download_url(&self, url: &str, destination: &Path) -> Result<(), KiraError> {
        let url = normalize_url(url);
        tracing::info!(%url, destination = %destination.display(), "downloading series matrix");
        let response = self.send_with_retries(&url)?;
        self.write_response_to_file(response, destination)
    }
}

/// Directory bucket GEO uses for a series: the last three digits become `nnn`.
pub fn series_prefix(accession: &GeoSeriesAccession) -> String {
    let digits = accession.digits();
    if digits.len() <= 3 {
        return "GSEnnn".to_string();
    }
    let head = &digits[..digits.len() - 3];
    format!("GSE{}nnn", head)
}

pub fn series_matrix_file_name(accession: &GeoSeriesAccession) -> String {
    format!("{}_series_matrix.txt.gz", accession.as_str())
}

pub fn series_matrix_url(accession: &GeoSeriesAccession) -> String {
    format!(
        "{GEO_BASE_URL}/{prefix}/{acc}/matrix/{file}",
        prefix = series_prefix(accession),
        acc = accession.as_str(),
        file = series_matrix_file_name(accession)
    )
}

pub fn normalize_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("ftp://ftp.ncbi.nlm.nih.gov/") {
        return format!("https://ftp.ncbi.nlm.nih.gov/{}", rest);
    }
    url.to_string()
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_replaces_last_three_digits() {
        let acc: GeoSeriesAccession = "GSE68599".parse().unwrap();
        assert_eq!(series_prefix(&acc), "GSE68nnn");

        let short: GeoSeriesAccession = "GSE12".parse().unwrap();
        assert_eq!(series_prefix(&short), "GSEnnn");

        let four: GeoSeriesAccession = "GSE1234".parse().unwrap();
        assert_eq!(series_prefix(&four), "GSE1nnn");
    }

    #[test]
    fn matrix_url_layout() {
        let acc: GeoSeriesAccession = "GSE68599".parse().unwrap();
        let url = series_matrix_url(&acc);
        assert!(url.starts_with("https://ftp.ncbi.nlm.nih.gov/geo/series/"));
        assert!(url.ends_with("GSE68nnn/GSE68599/matrix/GSE68599_series_matrix.txt.gz"));
    }

    #[test]
    fn ftp_urls_are_rewritten() {
        assert_eq!(
            normalize_url("ftp://ftp.ncbi.nlm.nih.gov/geo/series/GSE1nnn/GSE1000/suppl/x.tar"),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/GSE1nnn/GSE1000/suppl/x.tar"
        );
        assert_eq!(normalize_url("https://example.org/a"), "https://example.org/a");
    }
}
