use anyhow::{anyhow, Context, Result};
use reqwest::Client;

use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::state::Config;

/// Remote CSV source. The occupancy feed is served behind a certificate
/// chain that does not validate, so verification is disabled on the client.
pub struct CsvSource {
    client: Client,
    url: String,
}

impl CsvSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            url: cfg.csv_url.clone(),
        })
    }

    /// Single fetch, no retry. Any transport or HTTP error aborts the run.
    pub async fn fetch_raw(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("fetch {}", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("fetch {} failed: HTTP {}", self.url, status));
        }

        let body = resp.text().await?;
        log(
            Level::Info,
            Domain::Fetch,
            "csv_fetched",
            obj(&[
                ("url", v_str(&self.url)),
                ("bytes", v_num(body.len() as f64)),
            ]),
        );
        Ok(body)
    }
}
