/// Default location of the occupancy CSV feed.
pub const DEFAULT_CSV_URL: &str =
    "https://raw.githubusercontent.com/Mrosg/aforo-gimnasio/main/aforo_dreamfit.csv";

/// Default output path for the rendered chart document.
pub const DEFAULT_OUT_HTML: &str = "aforo_semana.html";

#[derive(Clone)]
pub struct Config {
    pub csv_url: String,
    pub out_html: String,
    /// Open the chart in a browser after writing it. Disable for headless runs.
    pub open_view: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            csv_url: std::env::var("CSV_URL").unwrap_or_else(|_| DEFAULT_CSV_URL.to_string()),
            out_html: std::env::var("OUT_HTML").unwrap_or_else(|_| DEFAULT_OUT_HTML.to_string()),
            open_view: std::env::var("OPEN_VIEW")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(true),
        }
    }
}
