//! Summary materialization
//!
//! After a refresh commits, the top countries by estimated GDP are handed to
//! a [`SummaryRenderer`] together with the fresh status. The work runs as a
//! detached task with its own error boundary: failures are logged and never
//! reach the refresh caller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use country_types::{CountryQuery, CountryRecord, StatusRecord};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::store::CountryStore;

/// Countries ranked on the summary by default
pub const DEFAULT_TOP_N: usize = 5;

/// Downstream consumer of the top-N projection
#[async_trait]
pub trait SummaryRenderer: Send + Sync {
    /// Produce the summary artifact for `top` and `status`
    async fn render(&self, top: &[CountryRecord], status: &StatusRecord) -> Result<()>;
}

/// Selects the top-N projection and drives the renderer
pub struct SummaryMaterializer {
    store: Arc<dyn CountryStore>,
    renderer: Arc<dyn SummaryRenderer>,
    top_n: usize,
}

impl SummaryMaterializer {
    pub fn new(store: Arc<dyn CountryStore>, renderer: Arc<dyn SummaryRenderer>) -> Self {
        Self {
            store,
            renderer,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn renderer(&self) -> Arc<dyn SummaryRenderer> {
        self.renderer.clone()
    }

    /// Query the top-N and render. Returns the number of countries rendered.
    pub async fn materialize(&self, status: &StatusRecord) -> Result<usize> {
        let top = self
            .store
            .find_all(&CountryQuery::top_by_gdp(self.top_n))
            .await
            .context("failed to select top countries")?;

        self.renderer
            .render(&top, status)
            .await
            .context("summary renderer failed")?;

        Ok(top.len())
    }

    /// [`materialize`](Self::materialize) with errors logged and dropped
    pub async fn run(&self, status: &StatusRecord) {
        match self.materialize(status).await {
            Ok(rendered) => info!("Summary materialized with {} countries", rendered),
            Err(e) => error!("Summary materialization failed: {:#}", e),
        }
    }

    /// Run on a detached task
    pub fn spawn(self: Arc<Self>, status: StatusRecord) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(&status).await })
    }
}

/// Format a value with a K/M/B/T suffix, two decimals
pub fn format_value(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if abs >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;
const BACKGROUND: &str = "#1e293b";
const PRIMARY: &str = "#fcd34d";
const SECONDARY: &str = "#e2e8f0";
const TERTIARY: &str = "#60a5fa";
const FONT: &str = "Arial, sans-serif";

/// Writes the summary card as an SVG file
pub struct SvgSummaryRenderer {
    output_path: PathBuf,
}

impl SvgSummaryRenderer {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Build the SVG document
    pub fn to_svg(top: &[CountryRecord], status: &StatusRecord) -> String {
        let last_refresh = status
            .last_refreshed_at
            .map(|at| at.format("%b %d, %Y %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        let mut svg = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            svg,
            r##"<svg width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <rect width="100%" height="100%" fill="{BACKGROUND}" rx="10"/>
  <text x="50%" y="35" dominant-baseline="middle" text-anchor="middle" font-family="{FONT}" font-size="28" fill="{PRIMARY}" font-weight="bold">Global Cache Summary</text>
  <text x="50%" y="80" dominant-baseline="middle" text-anchor="middle" font-family="{FONT}" font-size="16" fill="{SECONDARY}">Total Countries: {total}</text>
  <text x="50%" y="105" dominant-baseline="middle" text-anchor="middle" font-family="{FONT}" font-size="16" fill="{SECONDARY}">Last Refresh: {last_refresh} UTC</text>
  <text x="50%" y="155" dominant-baseline="middle" text-anchor="middle" font-family="{FONT}" font-size="20" fill="{TERTIARY}" font-weight="bold">Top {count} Estimated GDP (USD)</text>
"##,
            total = status.total_countries,
            count = top.len(),
        );

        for (index, country) in top.iter().enumerate() {
            let y = 190 + index * 35;
            let _ = write!(
                svg,
                r#"  <text x="150" y="{y}" dominant-baseline="middle" text-anchor="start" font-family="{FONT}" font-size="16" fill="{SECONDARY}">{rank}. {name}</text>
  <text x="450" y="{y}" dominant-baseline="middle" text-anchor="end" font-family="{FONT}" font-size="16" fill="{PRIMARY}" font-weight="bold">${gdp}</text>
"#,
                rank = index + 1,
                name = escape_xml(&country.name),
                gdp = format_value(country.estimated_gdp),
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[async_trait]
impl SummaryRenderer for SvgSummaryRenderer {
    async fn render(&self, top: &[CountryRecord], status: &StatusRecord) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create summary directory {parent:?}"))?;
        }

        let svg = Self::to_svg(top, status);
        tokio::fs::write(&self.output_path, svg)
            .await
            .with_context(|| format!("failed to write summary {:?}", self.output_path))?;

        debug!("Summary written to {:?}", self.output_path);
        Ok(())
    }
}
