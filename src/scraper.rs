// Website scraper wrapper. Runs the Lightpanda Node scraper as a subprocess
// and pulls the JSON payload out of its mixed stdout.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

const DEFAULT_SCRIPT: &str = "lightpanda-scraper/hybrid-scraper.js";
const DEFAULT_TIMEOUT_SECONDS: u64 = 75;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Lightpanda scraper is not available on the server")]
    ScriptMissing,
    #[error("Lightpanda scraper timed out before completing")]
    Timeout,
    #[error("Lightpanda scraper failed: {0}")]
    Failed(String),
    #[error("Scraper output could not be parsed as JSON: {0}")]
    BadOutput(String),
}

/// Marketing context scraped from a company website
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedSite {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
}

#[derive(Clone)]
pub struct LightpandaScraper {
    script: PathBuf,
    timeout: Duration,
}

impl LightpandaScraper {
    pub fn new() -> Self {
        let script = std::env::var("SCRAPER_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCRIPT));
        let timeout_seconds = std::env::var("SCRAPER_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        Self {
            script,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub async fn scrape(&self, url: &str) -> Result<ScrapedSite, ScrapeError> {
        if !self.script.exists() {
            return Err(ScrapeError::ScriptMissing);
        }

        tracing::info!("🔎 Scraping website context: {}", url);

        let mut command = Command::new("node");
        command
            .arg(&self.script)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(parent) = self.script.parent() {
            command.current_dir(parent);
        }

        let child = command
            .spawn()
            .map_err(|e| ScrapeError::Failed(format!("Failed to spawn node: {}", e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| ScrapeError::Failed(format!("Scraper I/O error: {}", e)))?
            }
            Err(_) => return Err(ScrapeError::Timeout),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(ScrapeError::Failed(stderr));
        }

        let blob = extract_json_blob(&stdout).ok_or_else(|| {
            ScrapeError::BadOutput(if stderr.is_empty() {
                "no JSON object in scraper stdout".to_string()
            } else {
                format!("scraper stderr: {}", stderr)
            })
        })?;

        serde_json::from_str(&blob).map_err(|e| ScrapeError::BadOutput(e.to_string()))
    }
}

/// Find the last balanced `{...}` in mixed output that parses as JSON.
/// The scraper prints progress lines around its payload, so a plain
/// `serde_json::from_str` on the whole stream never works.
pub fn extract_json_blob(raw_output: &str) -> Option<String> {
    let mut candidates: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    let mut start_index: Option<usize> = None;

    for (index, ch) in raw_output.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start_index = Some(index);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(start) = start_index.take() {
                            candidates.push(&raw_output[start..=index]);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    candidates
        .into_iter()
        .rev()
        .map(str::trim)
        .find(|snippet| serde_json::from_str::<serde_json::Value>(snippet).is_ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_blob_from_noisy_output() {
        let raw = "booting browser...\n{\"title\": \"Acme\", \"textContent\": \"We sell anvils\"}\ndone";
        let blob = extract_json_blob(raw).unwrap();
        let parsed: ScrapedSite = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Acme"));
        assert_eq!(parsed.text_content.as_deref(), Some("We sell anvils"));
    }

    #[test]
    fn test_extract_json_blob_prefers_last_valid_object() {
        let raw = "{\"phase\": \"loading\"} progress... {\"title\": \"Final\"}";
        assert_eq!(extract_json_blob(raw).unwrap(), "{\"title\": \"Final\"}");
    }

    #[test]
    fn test_extract_json_blob_skips_unbalanced_and_invalid() {
        assert!(extract_json_blob("no json here {").is_none());
        let raw = "{not json} {\"ok\": true}";
        assert_eq!(extract_json_blob(raw).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn test_scraped_site_tolerates_missing_fields() {
        let parsed: ScrapedSite = serde_json::from_str("{}").unwrap();
        assert!(parsed.title.is_none());
        assert!(parsed.source_url.is_none());
    }
}
