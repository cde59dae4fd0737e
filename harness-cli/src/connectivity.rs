//! Connectivity plan builder
//!
//! Turns operator supplied URLs into per-host checks for a delegate.

use anyhow::{Context, Result, anyhow};
use harness_core::domain::connectivity::{ConnectivityPlan, ConnectivityTest, DEFAULT_TARGETS};
use harness_core::domain::delegate::Delegate;
use reqwest::Url;

/// Prepend `https://` when the URL has no scheme
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn connectivity_test(raw: &str) -> Result<ConnectivityTest> {
    let normalized = normalize_url(raw);
    let url = Url::parse(&normalized).with_context(|| format!("Invalid URL: {}", raw))?;
    let hostname = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {}", raw))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("Cannot determine port for: {}", raw))?;

    Ok(ConnectivityTest::new(normalized, hostname, port))
}

/// Build checks for `urls`, or for the default targets when none are given
pub fn build_plan(delegate: Delegate, urls: &[String]) -> Result<ConnectivityPlan> {
    let connectivity_tests = if urls.is_empty() {
        DEFAULT_TARGETS
            .iter()
            .map(|url| connectivity_test(url))
            .collect::<Result<Vec<_>>>()?
    } else {
        urls.iter()
            .map(|url| connectivity_test(url))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(ConnectivityPlan {
        delegate,
        connectivity_tests,
    })
}
