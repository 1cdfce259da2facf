use cartkeep_core::{Config, Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of proxy resolution for the shop endpoint.
#[derive(Debug, PartialEq, Eq)]
enum ProxyResolution {
    UseProxy(String),
    /// `shop.proxy = ""` or the host is listed in `network.noProxy`.
    ForceDirectConnect,
    /// Nothing configured; reqwest reads HTTP(S)_PROXY itself.
    None,
}

/// Rules: exact host, `*.example.com` (subdomains only), `.example.com` (domain and subdomains).
fn is_no_proxy(host: &str, no_proxy_list: &[String]) -> bool {
    let host = host.to_lowercase();
    no_proxy_list.iter().any(|rule| {
        let rule = rule.trim().to_lowercase();
        if rule.is_empty() {
            false
        } else if let Some(suffix) = rule.strip_prefix("*.") {
            host.ends_with(&format!(".{}", suffix))
        } else if let Some(suffix) = rule.strip_prefix('.') {
            host == suffix || host.ends_with(&format!(".{}", suffix))
        } else {
            host == rule
        }
    })
}

fn resolve_proxy(
    shop_proxy: Option<&str>,
    global_proxy: Option<&str>,
    no_proxy: &[String],
    api_base: &str,
) -> ProxyResolution {
    match shop_proxy {
        Some("") => return ProxyResolution::ForceDirectConnect,
        Some(p) => return ProxyResolution::UseProxy(p.to_string()),
        None => {}
    }

    match global_proxy {
        Some(global) if !global.is_empty() => {
            let host = url::Url::parse(api_base)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_string()));
            match host {
                Some(host) if is_no_proxy(&host, no_proxy) => ProxyResolution::ForceDirectConnect,
                _ => ProxyResolution::UseProxy(global.to_string()),
            }
        }
        _ => ProxyResolution::None,
    }
}

/// Headers every cart request carries: the shop only answers its AJAX
/// endpoints for XHR-looking requests, and the cookie selects the cart.
fn default_headers(session_cookie: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
    if let Some(cookie) = session_cookie.map(str::trim).filter(|c| !c.is_empty()) {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| Error::Config(format!("Invalid session cookie: {}", e)))?;
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

/// Build the HTTP client used for every call to the shop's cart API.
///
/// The request timeout bounds each remote call so a stalled server cannot
/// hang a replace/clear batch forever.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let api_base = config.api_base();
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.shop.request_timeout_secs.max(1)))
        .default_headers(default_headers(config.shop.session_cookie.as_deref())?);

    match resolve_proxy(
        config.shop.proxy.as_deref(),
        config.network.proxy.as_deref(),
        &config.network.no_proxy,
        api_base,
    ) {
        ProxyResolution::UseProxy(proxy_url) => match Proxy::all(&proxy_url) {
            Ok(p) => {
                info!(proxy = %proxy_url, api_base = %api_base, "Cart API using proxy");
                builder = builder.proxy(p);
            }
            Err(e) => {
                warn!(error = %e, proxy = %proxy_url, "Invalid proxy URL, falling back to direct connect");
            }
        },
        ProxyResolution::ForceDirectConnect => {
            info!(api_base = %api_base, "Cart API forced to direct connect");
            builder = builder.no_proxy();
        }
        ProxyResolution::None => {}
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}
