use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Substring an active tab URL must contain before commands are sent to it.
    #[serde(default = "default_host_match")]
    pub host_match: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Raw `Cookie` header value identifying the server-side cart.
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// Shop-specific proxy. `Some("")` forces a direct connection.
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_api_base() -> String {
    "https://wimoodshop.nl/ajax/cart".to_string()
}

fn default_host_match() -> String {
    "wimoodshop.nl".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            host_match: default_host_match(),
            request_timeout_secs: default_request_timeout(),
            session_cookie: None,
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub no_proxy: Vec<String>,
}

/// How a preparatory step reacts to its own failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum StepPolicy {
    /// Failures are logged and recorded as warnings; the procedure carries on.
    #[default]
    BestEffort,
    /// Any failure ends the procedure before the next step starts.
    Required,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Policy for draining the current cart before a saved cart is loaded.
    #[serde(default)]
    pub pre_clear_policy: StepPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityConfig {
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
    /// Text markers that make a heading count as price-bearing.
    #[serde(default = "default_heading_markers")]
    pub heading_markers: Vec<String>,
    #[serde(default = "default_hold_debounce_ms")]
    pub hold_debounce_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_selectors() -> Vec<String> {
    [
        ".product-detail__price",
        ".product-price",
        ".price",
        "[data-price]",
        ".cart-total",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_heading_markers() -> Vec<String> {
    ["€", "EUR", "excl. btw", "incl. btw", "totaal", "total"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_hold_debounce_ms() -> u64 {
    150
}

fn default_settle_delay_ms() -> u64 {
    100
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            selectors: default_selectors(),
            heading_markers: default_heading_markers(),
            hold_debounce_ms: default_hold_debounce_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutsConfig {
    /// Name of the discrete shortcut command bound in the host.
    #[serde(default = "default_toggle_command")]
    pub toggle_command: String,
    /// Raw key combination driving the hold-to-reveal gesture.
    #[serde(default = "default_hold_combo")]
    pub hold_combo: String,
}

fn default_toggle_command() -> String {
    "toggle-prices".to_string()
}

fn default_hold_combo() -> String {
    "Alt+Shift+H".to_string()
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            toggle_command: default_toggle_command(),
            hold_combo: default_hold_combo(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    #[serde(default = "default_response_timeout")]
    pub response_timeout_secs: u64,
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_response_timeout() -> u64 {
    60
}

fn default_bus_capacity() -> usize {
    32
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub visibility: VisibilityConfig,
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
    #[serde(default)]
    pub router: RouterConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Whether a tab URL belongs to the configured shop.
    pub fn is_shop_url(&self, url: &str) -> bool {
        let needle = self.shop.host_match.trim();
        !needle.is_empty() && url.contains(needle)
    }

    pub fn api_base(&self) -> &str {
        self.shop.api_base.trim_end_matches('/')
    }
}
