use cartkeep_core::{Config, Request, Response};
use tracing::{debug, info, warn};

use crate::bus::CommandClient;

/// Routes host-level shortcut commands to the page that should handle them.
pub struct ShortcutDispatcher {
    client: CommandClient,
    toggle_command: String,
    host_match: String,
}

impl ShortcutDispatcher {
    pub fn new(client: CommandClient, toggle_command: &str, host_match: &str) -> Self {
        Self {
            client,
            toggle_command: toggle_command.to_string(),
            host_match: host_match.trim().to_string(),
        }
    }

    pub fn from_config(client: CommandClient, config: &Config) -> Self {
        Self::new(
            client,
            &config.shortcuts.toggle_command,
            &config.shop.host_match,
        )
    }

    /// Returns the page's response when the command was forwarded, `None`
    /// when it did not apply. Delivery failures are logged, not raised.
    pub async fn on_command(&self, command: &str, active_url: Option<&str>) -> Option<Response> {
        if command != self.toggle_command {
            debug!(command, "Ignoring unbound shortcut command");
            return None;
        }
        let url = match active_url {
            Some(url) if !self.host_match.is_empty() && url.contains(&self.host_match) => url,
            _ => {
                debug!(command, "Active tab is not a shop page");
                return None;
            }
        };

        info!(command, url, "Forwarding price toggle shortcut");
        let response = self.client.send(Request::keyboard_toggle_prices()).await;
        if !response.success {
            warn!(error = response.error_message(), "Error sending keyboard toggle");
        }
        Some(response)
    }
}
