use cartkeep_router::ShortcutDispatcher;

use super::{report, Session};

pub async fn run(command: &str, url: Option<&str>) -> anyhow::Result<()> {
    let session = Session::open()?;
    let dispatcher = ShortcutDispatcher::from_config(session.client.clone(), &session.config);

    match dispatcher.on_command(command, url).await {
        Some(response) => report(&response),
        None => {
            println!("Shortcut '{}' does not apply here.", command);
            Ok(())
        }
    }
}
