use cartkeep_storage::price_divs_hidden;

use super::Session;

pub async fn toggle() -> anyhow::Result<()> {
    let session = Session::open()?;
    let response = session.workflows.toggle_prices().await?;
    let hidden = response
        .get("hidden")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    println!("✓ Prices are now {}", if hidden { "hidden" } else { "shown" });
    Ok(())
}

pub async fn status() -> anyhow::Result<()> {
    let session = Session::open()?;
    let hidden = price_divs_hidden(session.store.as_ref())?;
    println!("Prices: {}", if hidden { "hidden" } else { "shown" });
    println!("Hold {} on a shop page to peek.", session.config.shortcuts.hold_combo);
    Ok(())
}
