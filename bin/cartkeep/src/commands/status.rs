use cartkeep_core::{Config, Paths};
use cartkeep_storage::{price_divs_hidden, LocalStore, SavedCartStore};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("cartkeep status");
    println!("===============");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (not found, using defaults)" }
    );

    let storage_path = paths.storage_file();
    println!(
        "Storage:  {} {}",
        storage_path.display(),
        if storage_path.exists() { "✓" } else { "✗ (empty)" }
    );

    let config = Config::load_or_default(&paths)?;
    println!();
    println!("Cart API: {}", config.api_base());
    println!("Shop:     {}", config.shop.host_match);
    println!(
        "Session:  {}",
        if config.shop.session_cookie.is_some() { "✓ cookie set" } else { "✗ no cookie" }
    );
    println!("Pre-clear policy: {:?}", config.sync.pre_clear_policy);
    println!("Hold combo:       {}", config.shortcuts.hold_combo);

    let store = LocalStore::new(&paths);
    let hidden = price_divs_hidden(&store)?;
    let saved = SavedCartStore::new(store).list()?;
    println!();
    println!("Prices:      {}", if hidden { "hidden" } else { "shown" });
    println!("Saved carts: {}", saved.len());

    if !config_exists {
        println!();
        println!("Run `cartkeep onboard` to write a config file.");
    }

    Ok(())
}
