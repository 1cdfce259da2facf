use cartkeep_core::{Config, Paths};
use std::io::{self, Write};

pub async fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();

    if paths.config_file().exists() && !force {
        print!("Config already exists. Overwrite? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    paths.ensure_dirs()?;
    Config::default().save(&paths.config_file())?;
    println!("✓ Created config: {}", paths.config_file().display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set shop.sessionCookie in {} to your shop session cookie",
        paths.config_file().display()
    );
    println!("  2. Run `cartkeep status` to verify configuration");
    println!("  3. Run `cartkeep cart show` to read your cart");

    Ok(())
}
