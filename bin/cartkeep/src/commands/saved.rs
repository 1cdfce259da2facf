use cartkeep_storage::SaveOutcome;

use super::Session;

pub async fn list() -> anyhow::Result<()> {
    let session = Session::open()?;
    let carts = session.workflows.list()?;

    if carts.is_empty() {
        println!("No saved carts yet.");
        return Ok(());
    }
    println!("{:<4} {:<24} {:>6} {:>6}  SAVED", "#", "NAME", "LINES", "ITEMS");
    for (index, cart) in carts.iter().enumerate() {
        let items: u32 = cart.products.iter().map(|l| l.quantity).sum();
        println!(
            "{:<4} {:<24} {:>6} {:>6}  {}",
            index,
            cart.name,
            cart.products.len(),
            items,
            cart.saved_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub async fn save(name: &str) -> anyhow::Result<()> {
    let session = Session::open()?;
    match session.workflows.save(name).await? {
        SaveOutcome::Created => println!("✓ Cart saved as '{}'", name.trim()),
        SaveOutcome::Updated => println!("✓ Updated saved cart '{}'", name.trim()),
    }
    Ok(())
}

pub async fn overwrite(index: usize) -> anyhow::Result<()> {
    let session = Session::open()?;
    let cart = session.workflows.overwrite(index).await?;
    println!("✓ Overwrote '{}' with {} line(s)", cart.name, cart.products.len());
    Ok(())
}

pub async fn delete(index: usize) -> anyhow::Result<()> {
    let session = Session::open()?;
    let cart = session.workflows.delete(index)?;
    println!("✓ Deleted '{}'", cart.name);
    Ok(())
}
