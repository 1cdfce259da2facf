use super::{report, Session};

pub async fn show() -> anyhow::Result<()> {
    let session = Session::open()?;
    let contents = session.workflows.current_cart().await?;

    if contents.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }
    println!("{:<20} {:>8}", "PRODUCT", "QTY");
    for line in &contents.products {
        println!("{:<20} {:>8}", line.product_id, line.quantity);
    }
    println!();
    println!("{} item(s) in cart", contents.count);
    Ok(())
}

pub async fn clear() -> anyhow::Result<()> {
    let session = Session::open()?;
    let response = session.workflows.clear_cart().await;
    report(&response)?;
    println!("✓ Cart cleared");
    Ok(())
}

pub async fn load(name: &str) -> anyhow::Result<()> {
    let session = Session::open()?;
    let index = session.workflows.position(name)?;
    let response = session.workflows.load(index).await?;
    report(&response)?;
    println!("✓ Loaded '{}'", name.trim());
    Ok(())
}
