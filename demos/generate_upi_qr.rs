//! Generate a UPI payment QR code and save it to a file
//!
//! Usage: cargo run --example generate_upi_qr

use upilink::{Amount, PaymentIntent, QrDecoder, QrSurface};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let intent = PaymentIntent::new("merchant@bank")?
        .with_payee_name("Corner Cafe")
        .with_amount(Amount::parse("10")?)
        .with_note("lunch");
    let uri = intent.to_uri();

    let mut surface = QrSurface::default();
    surface.render(&uri)?;
    let path = surface.export_png(std::path::Path::new("upi_static.png"))?;

    println!("✓ UPI QR code saved to {}", path.display());
    println!("  Content: {uri}");
    println!("{}", surface.to_terminal()?);

    // Read it back to make sure the image scans
    let scanned = QrDecoder::new().decode_file(&path)?;
    println!("✓ Scanned back: {}", scanned.as_str().unwrap_or("<binary>"));

    Ok(())
}
