use anyhow::Result;

use textportal_core::{AppConfig, Regenerator};

use super::Portal;

pub async fn run(config: &AppConfig) -> Result<()> {
    let portal = Portal::assemble(config).await?;

    println!("Regenerating pages...\n");

    let report = portal.job.run().await?;

    println!(
        "\nRegeneration complete (run {}). {} articles, {} pages written.",
        report.run_id,
        report.articles,
        report.written.len()
    );
    if report.weather_unavailable > 0 {
        println!("  Weather unavailable for {} location(s)", report.weather_unavailable);
    }

    Ok(())
}
