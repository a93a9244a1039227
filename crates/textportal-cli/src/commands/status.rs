use anyhow::Result;
use chrono::Duration;

use textportal_core::AppConfig;

use super::Portal;

fn format_age(age: Duration) -> String {
    if age < Duration::zero() {
        return "in the future".to_string();
    }
    let secs = age.num_seconds();
    match secs {
        0..=59 => format!("{}s ago", secs),
        60..=3599 => format!("{}m ago", secs / 60),
        _ => format!("{}h {}m ago", secs / 3600, (secs % 3600) / 60),
    }
}

pub async fn run(config: &AppConfig, json: bool) -> Result<()> {
    let portal = Portal::assemble(config).await?;
    let keys = [&config.cache.front_page_key, &config.cache.archive_key];

    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let lookup = portal.cache.read(key).await;
        entries.push((key, lookup));
    }

    if json {
        let artifacts: Vec<_> = entries
            .iter()
            .map(|(key, lookup)| {
                serde_json::json!({
                    "artifact": key,
                    "state": lookup.freshness().to_string(),
                    "age_secs": lookup.age().map(|age| age.num_seconds()),
                    "bytes": lookup.content().map(|content| content.len()),
                })
            })
            .collect();
        let status = serde_json::json!({
            "store": portal.cache.store().describe(),
            "freshness_secs": portal.cache.window().num_seconds(),
            "artifacts": artifacts,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Store: {}", portal.cache.store().describe());
    println!("Freshness window: {} seconds\n", portal.cache.window().num_seconds());

    for (key, lookup) in &entries {
        let age = lookup
            .age()
            .map(format_age)
            .unwrap_or_else(|| "never written".to_string());
        println!("  {:<24} {:<7} {}", key, lookup.freshness().to_string(), age);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(42)), "42s ago");
        assert_eq!(format_age(Duration::minutes(9)), "9m ago");
        assert_eq!(format_age(Duration::minutes(125)), "2h 5m ago");
        assert_eq!(format_age(Duration::seconds(-3)), "in the future");
    }
}
