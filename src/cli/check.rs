//! CLI `check` command: print the resolved configuration and validate it.

use anyhow::Result;

use medmatch::config::MedmatchConfig;

pub fn check(config: &MedmatchConfig) -> Result<()> {
    println!("medmatch configuration");
    println!("======================");
    println!();
    println!("Server:");
    println!("  Bind address:    {}", config.bind_addr());
    println!("  Log level:       {}", config.server.log_level);
    println!("  CORS:            {}", if config.server.cors { "on" } else { "off" });
    println!();
    println!("Embedding:");
    println!("  Provider:        {}", config.embedding.provider);
    println!("  Model:           {}", config.embedding.model);
    println!("  Base URL:        {}", config.embedding.base_url);
    println!("  API key:         {}", config.embedding.masked_api_key());
    println!("  Timeout:         {}s", config.embedding.timeout_secs);
    println!();
    println!("Matching:");
    println!("  Max items:       {}", config.matching.max_items);
    println!("  Default top-k:   {}", config.matching.default_top_k);
    println!("  Tie tolerance:   {:e}", config.matching.tie_tolerance);
    println!("  Norm epsilon:    {:e}", config.matching.norm_epsilon);
    println!();

    config.validate()?;
    if config.embedding.api_key.is_empty() {
        println!("Warning: no API key set. `serve` and `match` will fail to start.");
    }
    println!("Configuration OK.");
    Ok(())
}
