//! Cache maintenance commands.

use anyhow::Result;

use crate::cache::ResourceCache;
use crate::config::Config;

pub fn flush(config: Config) -> Result<()> {
    let mut cache = ResourceCache::new(config.cache.dir.clone(), config.cache.limits());
    cache.flush_now();
    println!("cache flushed: {}", config.cache.dir.display());
    Ok(())
}

pub fn stats(config: Config) -> Result<()> {
    let mut cache = ResourceCache::new(config.cache.dir.clone(), config.cache.limits());
    match cache.stats() {
        Some(stats) => {
            println!("dir:    {}", config.cache.dir.display());
            println!("files:  {} (limit {})", stats.files, config.cache.max_files);
            println!("bytes:  {} (limit {})", stats.bytes, config.cache.max_bytes);
            match stats.oldest {
                Some(oldest) => println!("oldest: {}", oldest.to_rfc3339()),
                None => println!("oldest: -"),
            }
        }
        None => println!("cache unavailable: {}", config.cache.dir.display()),
    }
    Ok(())
}
