//! List compiled documents

use anyhow::Result;

use crate::store::ContentStore;
use crate::Site;

/// Print the compiled documents in the store
pub fn run(site: &Site) -> Result<()> {
    let store = ContentStore::load(&site.store_dir)?;

    println!("Documents ({}):", store.len());
    for doc in store.documents() {
        let date = doc
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());
        println!("  {} {} [{}]", date, doc.title, doc.slug);
    }

    Ok(())
}
