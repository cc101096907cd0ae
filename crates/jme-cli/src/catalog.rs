//! `jme catalog`: list filter bits and HLT paths.

use anyhow::Result;
use jme_analyzer::{FilterBit, HLT_PATHS};

pub fn cmd_catalog(json: bool) -> Result<()> {
    if json {
        let filters: Vec<serde_json::Value> = FilterBit::ALL
            .iter()
            .map(|bit| {
                serde_json::json!({
                    "index": bit.index(),
                    "name": bit.name(),
                    "rerun_update": bit.is_rerun_update(),
                })
            })
            .collect();
        let value = serde_json::json!({ "filters": filters, "hlt_paths": &HLT_PATHS[..] });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("MET filters ({}):", FilterBit::ALL.len());
    for bit in FilterBit::ALL {
        let tag = if bit.is_rerun_update() { "  (rerun)" } else { "" };
        println!("  {:>2}  {}{tag}", bit.index(), bit.name());
    }
    println!("HLT paths ({}):", HLT_PATHS.len());
    for path in HLT_PATHS {
        println!("  {path}");
    }
    Ok(())
}
