use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

/// One decoded object as referenced from the generated scene listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingRecord {
    pub tag: String,
    pub symbol: String,
    pub index: usize,
    /// Path of the written image, relative to the batch output directory.
    pub path: String,
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Accumulates the records of one batch run and renders the per-tag listing
/// artifacts. Workers share a single listing behind a mutex; it is the only
/// piece of state a batch run shares.
#[derive(Debug, Default)]
pub struct SceneListing {
    records: Vec<ListingRecord>,
}

impl SceneListing {
    pub fn new() -> Self {
        SceneListing::default()
    }

    pub fn push(&mut self, record: ListingRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.records.iter().map(|r| r.tag.clone()).collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Scene-script fragment declaring one image statement per record.
    pub fn write_script<W: Write>(&self, tag: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "init:")?;
        let mut records: Vec<&ListingRecord> =
            self.records.iter().filter(|r| r.tag == tag).collect();
        records.sort_by(|a, b| (&a.symbol, a.index).cmp(&(&b.symbol, b.index)));
        for record in records {
            writeln!(
                out,
                "  image {} {}_{} = \"{}\"",
                record.tag, record.symbol, record.index, record.path
            )?;
        }
        Ok(())
    }

    /// JSON map from written image path to its placement offsets.
    pub fn write_placements<W: Write>(&self, tag: &str, out: &mut W) -> io::Result<()> {
        let placements: BTreeMap<&str, (u32, u32)> = self
            .records
            .iter()
            .filter(|r| r.tag == tag)
            .map(|r| (r.path.as_str(), (r.offset_x, r.offset_y)))
            .collect();
        let json = serde_json::to_string_pretty(&placements)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        out.write_all(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tag: &str, symbol: &str, index: usize) -> ListingRecord {
        ListingRecord {
            tag: tag.to_string(),
            symbol: symbol.to_string(),
            index,
            path: format!("arc/{}_{}.png", symbol, index),
            offset_x: 3,
            offset_y: 7,
            width: 2,
            height: 2,
        }
    }

    #[test]
    fn script_lists_only_the_requested_tag() {
        let mut listing = SceneListing::new();
        listing.push(record("bg", "ev001", 0));
        listing.push(record("bg", "ev001", 1));
        listing.push(record("chara", "rio", 0));

        let mut out = Vec::new();
        listing.write_script("bg", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "init:\n  image bg ev001_0 = \"arc/ev001_0.png\"\n  image bg ev001_1 = \"arc/ev001_1.png\"\n"
        );
    }

    #[test]
    fn placements_map_paths_to_offsets() {
        let mut listing = SceneListing::new();
        listing.push(record("bg", "ev001", 0));

        let mut out = Vec::new();
        listing.write_placements("bg", &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["arc/ev001_0.png"][0], 3);
        assert_eq!(json["arc/ev001_0.png"][1], 7);
    }

    #[test]
    fn tags_are_sorted_and_unique() {
        let mut listing = SceneListing::new();
        listing.push(record("chara", "rio", 0));
        listing.push(record("bg", "ev001", 0));
        listing.push(record("bg", "ev002", 0));

        assert_eq!(listing.tags(), vec!["bg".to_string(), "chara".to_string()]);
    }
}
