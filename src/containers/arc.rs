use std::fs;
use std::path::Path;

use crate::binary_utils::StreamReader;
use crate::error::ExtractError;

// The engine's archive groups entries by file suffix: a type table up front
// (4-byte tag, record count, record-table offset per suffix), then one
// object table per type, then all blob data contiguously. Two record widths
// exist in the wild, differing only in the name field.

const TYPE_TAG_LEN: usize = 4;
const SUFFIX_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcVersion {
    /// 9-byte name field (8 characters + NUL).
    V1,
    /// 13-byte name field (12 characters + NUL), used by later releases.
    V2,
}

impl ArcVersion {
    fn name_field_len(self) -> usize {
        match self {
            ArcVersion::V1 => 9,
            ArcVersion::V2 => 13,
        }
    }

    fn name_limit(self) -> usize {
        self.name_field_len() - 1
    }
}

#[derive(Debug, Clone)]
pub struct ArcEntry {
    /// Full entry name, `NAME.TYPE`.
    pub name: String,
    pub size: u32,
    pub offset: u32,
}

/// A parsed archive, holding the raw file plus its entry table in metadata
/// order.
#[derive(Debug)]
pub struct Archive {
    data: Vec<u8>,
    entries: Vec<ArcEntry>,
}

impl Archive {
    pub fn open(path: &Path, version: ArcVersion) -> Result<Self, ExtractError> {
        Self::parse(fs::read(path)?, version)
    }

    pub fn parse(data: Vec<u8>, version: ArcVersion) -> Result<Self, ExtractError> {
        let mut entries = Vec::new();
        {
            let mut reader = StreamReader::new(&data);
            let type_count = reader.u32_le("archive type table")?;

            let mut types = Vec::with_capacity(type_count as usize);
            for _ in 0..type_count {
                let tag = ascii_field(reader.take(TYPE_TAG_LEN, "archive type table")?);
                let count = reader.u32_le("archive type table")?;
                let offset = reader.u32_le("archive type table")?;
                types.push((tag, count, offset));
            }

            for (tag, count, offset) in types {
                reader.seek(offset as usize, "archive object table")?;
                for _ in 0..count {
                    let name =
                        ascii_field(reader.take(version.name_field_len(), "archive object table")?);
                    let size = reader.u32_le("archive object table")?;
                    let data_offset = reader.u32_le("archive object table")?;
                    entries.push(ArcEntry {
                        name: format!("{}.{}", name, tag),
                        size,
                        offset: data_offset,
                    });
                }
            }
        }

        Ok(Archive { data, entries })
    }

    pub fn entries(&self) -> &[ArcEntry] {
        &self.entries
    }

    pub fn entry_data(&self, entry: &ArcEntry) -> Result<&[u8], ExtractError> {
        let start = entry.offset as usize;
        let end = start
            .checked_add(entry.size as usize)
            .ok_or(ExtractError::TruncatedInput("archive entry data"))?;
        if end > self.data.len() {
            return Err(ExtractError::TruncatedInput("archive entry data"));
        }
        Ok(&self.data[start..end])
    }

    /// Look an entry up by its full `NAME.TYPE` name, case-sensitively.
    pub fn load(&self, name: &str) -> Option<Result<&[u8], ExtractError>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| self.entry_data(entry))
    }

    pub fn unpack_to(&self, output_dir: &Path) -> Result<(), ExtractError> {
        fs::create_dir_all(output_dir)?;
        for entry in &self.entries {
            fs::write(output_dir.join(&entry.name), self.entry_data(entry)?)?;
        }
        Ok(())
    }
}

/// One file destined for a packed archive.
#[derive(Debug, Clone)]
pub struct PackEntry {
    pub name: String,
    pub suffix: String,
    pub data: Vec<u8>,
}

/// Build an archive image from the given entries.
///
/// Entries are sorted by (suffix, name) and grouped into one type record per
/// suffix, matching the layout shipped games use. Names are uppercased;
/// over-long or non-ASCII names are rejected before anything is written.
pub fn pack(entries: Vec<PackEntry>, version: ArcVersion) -> Result<Vec<u8>, ExtractError> {
    let mut entries = entries;
    for entry in &mut entries {
        entry.name = entry.name.to_ascii_uppercase();
        entry.suffix = entry.suffix.to_ascii_uppercase();
        if !entry.name.is_ascii() || !entry.suffix.is_ascii() {
            return Err(ExtractError::Format(format!(
                "entry name {:?}.{:?} is not ASCII",
                entry.name, entry.suffix
            )));
        }
        if entry.name.len() > version.name_limit() || entry.suffix.len() > SUFFIX_LIMIT {
            return Err(ExtractError::Format(format!(
                "entry name {}.{} too long",
                entry.name, entry.suffix
            )));
        }
    }
    entries.sort_by(|a, b| (&a.suffix, &a.name).cmp(&(&b.suffix, &b.name)));

    // Suffixes appear in sorted order, so grouping runs is enough.
    let mut types: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match types.last_mut() {
            Some((suffix, members)) if *suffix == entry.suffix => members.push(i),
            _ => types.push((entry.suffix.clone(), vec![i])),
        }
    }

    let name_field_len = version.name_field_len();
    let record_len = name_field_len + 8;
    let header_len = 4 + types.len() * (TYPE_TAG_LEN + 8);
    let tables_len: usize = entries.len() * record_len;

    let mut out = Vec::with_capacity(header_len + tables_len);
    out.extend_from_slice(&(types.len() as u32).to_le_bytes());

    let mut table_offset = header_len;
    for (suffix, members) in &types {
        out.extend_from_slice(&fixed_field(suffix, TYPE_TAG_LEN));
        out.extend_from_slice(&(members.len() as u32).to_le_bytes());
        out.extend_from_slice(&(table_offset as u32).to_le_bytes());
        table_offset += members.len() * record_len;
    }

    let mut data_offset = header_len + tables_len;
    for (_, members) in &types {
        for &i in members {
            let entry = &entries[i];
            out.extend_from_slice(&fixed_field(&entry.name, name_field_len));
            out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data_offset as u32).to_le_bytes());
            data_offset += entry.data.len();
        }
    }

    for entry in &entries {
        out.extend_from_slice(&entry.data);
    }

    Ok(out)
}

/// Read every regular file in a directory into pack entries, splitting the
/// suffix at the last dot the way the engine names entries.
pub fn pack_from_dir(input_dir: &Path, version: ArcVersion) -> Result<Vec<u8>, ExtractError> {
    let mut pack_entries = Vec::new();
    for dir_entry in fs::read_dir(input_dir)? {
        let path = dir_entry?.path();
        if !path.is_file() {
            continue;
        }
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let (name, suffix) = match file_name.rsplit_once('.') {
            Some(split) => split,
            None => {
                return Err(ExtractError::Format(format!(
                    "file {:?} has no suffix",
                    file_name
                )))
            }
        };
        pack_entries.push(PackEntry {
            name: name.to_string(),
            suffix: suffix.to_string(),
            data: fs::read(&path)?,
        });
    }
    pack(pack_entries, version)
}

fn ascii_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&byte| byte == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).to_string()
}

fn fixed_field(value: &str, len: usize) -> Vec<u8> {
    let mut field = vec![0u8; len];
    field[..value.len()].copy_from_slice(value.as_bytes());
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<PackEntry> {
        vec![
            PackEntry {
                name: "title".to_string(),
                suffix: "wip".to_string(),
                data: vec![1, 2, 3, 4],
            },
            PackEntry {
                name: "start".to_string(),
                suffix: "wsc".to_string(),
                data: vec![9, 9],
            },
            PackEntry {
                name: "title".to_string(),
                suffix: "msk".to_string(),
                data: vec![5],
            },
        ]
    }

    #[test]
    fn pack_then_parse_round_trips() {
        let packed = pack(sample_entries(), ArcVersion::V1).unwrap();
        let archive = Archive::parse(packed, ArcVersion::V1).unwrap();

        // Sorted by suffix then name.
        let names: Vec<&str> = archive
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["TITLE.MSK", "TITLE.WIP", "START.WSC"]);

        assert_eq!(archive.load("TITLE.WIP").unwrap().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(archive.load("START.WSC").unwrap().unwrap(), &[9, 9]);
        assert_eq!(archive.load("TITLE.MSK").unwrap().unwrap(), &[5]);
        assert!(archive.load("MISSING.WIP").is_none());
    }

    #[test]
    fn wide_name_round_trips_in_v2_only() {
        let entries = vec![PackEntry {
            name: "longishname".to_string(),
            suffix: "wip".to_string(),
            data: vec![0xaa],
        }];

        assert!(matches!(
            pack(entries.clone(), ArcVersion::V1),
            Err(ExtractError::Format(_))
        ));

        let packed = pack(entries, ArcVersion::V2).unwrap();
        let archive = Archive::parse(packed, ArcVersion::V2).unwrap();
        assert_eq!(archive.entries()[0].name, "LONGISHNAME.WIP");
    }

    #[test]
    fn over_long_suffix_is_rejected() {
        let entries = vec![PackEntry {
            name: "a".to_string(),
            suffix: "wipf".to_string(),
            data: Vec::new(),
        }];

        assert!(matches!(
            pack(entries, ArcVersion::V1),
            Err(ExtractError::Format(_))
        ));
    }

    #[test]
    fn truncated_metadata_is_truncated_input() {
        let mut packed = pack(sample_entries(), ArcVersion::V1).unwrap();
        packed.truncate(10);

        assert!(matches!(
            Archive::parse(packed, ArcVersion::V1),
            Err(ExtractError::TruncatedInput(_))
        ));
    }

    #[test]
    fn entry_data_past_end_is_truncated_input() {
        let mut packed = pack(sample_entries(), ArcVersion::V1).unwrap();
        packed.truncate(packed.len() - 1);

        let archive = Archive::parse(packed, ArcVersion::V1).unwrap();
        let last = archive.entries().last().unwrap().clone();
        assert!(matches!(
            archive.entry_data(&last),
            Err(ExtractError::TruncatedInput(_))
        ));
    }

    #[test]
    fn unpack_writes_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let packed = pack(sample_entries(), ArcVersion::V1).unwrap();
        let archive = Archive::parse(packed, ArcVersion::V1).unwrap();

        archive.unpack_to(dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("TITLE.WIP")).unwrap(), [1, 2, 3, 4]);
        assert_eq!(fs::read(dir.path().join("START.WSC")).unwrap(), [9, 9]);
        assert_eq!(fs::read(dir.path().join("TITLE.MSK")).unwrap(), [5]);
    }

    #[test]
    fn pack_from_dir_reads_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ev001.wip"), [7, 7, 7]).unwrap();
        fs::write(dir.path().join("ev001.msk"), [1]).unwrap();

        let packed = pack_from_dir(dir.path(), ArcVersion::V1).unwrap();
        let archive = Archive::parse(packed, ArcVersion::V1).unwrap();

        assert_eq!(archive.entries().len(), 2);
        assert_eq!(archive.load("EV001.WIP").unwrap().unwrap(), &[7, 7, 7]);
    }
}
