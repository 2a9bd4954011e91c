// phonetic_join.rs: Pair every resolved character with its phonetic initials.
// Copyright (C) 2015  Kenny Chan
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::Path;

use tracing::info;

use crate::error::PipelineError;
use crate::records::{for_each_row, load, write_rows, ExpandedRecord, JoinedRecord};

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct PhoneticIndex {
    initials: HashMap<String, Vec<char>>,
    loaded: usize,
}

impl PhoneticIndex {
    /// Parses `code\tphonetic` lines. Only the first character of each
    /// phonetic string is kept; a code listed on several lines accumulates
    /// one initial per line.
    pub fn parse<R: BufRead>(reader: R) -> io::Result<PhoneticIndex> {
        let mut index = PhoneticIndex::default();
        for_each_row(reader, 2, |fields| {
            let initials = index.initials.entry(fields[0].to_owned()).or_default();
            if let Some(initial) = fields[1].chars().next() {
                initials.push(initial);
                index.loaded += 1;
            }
        })?;
        Ok(index)
    }

    /// Number of initials recorded over all codes.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn initials(&self, code: &str) -> &[char] {
        self.initials.get(code).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[test]
fn test_parse_phonetic() {
    let index = PhoneticIndex::parse("\
1-4421\tㄓㄨㄥ
1-4421\tㄓㄨㄥˋ
1-4422\tㄒㄧㄥˊ
1-4422\tㄏㄤˊ
1-4423\t
1-4424
".as_bytes()).unwrap();

    assert_eq!(index.loaded(), 4);
    assert_eq!(index.initials("1-4421"), &['ㄓ', 'ㄓ']);
    assert_eq!(index.initials("1-4422"), &['ㄒ', 'ㄏ']);
    assert_eq!(index.initials("1-4423"), &[] as &[char]);
    assert_eq!(index.initials("1-4424"), &[] as &[char]);
}

/// Emits one row per recorded initial of each joined row, or a single row
/// with an empty initial when the code has none.
pub fn expand(rows: &[JoinedRecord], index: &PhoneticIndex) -> Vec<ExpandedRecord> {
    let mut expanded = Vec::with_capacity(rows.len());
    for row in rows {
        let initials = index.initials(&row.code);
        if initials.is_empty() {
            expanded.push(ExpandedRecord { joined: row.clone(), initial: String::new() });
        }
        for initial in initials {
            expanded.push(ExpandedRecord { joined: row.clone(), initial: initial.to_string() });
        }
    }
    expanded
}

#[test]
fn test_expand() {
    let index = PhoneticIndex::parse("\
A1AA\tㄓㄨㄥ
A1AB\tㄒㄧㄥˊ
A1AB\tㄏㄤˊ
A1AC\t
".as_bytes()).unwrap();

    let rows = vec![
        JoinedRecord::from_fields(&["A1AA", "4E2D", "中"]).unwrap(),
        JoinedRecord::from_fields(&["A1AB", "884C", "行"]).unwrap(),
        JoinedRecord::from_fields(&["A1AC", "3007", "〇"]).unwrap(),
        JoinedRecord::from_fields(&["A1AD", "4E00", "一"]).unwrap(),
    ];

    let expanded = expand(&rows, &index).iter().map(|r| r.to_string()).collect::<Vec<_>>();
    assert_eq!(expanded, vec![
        "A1AA\t4E2D\t中\tㄓ",
        "A1AB\t884C\t行\tㄒ",
        "A1AB\t884C\t行\tㄏ",
        "A1AC\t3007\t〇\t",
        "A1AD\t4E00\t一\t",
    ]);
}

/// Reads the rows of a `pass2.csv` file. Rows with fewer than three fields are
/// dropped.
pub fn read_joined<R: BufRead>(reader: R) -> io::Result<Vec<JoinedRecord>> {
    let mut rows = Vec::new();
    for_each_row(reader, 3, |fields| rows.extend(JoinedRecord::from_fields(fields)))?;
    Ok(rows)
}

pub fn run(phonetic: &Path, pass2: &Path, pass3: &Path) -> Result<Vec<ExpandedRecord>, PipelineError> {
    let index = load(phonetic, PhoneticIndex::parse)?;
    info!("Loaded {} phonetic entries from {}", index.loaded(), phonetic.display());

    let joined = load(pass2, read_joined)?;
    let rows = expand(&joined, &index);
    write_rows(pass3, &rows)?;

    info!("Step 3 completed: {} entries saved to {}", rows.len(), pass3.display());
    Ok(rows)
}

#[test]
fn test_run_missing_phonetic() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let phonetic = dir.path().join("CNS_phonetic.txt");
    let pass2 = dir.path().join("pass2.csv");
    let pass3 = dir.path().join("pass3.csv");
    fs::write(&pass2, "A1AA\t4E2D\t中\n").unwrap();

    match run(&phonetic, &pass2, &pass3) {
        Err(PipelineError::MissingInputFile { path }) => assert_eq!(path, phonetic),
        r => panic!("unexpected result {:?}", r),
    }
    assert!(!pass3.exists());
}

#[test]
fn test_run_missing_pass2() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let phonetic = dir.path().join("CNS_phonetic.txt");
    let pass2 = dir.path().join("pass2.csv");
    let pass3 = dir.path().join("pass3.csv");
    fs::write(&phonetic, "A1AA\tㄓㄨㄥ\n").unwrap();

    match run(&phonetic, &pass2, &pass3) {
        Err(PipelineError::MissingInputFile { path }) => assert_eq!(path, pass2),
        r => panic!("unexpected result {:?}", r),
    }
    assert!(!pass3.exists());
}

#[test]
fn test_run_alone_keeps_ideographic_space() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let phonetic = dir.path().join("CNS_phonetic.txt");
    let pass2 = dir.path().join("pass2.csv");
    let pass3 = dir.path().join("pass3.csv");
    fs::write(&phonetic, "1-2121\tㄎㄨㄥ\n").unwrap();
    fs::write(&pass2, "1-2121\t3000\t\u{3000}\n").unwrap();

    run(&phonetic, &pass2, &pass3).unwrap();
    assert_eq!(fs::read_to_string(&pass3).unwrap(), "1-2121\t3000\t\u{3000}\tㄎ\n");
}
