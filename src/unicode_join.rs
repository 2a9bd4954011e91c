// unicode_join.rs: Resolve CNS codes to Unicode characters.
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
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::PipelineError;
use crate::records::{fields, for_each_row, load, write_rows, JoinedRecord};

/// The codepoint recorded for a CNS code. `character` is `None` when the hex
/// value could not be decoded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Codepoint {
    pub hex: String,
    pub character: Option<char>,
}

pub type UnicodeMap = HashMap<String, Codepoint>;

//{{{ Hex decoding

pub fn decode_hex(hex: &str) -> Option<char> {
    lazy_static! {
        static ref HEX_REGEX: Regex = Regex::new(r"^(?:0[xX])?(?P<digits>[0-9a-fA-F]{1,6})$").unwrap();
    }
    let captures = HEX_REGEX.captures(hex)?;
    let value = u32::from_str_radix(&captures["digits"], 16).ok()?;
    char::from_u32(value)
}

#[test]
fn test_decode_hex() {
    assert_eq!(decode_hex("4E2D"), Some('中'));
    assert_eq!(decode_hex("4e2d"), Some('中'));
    assert_eq!(decode_hex("0x4E2D"), Some('中'));
    assert_eq!(decode_hex("20000"), Some('\u{20000}'));
    assert_eq!(decode_hex("41"), Some('A'));

    assert_eq!(decode_hex(""), None);
    assert_eq!(decode_hex("XYZ"), None);
    assert_eq!(decode_hex("4E2D 4E2E"), None);
    assert_eq!(decode_hex("-41"), None);
    assert_eq!(decode_hex("D800"), None);
    assert_eq!(decode_hex("110000"), None);
}

#[test]
fn test_decode_hex_round_trip() {
    let c = decode_hex("4E2D").unwrap();
    assert_eq!(format!("{:04X}", c as u32), "4E2D");
}

//}}}

//{{{ Mapping tables

/// Lists the `*.txt` files directly inside `dir`, sorted by file name so that
/// later files in that order win on duplicate codes. Symbolic links are
/// listed by their target.
pub fn mapping_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::NoMappingFiles { dir: dir.to_owned() });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::ListDir { dir: dir.to_owned(), source: e })?;
        let is_txt = entry.path().extension().map_or(false, |ext| ext == "txt");
        if entry.file_type().is_file() && is_txt {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(PipelineError::NoMappingFiles { dir: dir.to_owned() });
    }
    Ok(files)
}

/// Adds the `code\thex` lines of one mapping file to `map`, replacing earlier
/// entries for the same code.
pub fn load_mapping<R: BufRead>(reader: R, origin: &Path, map: &mut UnicodeMap) -> io::Result<()> {
    for_each_row(reader, 2, |fields| {
        let (code, hex) = (fields[0], fields[1]);
        let character = decode_hex(hex);
        if character.is_none() {
            warn!("Could not convert Unicode hex '{}' from {} for {}", hex, origin.display(), code);
        }
        map.insert(code.to_owned(), Codepoint { hex: hex.to_owned(), character });
    })
}

#[test]
fn test_load_mapping() {
    let mut map = UnicodeMap::new();
    let input = "A1AA\t4E2D\nA1AB\tnot-hex\nshort\nA1AC\t4E2E\textra\n".as_bytes();
    load_mapping(input, Path::new("Unicode/CNS2UNICODE_Unicode BMP.txt"), &mut map).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map["A1AA"], Codepoint { hex: "4E2D".to_owned(), character: Some('中') });
    assert_eq!(map["A1AB"], Codepoint { hex: "not-hex".to_owned(), character: None });
    assert_eq!(map["A1AC"].character, Some('丮'));
}

#[test]
fn test_load_mapping_last_write_wins() {
    let mut map = UnicodeMap::new();
    load_mapping("A1AA\t4E00\n".as_bytes(), Path::new("1.txt"), &mut map).unwrap();
    load_mapping("A1AA\t4E2D\n".as_bytes(), Path::new("2.txt"), &mut map).unwrap();
    assert_eq!(map["A1AA"].character, Some('中'));

    // A broken later entry still replaces a good earlier one.
    load_mapping("A1AA\tZZZZ\n".as_bytes(), Path::new("3.txt"), &mut map).unwrap();
    assert_eq!(map["A1AA"].character, None);
}

#[cfg(unix)]
#[test]
fn test_mapping_files_follows_symlinks() {
    use std::fs;
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let unicode = dir.path().join("Unicode");
    fs::create_dir(&unicode).unwrap();
    fs::write(dir.path().join("bmp-real.txt"), "A1AA\t4E2D\n").unwrap();
    symlink(dir.path().join("bmp-real.txt"), unicode.join("bmp.txt")).unwrap();
    fs::write(unicode.join("a.txt"), "A1AB\t884C\n").unwrap();

    let files = mapping_files(&unicode).unwrap();
    assert_eq!(files, vec![unicode.join("a.txt"), unicode.join("bmp.txt")]);
}

//}}}

//{{{ Join

/// Reads the codes of a `pass1.csv` file. Blank lines are ignored.
pub fn read_codes<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut codes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(&code) = fields(&line).first() {
            if !code.is_empty() {
                codes.push(code.to_owned());
            }
        }
    }
    Ok(codes)
}

pub fn join<'a, I>(codes: I, map: &UnicodeMap) -> Vec<JoinedRecord>
    where I: IntoIterator<Item = &'a str>
{
    codes.into_iter().filter_map(|code| {
        match map.get(code) {
            Some(&Codepoint { ref hex, character: Some(c) }) => Some(JoinedRecord {
                code: code.to_owned(),
                hex: hex.clone(),
                character: c.to_string(),
            }),
            _ => {
                warn!("No valid Unicode character found for CNS code '{}'. Skipping in pass2.", code);
                None
            }
        }
    }).collect()
}

#[test]
fn test_join() {
    let mut map = UnicodeMap::new();
    load_mapping("A1AA\t4E2D\nA1AB\tZZZZ\nA1AC\t6587\n".as_bytes(), Path::new("u.txt"), &mut map).unwrap();

    let rows = join(vec!["A1AC", "A1AB", "A1AD", "A1AA"], &map);
    let rows = rows.iter().map(|r| r.to_string()).collect::<Vec<_>>();
    assert_eq!(rows, vec!["A1AC\t6587\t文", "A1AA\t4E2D\t中"]);
}

#[test]
fn test_read_codes() {
    let codes = read_codes("A1AA\n\nA1AB\r\n  \n".as_bytes()).unwrap();
    assert_eq!(codes, vec!["A1AA", "A1AB"]);
}

//}}}

/// Joins the codes of `pass1` against every mapping file in `unicode_dir` and
/// writes the resolvable ones to `pass2`.
pub fn run(unicode_dir: &Path, pass1: &Path, pass2: &Path) -> Result<Vec<JoinedRecord>, PipelineError> {
    let mut map = UnicodeMap::new();
    for file in mapping_files(unicode_dir)? {
        load(&file, |reader| load_mapping(reader, &file, &mut map))?;
    }

    let codes = load(pass1, read_codes)?;
    let rows = join(codes.iter().map(|c| &**c), &map);
    write_rows(pass2, &rows)?;

    info!("Step 2 completed: {} entries saved to {}", rows.len(), pass2.display());
    Ok(rows)
}

#[test]
fn test_run_missing_pass1() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let unicode = dir.path().join("Unicode");
    fs::create_dir(&unicode).unwrap();
    fs::write(unicode.join("bmp.txt"), "A1AA\t4E2D\n").unwrap();
    let pass1 = dir.path().join("pass1.csv");
    let pass2 = dir.path().join("pass2.csv");

    match run(&unicode, &pass1, &pass2) {
        Err(PipelineError::MissingInputFile { path }) => assert_eq!(path, pass1),
        r => panic!("unexpected result {:?}", r),
    }
    assert!(!pass2.exists());
}
