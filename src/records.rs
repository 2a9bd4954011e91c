// records.rs: Tab-delimited record files shared by every stage.
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

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::PipelineError;

//{{{ Files

pub fn open_input(path: &Path) -> Result<BufReader<File>, PipelineError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| PipelineError::read(path, e))
}

/// Reads the whole file at `path` through `parse`.
pub fn load<T, F>(path: &Path, parse: F) -> Result<T, PipelineError>
    where F: FnOnce(BufReader<File>) -> std::io::Result<T>
{
    let reader = open_input(path)?;
    parse(reader).map_err(|e| PipelineError::read(path, e))
}

/// Writes one row per line, replacing any previous content of `path`.
pub fn write_rows<T: fmt::Display>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        writeln!(writer, "{}", row).map_err(|e| PipelineError::write(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::write(path, e))
}

//}}}

//{{{ Fields

/// Splits a line into its tab-separated fields. Surrounding ASCII whitespace
/// (including the line terminator) is dropped first.
pub fn fields(line: &str) -> Vec<&str> {
    line.trim_matches(|c: char| c.is_ascii_whitespace()).split('\t').collect()
}

/// Calls `f` with the fields of every line holding at least `min_fields`
/// fields. Shorter lines are skipped.
pub fn for_each_row<R, F>(reader: R, min_fields: usize, mut f: F) -> std::io::Result<()>
    where R: BufRead, F: FnMut(&[&str])
{
    for line in reader.lines() {
        let line = line?;
        let fields = fields(&line);
        if fields.len() >= min_fields {
            f(&fields);
        }
    }
    Ok(())
}

#[test]
fn test_fields() {
    assert_eq!(fields("A1AA\t常用字\r\n"), vec!["A1AA", "常用字"]);
    assert_eq!(fields("A1AA"), vec!["A1AA"]);
    assert_eq!(fields("1-4421\t\tㄓ"), vec!["1-4421", "", "ㄓ"]);
    // U+3000 is not ASCII whitespace and survives as a character field.
    assert_eq!(fields("1-2121\t3000\t\u{3000}\n"), vec!["1-2121", "3000", "\u{3000}"]);
}

#[test]
fn test_for_each_row_skips_short_lines() {
    let input = "a\tb\nlonely\n\nc\td\te\n".as_bytes();
    let mut rows = Vec::new();
    for_each_row(input, 2, |f| rows.push(f.join("|"))).unwrap();
    assert_eq!(rows, vec!["a|b", "c|d|e"]);
}

//}}}

//{{{ Rows

/// A `pass2.csv` row: a code with its resolved codepoint.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct JoinedRecord {
    pub code: String,
    pub hex: String,
    pub character: String,
}

impl JoinedRecord {
    pub fn from_fields(fields: &[&str]) -> Option<JoinedRecord> {
        match *fields {
            [code, hex, character, ..] => Some(JoinedRecord {
                code: code.to_owned(),
                hex: hex.to_owned(),
                character: character.to_owned(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for JoinedRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.code, self.hex, self.character)
    }
}

/// A `pass3.csv` row: a joined record paired with one phonetic initial.
/// The initial is empty when the code has no known pronunciation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExpandedRecord {
    pub joined: JoinedRecord,
    pub initial: String,
}

impl ExpandedRecord {
    pub fn from_fields(fields: &[&str]) -> Option<ExpandedRecord> {
        if fields.len() < 4 {
            return None;
        }
        JoinedRecord::from_fields(fields).map(|joined| ExpandedRecord {
            joined,
            initial: fields[3].to_owned(),
        })
    }
}

impl fmt::Display for ExpandedRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}", self.joined, self.initial)
    }
}

#[test]
fn test_rows_from_fields() {
    let joined = JoinedRecord::from_fields(&["A1AA", "4E2D", "中"]).unwrap();
    assert_eq!(joined.to_string(), "A1AA\t4E2D\t中");
    assert_eq!(JoinedRecord::from_fields(&["A1AA", "4E2D"]), None);

    let expanded = ExpandedRecord::from_fields(&["A1AA", "4E2D", "中", "ㄓ"]).unwrap();
    assert_eq!(expanded.joined, joined);
    assert_eq!(expanded.initial, "ㄓ");
    assert_eq!(expanded.to_string(), "A1AA\t4E2D\t中\tㄓ");
    assert_eq!(ExpandedRecord::from_fields(&["A1AA", "4E2D", "中"]), None);
}

//}}}
