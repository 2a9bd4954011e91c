// source_filter.rs: Select the common-usage codes from the CNS code listing.
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

use std::collections::BTreeSet;
use std::io::{self, BufRead};
use std::path::Path;

use tracing::info;

use crate::error::PipelineError;
use crate::records::{for_each_row, load, write_rows};

/// Category tags containing this marker denote characters in common use.
pub const COMMON_USAGE_MARKER: &str = "常用";

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Selection {
    /// Matching codes in source order. A code listed twice is kept twice.
    pub codes: Vec<String>,
    /// Every distinct category tag that matched the marker.
    pub categories: BTreeSet<String>,
}

impl Selection {
    pub fn distinct_codes(&self) -> usize {
        self.codes.iter().collect::<BTreeSet<_>>().len()
    }
}

pub fn select_common<R: BufRead>(reader: R, marker: &str) -> io::Result<Selection> {
    let mut selection = Selection::default();
    for_each_row(reader, 2, |fields| {
        let (code, category) = (fields[0], fields[1]);
        if category.contains(marker) {
            selection.codes.push(code.to_owned());
            selection.categories.insert(category.to_owned());
        }
    })?;
    Ok(selection)
}

#[test]
fn test_select_common() {
    let input = "\
A1AA\t常用字
A1AB\t次常用字
A1AC\t罕用字
malformed line without tabs
A1AD\t符號
A1AA\t常用字
".as_bytes();

    let selection = select_common(input, COMMON_USAGE_MARKER).unwrap();
    assert_eq!(selection.codes, vec!["A1AA", "A1AB", "A1AA"]);
    assert_eq!(selection.distinct_codes(), 2);
    assert_eq!(selection.categories.into_iter().collect::<Vec<_>>(),
               vec!["常用字", "次常用字"]);
}

#[test]
fn test_select_custom_marker() {
    let input = "1-4421\t常用字\n1-4422\t罕用字\n".as_bytes();
    let selection = select_common(input, "罕用").unwrap();
    assert_eq!(selection.codes, vec!["1-4422"]);
}

/// Writes the selected codes of `source` to `pass1`, one per line. `pass1` is
/// left untouched when `source` cannot be read.
pub fn run(source: &Path, pass1: &Path, marker: &str) -> Result<Selection, PipelineError> {
    let selection = load(source, |reader| select_common(reader, marker))?;
    write_rows(pass1, &selection.codes)?;

    info!("Step 1 completed: {} CNS codes with '{}' saved to {}",
          selection.distinct_codes(), marker, pass1.display());
    info!("Used sources: {:?}", selection.categories);
    Ok(selection)
}
