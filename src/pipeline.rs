// pipeline.rs: Run the four stages in order over a data and an output directory.
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

use std::fs;
use std::path::PathBuf;

use tracing::{info, info_span};

use crate::error::PipelineError;
use crate::{phonetic_join, source_filter, table_builder, unicode_join};

/// Where the datasets are read from and where every generated file goes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Layout {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl Layout {
    pub fn new<D: Into<PathBuf>, O: Into<PathBuf>>(data_dir: D, out_dir: O) -> Layout {
        Layout { data_dir: data_dir.into(), out_dir: out_dir.into() }
    }

    pub fn source(&self) -> PathBuf { self.data_dir.join("CNS_source.txt") }
    pub fn unicode_dir(&self) -> PathBuf { self.data_dir.join("Unicode") }
    pub fn phonetic(&self) -> PathBuf { self.data_dir.join("CNS_phonetic.txt") }
    pub fn keyboard(&self) -> PathBuf { self.data_dir.join("keyboard").join("standard.csv") }

    pub fn pass1(&self) -> PathBuf { self.out_dir.join("pass1.csv") }
    pub fn pass2(&self) -> PathBuf { self.out_dir.join("pass2.csv") }
    pub fn pass3(&self) -> PathBuf { self.out_dir.join("pass3.csv") }
    pub fn table(&self) -> PathBuf { self.out_dir.join("table.lua") }
}

impl Default for Layout {
    fn default() -> Layout {
        Layout::new("data", "tmp")
    }
}

#[test]
fn test_default_layout() {
    use std::path::Path;

    let layout = Layout::default();
    assert_eq!(layout.source(), Path::new("data/CNS_source.txt"));
    assert_eq!(layout.unicode_dir(), Path::new("data/Unicode"));
    assert_eq!(layout.phonetic(), Path::new("data/CNS_phonetic.txt"));
    assert_eq!(layout.keyboard(), Path::new("data/keyboard/standard.csv"));
    assert_eq!(layout.pass3(), Path::new("tmp/pass3.csv"));
    assert_eq!(layout.table(), Path::new("tmp/table.lua"));
}

/// Runs every stage, stopping at the first fatal error. The output directory
/// is created when missing.
pub fn run(layout: &Layout, marker: &str) -> Result<(), PipelineError> {
    fs::create_dir_all(&layout.out_dir).map_err(|e| PipelineError::write(&layout.out_dir, e))?;

    {
        let _span = info_span!("source_filter").entered();
        source_filter::run(&layout.source(), &layout.pass1(), marker)?;
    }
    {
        let _span = info_span!("unicode_join").entered();
        unicode_join::run(&layout.unicode_dir(), &layout.pass1(), &layout.pass2())?;
    }
    {
        let _span = info_span!("phonetic_join").entered();
        phonetic_join::run(&layout.phonetic(), &layout.pass2(), &layout.pass3())?;
    }
    {
        let _span = info_span!("table_builder").entered();
        table_builder::run(&layout.keyboard(), &layout.pass3(), &layout.table())?;
    }

    info!("Keyboard table written to {}", layout.table().display());
    Ok(())
}

#[cfg(test)]
fn write_fixture(root: &std::path::Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("data"), dir.path().join("tmp"));

    write_fixture(&layout.data_dir, "CNS_source.txt", "A1AA\t常用字\nA1AB\t常用字\nA1AC\t罕用字\n");
    write_fixture(&layout.data_dir, "Unicode/CNS2UNICODE_Unicode BMP.txt", "A1AA\t4E2D\nA1AB\t884C\nA1AC\t4E00\n");
    write_fixture(&layout.data_dir, "CNS_phonetic.txt", "A1AA\tㄓㄨㄥ\nA1AB\tㄒㄧㄥˊ\nA1AB\tㄏㄤˊ\n");
    write_fixture(&layout.data_dir, "keyboard/standard.csv", "5\tㄓ\nv\tㄒ\nc\tㄏ\n");

    run(&layout, source_filter::COMMON_USAGE_MARKER).unwrap();

    assert_eq!(fs::read_to_string(layout.pass1()).unwrap(), "A1AA\nA1AB\n");
    assert_eq!(fs::read_to_string(layout.pass2()).unwrap(), "A1AA\t4E2D\t中\nA1AB\t884C\t行\n");
    assert_eq!(fs::read_to_string(layout.pass3()).unwrap(),
               "A1AA\t4E2D\t中\tㄓ\nA1AB\t884C\t行\tㄒ\nA1AB\t884C\t行\tㄏ\n");
    assert_eq!(fs::read_to_string(layout.table()).unwrap(), "\
return {
    ['5'] = [=[中]=], -- ㄓ
    ['c'] = [=[行]=], -- ㄏ
    ['v'] = [=[行]=], -- ㄒ
}
");
}

#[test]
fn test_run_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("data"), dir.path().join("tmp"));

    match run(&layout, source_filter::COMMON_USAGE_MARKER) {
        Err(PipelineError::MissingInputFile { path }) => assert_eq!(path, layout.source()),
        r => panic!("unexpected result {:?}", r),
    }
    assert!(layout.out_dir.is_dir());
    assert!(!layout.pass1().exists());
}

#[test]
fn test_run_without_mapping_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("data"), dir.path().join("tmp"));
    write_fixture(&layout.data_dir, "CNS_source.txt", "A1AA\t常用字\n");
    write_fixture(&layout.data_dir, "Unicode/README.md", "not a mapping\n");

    match run(&layout, source_filter::COMMON_USAGE_MARKER) {
        Err(PipelineError::NoMappingFiles { dir }) => assert_eq!(dir, layout.unicode_dir()),
        r => panic!("unexpected result {:?}", r),
    }
    assert!(layout.pass1().exists());
    assert!(!layout.pass2().exists());
}

#[test]
fn test_mapping_files_sorted_last_wins() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("data"), dir.path().join("tmp"));
    write_fixture(&layout.data_dir, "CNS_source.txt", "A1AA\t常用字\n");
    write_fixture(&layout.data_dir, "Unicode/b.txt", "A1AA\t4E2D\n");
    write_fixture(&layout.data_dir, "Unicode/a.txt", "A1AA\t4E00\n");
    write_fixture(&layout.data_dir, "CNS_phonetic.txt", "");
    write_fixture(&layout.data_dir, "keyboard/standard.csv", "5\tㄓ\n");

    run(&layout, source_filter::COMMON_USAGE_MARKER).unwrap();
    assert_eq!(fs::read_to_string(layout.pass2()).unwrap(), "A1AA\t4E2D\t中\n");
    assert_eq!(fs::read_to_string(layout.pass3()).unwrap(), "A1AA\t4E2D\t中\t\n");
    assert_eq!(fs::read_to_string(layout.table()).unwrap(), "return {\n}\n");
}

#[test]
fn test_run_keeps_ideographic_space() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("data"), dir.path().join("tmp"));
    write_fixture(&layout.data_dir, "CNS_source.txt", "1-2121\t常用符號\n");
    write_fixture(&layout.data_dir, "Unicode/bmp.txt", "1-2121\t3000\n");
    write_fixture(&layout.data_dir, "CNS_phonetic.txt", "1-2121\tㄎㄨㄥ\n");
    write_fixture(&layout.data_dir, "keyboard/standard.csv", "d\tㄎ\n");

    run(&layout, source_filter::COMMON_USAGE_MARKER).unwrap();
    assert_eq!(fs::read_to_string(layout.pass2()).unwrap(), "1-2121\t3000\t\u{3000}\n");
    assert_eq!(fs::read_to_string(layout.pass3()).unwrap(), "1-2121\t3000\t\u{3000}\tㄎ\n");
    assert_eq!(fs::read_to_string(layout.table()).unwrap(),
               "return {\n    ['d'] = [=[\u{3000}]=], -- ㄎ\n}\n");
}
