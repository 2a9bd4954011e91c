// cns_keytable.rs: Generate a phonetic keyboard lookup table from CNS data.
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

#[macro_use] extern crate lazy_static;

mod error;
mod phonetic_join;
mod pipeline;
mod records;
mod source_filter;
mod table_builder;
mod unicode_join;

use std::io;
use std::process;

use docopt::Docopt;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use pipeline::Layout;

const USAGE: &str = "
Usage: cns_keytable [-d DIR] [-o DIR] [-m MARKER]
       cns_keytable --help

Build the phonetic keyboard lookup table of the common-usage CNS characters.

The data directory must contain:

    CNS_source.txt          code, category tag
    Unicode/*.txt           code, Unicode hex (files loaded in name order)
    CNS_phonetic.txt        code, phonetic spelling
    keyboard/standard.csv   keyboard key, phonetic symbol

pass1.csv, pass2.csv, pass3.csv and table.lua are written to the output
directory, which is created if needed.

Options:
    -d DIR, --data DIR          Directory holding the datasets [default: data].
    -o DIR, --out DIR           Directory for generated files [default: tmp].
    -m MARKER, --marker MARKER  Category tag marker of common characters [default: 常用].
    -h, --help                  Show this message.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_data: String,
    flag_out: String,
    flag_marker: String,
}

#[test]
fn test_default_args() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.argv(vec!["cns_keytable"]).deserialize())
        .unwrap();
    assert_eq!(args.flag_data, "data");
    assert_eq!(args.flag_out, "tmp");
    assert_eq!(args.flag_marker, source_filter::COMMON_USAGE_MARKER);
}

#[test]
fn test_explicit_args() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.argv(vec!["cns_keytable", "-d", "/srv/cns", "--out", "build", "-m", "次常用"]).deserialize())
        .unwrap();
    assert_eq!(args.flag_data, "/srv/cns");
    assert_eq!(args.flag_out, "build");
    assert_eq!(args.flag_marker, "次常用");
}

pub fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    // RUST_LOG selects which events get printed; the default shows progress.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let layout = Layout::new(args.flag_data, args.flag_out);
    if let Err(e) = pipeline::run(&layout, &args.flag_marker) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
