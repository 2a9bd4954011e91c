// table_builder.rs: Group characters by keyboard key and render the Lua table.
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

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use handlebars::{handlebars_helper, no_escape, Handlebars};
use indexmap::{IndexMap, IndexSet};
use regex::{Captures, Regex};
use serde_json::json;
use tracing::info;

use crate::error::PipelineError;
use crate::records::{for_each_row, load, ExpandedRecord};

//{{{ Keyboard mapping

/// Phonetic symbol to keyboard key, in the order the symbols first appear in
/// the keyboard file.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct KeyboardMap {
    keys: IndexMap<String, String>,
}

impl KeyboardMap {
    /// Parses `key\tsymbol` lines. A symbol listed twice keeps its first
    /// position but takes the key of its last line.
    pub fn parse<R: BufRead>(reader: R) -> io::Result<KeyboardMap> {
        let mut map = KeyboardMap::default();
        for_each_row(reader, 2, |fields| {
            map.keys.insert(fields[1].to_owned(), fields[0].to_owned());
        })?;
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_for(&self, symbol: &str) -> Option<&str> {
        self.keys.get(symbol).map(|k| &**k)
    }

    /// The first symbol, in file order, typed with `key`.
    pub fn symbol_for(&self, key: &str) -> Option<&str> {
        self.keys.iter().find(|&(_, k)| k == key).map(|(s, _)| &**s)
    }
}

#[test]
fn test_keyboard_map() {
    let map = KeyboardMap::parse("\
1\tㄅ
q\tㄆ
a\tㄇ
broken
5\tㄓ
q\tㄆˊ
".as_bytes()).unwrap();

    assert_eq!(map.len(), 5);
    assert!(!map.is_empty());
    assert!(KeyboardMap::default().is_empty());
    assert_eq!(map.key_for("ㄓ"), Some("5"));
    assert_eq!(map.key_for("ㄈ"), None);
    assert_eq!(map.key_for(""), None);
    assert_eq!(map.symbol_for("q"), Some("ㄆ"));
    assert_eq!(map.symbol_for("z"), None);
}

#[test]
fn test_keyboard_map_duplicate_symbol() {
    let map = KeyboardMap::parse("a\tㄅ\nb\tㄆ\nc\tㄅ\n".as_bytes()).unwrap();
    assert_eq!(map.key_for("ㄅ"), Some("c"));
    assert_eq!(map.symbol_for("a"), None);
    assert_eq!(map.symbol_for("c"), Some("ㄅ"));
    assert_eq!(map.keys.keys().collect::<Vec<_>>(), vec!["ㄅ", "ㄆ"]);
}

//}}}

//{{{ Grouping

/// Characters per keyboard key. Keys iterate in ascending order; characters
/// keep the order in which they were first seen.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct KeyTable {
    groups: BTreeMap<String, IndexSet<String>>,
}

impl KeyTable {
    pub fn build(rows: &[ExpandedRecord], keyboard: &KeyboardMap) -> KeyTable {
        let mut table = KeyTable::default();
        for row in rows {
            let character = &row.joined.character;
            let key = match keyboard.key_for(&row.initial) {
                Some(key) if !key.is_empty() && !character.is_empty() => key,
                _ => continue,
            };
            table.groups.entry(key.to_owned()).or_default().insert(character.clone());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, String)> {
        self.groups.iter().map(|(key, chars)| {
            (&**key, chars.iter().map(|c| &**c).collect())
        })
    }
}

#[cfg(test)]
fn expanded(code: &str, character: &str, initial: &str) -> ExpandedRecord {
    ExpandedRecord::from_fields(&[code, "", character, initial]).unwrap()
}

#[test]
fn test_build_groups_and_dedups() {
    let keyboard = KeyboardMap::parse("5\tㄓ\nv\tㄒ\nc\tㄏ\n".as_bytes()).unwrap();
    let rows = vec![
        expanded("A1AA", "中", "ㄓ"),
        expanded("A1AB", "行", "ㄒ"),
        expanded("A1AB", "行", "ㄏ"),
        expanded("A1AC", "之", "ㄓ"),
        expanded("A1AD", "中", "ㄓ"),
        expanded("A1AE", "一", ""),
        expanded("A1AF", "乙", "ㄧ"),
        expanded("A1B0", "", "ㄓ"),
        expanded("A1B1", "行", "ㄒ"),
    ];

    let table = KeyTable::build(&rows, &keyboard);
    assert_eq!(table.entries().collect::<Vec<_>>(), vec![
        ("5", "中之".to_owned()),
        ("c", "行".to_owned()),
        ("v", "行".to_owned()),
    ]);
}

#[test]
fn test_build_keys_sorted() {
    let keyboard = KeyboardMap::parse("z\tㄈ\n1\tㄅ\n,\tㄝ\nA\tㄇ\n".as_bytes()).unwrap();
    let rows = vec![
        expanded("1", "法", "ㄈ"),
        expanded("2", "夜", "ㄝ"),
        expanded("3", "八", "ㄅ"),
        expanded("4", "馬", "ㄇ"),
    ];
    let table = KeyTable::build(&rows, &keyboard);
    assert_eq!(table.len(), 4);
    let keys = table.entries().map(|(k, _)| k).collect::<Vec<_>>();
    assert_eq!(keys, vec![",", "1", "A", "z"]);
}

//}}}

//{{{ Lua rendering

/// Quotes `key` as a single-quoted Lua string.
pub fn lua_key(key: &str) -> String {
    lazy_static! {
        static ref ESCAPE_REGEX: Regex = Regex::new(r"[\\'\n\r]").unwrap();
    }
    let escaped = ESCAPE_REGEX.replace_all(key, |captures: &Captures| {
        match &captures[0] {
            "\\" => r"\\",
            "'" => r"\'",
            "\n" => r"\n",
            "\r" => r"\r",
            _ => unreachable!(),
        }
    });
    format!("'{}'", escaped)
}

/// Wraps `content` in a Lua long bracket `[=[...]=]`, adding `=` signs until
/// the closing bracket cannot appear inside the content.
pub fn long_string(content: &str) -> String {
    let padded = format!("{}]", content);
    let mut level = 1;
    while padded.contains(&format!("]{}]", "=".repeat(level))) {
        level += 1;
    }
    let equals = "=".repeat(level);
    format!("[{0}[{1}]{0}]", equals, content)
}

#[test]
fn test_lua_key() {
    assert_eq!(lua_key("A"), "'A'");
    assert_eq!(lua_key(","), "','");
    assert_eq!(lua_key("'"), r"'\''");
    assert_eq!(lua_key("\\"), r"'\\'");
}

#[test]
fn test_long_string() {
    assert_eq!(long_string("中之"), "[=[中之]=]");
    assert_eq!(long_string(""), "[=[]=]");
    assert_eq!(long_string("a]]b"), "[=[a]]b]=]");
    assert_eq!(long_string("a]=]b"), "[==[a]=]b]==]");
    assert_eq!(long_string("a]="), "[==[a]=]==]");
    assert_eq!(long_string("]=]]==]"), "[===[]=]]==]]===]");
}

const ENTRY_TEMPLATE: &str = "    [{{lua_key key}}] = {{long_string chars}}, -- {{symbol}}";

handlebars_helper!(lua_key_helper: |key: str| lua_key(key));
handlebars_helper!(long_string_helper: |chars: str| long_string(chars));

/// Renders `table` as a Lua chunk returning a key to characters table. Each
/// entry is annotated with the phonetic symbol typed by its key.
pub fn render(table: &KeyTable, keyboard: &KeyboardMap) -> Result<String, PipelineError> {
    let mut template = Handlebars::new();
    template.register_escape_fn(no_escape);
    template.register_template_string("entry", ENTRY_TEMPLATE)?;
    template.register_helper("lua_key", Box::new(lua_key_helper));
    template.register_helper("long_string", Box::new(long_string_helper));

    let mut result = String::from("return {\n");
    for (key, chars) in table.entries() {
        let data = json!({
            "key": key,
            "chars": chars,
            "symbol": keyboard.symbol_for(key).unwrap_or(""),
        });
        result.push_str(&template.render("entry", &data)?);
        result.push('\n');
    }
    result.push_str("}\n");
    Ok(result)
}

#[test]
fn test_render() {
    let keyboard = KeyboardMap::parse("5\tㄓ\nv\tㄒ\nc\tㄏ\n".as_bytes()).unwrap();
    let rows = vec![
        expanded("A1AA", "中", "ㄓ"),
        expanded("A1AB", "行", "ㄒ"),
        expanded("A1AB", "<&>", "ㄏ"),
        expanded("A1AC", "之", "ㄓ"),
    ];
    let table = KeyTable::build(&rows, &keyboard);
    assert_eq!(render(&table, &keyboard).unwrap(), "\
return {
    ['5'] = [=[中之]=], -- ㄓ
    ['c'] = [=[<&>]=], -- ㄏ
    ['v'] = [=[行]=], -- ㄒ
}
");
}

#[test]
fn test_render_empty() {
    let table = KeyTable::default();
    assert!(table.is_empty());
    assert_eq!(render(&table, &KeyboardMap::default()).unwrap(), "return {\n}\n");
}

//}}}

/// Reads the rows of a `pass3.csv` file. Rows with fewer than four fields
/// have no initial and are dropped.
pub fn read_expanded<R: BufRead>(reader: R) -> io::Result<Vec<ExpandedRecord>> {
    let mut rows = Vec::new();
    for_each_row(reader, 4, |fields| rows.extend(ExpandedRecord::from_fields(fields)))?;
    Ok(rows)
}

pub fn run(keyboard: &Path, pass3: &Path, table_path: &Path) -> Result<KeyTable, PipelineError> {
    let keyboard_map = load(keyboard, KeyboardMap::parse)?;
    info!("Loaded {} keyboard mappings from {}", keyboard_map.len(), keyboard.display());

    let rows = load(pass3, read_expanded)?;
    let table = KeyTable::build(&rows, &keyboard_map);
    let lua = render(&table, &keyboard_map)?;
    fs::write(table_path, lua).map_err(|e| PipelineError::write(table_path, e))?;

    info!("Step 4 completed: Lua table with {} keys saved to {}", table.len(), table_path.display());
    Ok(table)
}
