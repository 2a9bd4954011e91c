use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const TEST_SOURCE: &'static str = "\
A1AA\t常用字
A1AB\t常用字
A1AC\t次常用字
A1AD\t罕用字
A1AE\t常用字
truncated-line
A1AF\t常用字
";

// A1AE has no character at all, A1AF a broken one.
const TEST_UNICODE_BMP: &'static str = "\
A1AA\t4E00
A1AB\t884C
A1AC\t4E2D
A1AD\t5169
A1AF\tnot-a-codepoint
";

// Loaded after the BMP file, so this wins for A1AA.
const TEST_UNICODE_OVERRIDE: &'static str = "\
A1AA\t4E2D
";

const TEST_PHONETIC: &'static str = "\
A1AA\tㄓㄨㄥ
A1AB\tㄒㄧㄥˊ
A1AB\tㄏㄤˊ
A1AC\tㄓㄨㄥˋ
";

const TEST_KEYBOARD: &'static str = "\
5\tㄓ
v\tㄒ
c\tㄏ
1\tㄅ
";

const TEST_PASS2: &'static str = "\
A1AA\t4E2D\t中
A1AB\t884C\t行
A1AC\t4E2D\t中
";

const TEST_PASS3: &'static str = "\
A1AA\t4E2D\t中\tㄓ
A1AB\t884C\t行\tㄒ
A1AB\t884C\t行\tㄏ
A1AC\t4E2D\t中\tㄓ
";

const TEST_TABLE: &'static str = "\
return {
    ['5'] = [=[中]=], -- ㄓ
    ['c'] = [=[行]=], -- ㄏ
    ['v'] = [=[行]=], -- ㄒ
}
";

macro_rules! unwrap {
    ($e:expr) => { match $e {
        Ok(x) => x,
        Err(e) => panic!("Unwrap failure: {:?}", e),
    }}
}

fn write_data(root: &Path) {
    let data = root.join("data");
    unwrap!(fs::create_dir_all(data.join("Unicode")));
    unwrap!(fs::create_dir_all(data.join("keyboard")));
    unwrap!(fs::write(data.join("CNS_source.txt"), TEST_SOURCE));
    unwrap!(fs::write(data.join("Unicode").join("CNS2UNICODE_Unicode BMP.txt"), TEST_UNICODE_BMP));
    unwrap!(fs::write(data.join("Unicode").join("CNS2UNICODE_Unicode override.txt"), TEST_UNICODE_OVERRIDE));
    unwrap!(fs::write(data.join("CNS_phonetic.txt"), TEST_PHONETIC));
    unwrap!(fs::write(data.join("keyboard").join("standard.csv"), TEST_KEYBOARD));
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    unwrap!(Command::new(env!("CARGO_BIN_EXE_cns_keytable"))
                .args(args)
                .current_dir(dir)
                .env("RUST_LOG", "info")
                .output())
}

fn read(path: &Path) -> String {
    unwrap!(fs::read_to_string(path))
}

#[test]
fn test_invocation() {
    let dir = unwrap!(TempDir::new());
    write_data(dir.path());

    let result = run_in(dir.path(), &[]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let tmp = dir.path().join("tmp");
    assert_eq!(read(&tmp.join("pass1.csv")), "A1AA\nA1AB\nA1AC\nA1AE\nA1AF\n");
    assert_eq!(read(&tmp.join("pass2.csv")), TEST_PASS2);
    assert_eq!(read(&tmp.join("pass3.csv")), TEST_PASS3);
    assert_eq!(read(&tmp.join("table.lua")), TEST_TABLE);

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("No valid Unicode character found for CNS code 'A1AE'"));
    assert!(stderr.contains("Could not convert Unicode hex 'not-a-codepoint'"));
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = unwrap!(TempDir::new());
    write_data(dir.path());

    assert!(run_in(dir.path(), &[]).status.success());
    let first = read(&dir.path().join("tmp").join("table.lua"));
    assert!(run_in(dir.path(), &[]).status.success());
    let second = read(&dir.path().join("tmp").join("table.lua"));
    assert_eq!(first, second);
}

#[test]
fn test_custom_directories() {
    let dir = unwrap!(TempDir::new());
    write_data(dir.path());
    unwrap!(fs::rename(dir.path().join("data"), dir.path().join("cns")));

    let result = run_in(dir.path(), &["--data", "cns", "-o", "out/lua"]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(read(&dir.path().join("out").join("lua").join("table.lua")), TEST_TABLE);
    assert!(!dir.path().join("tmp").exists());
}

#[test]
fn test_missing_source() {
    let dir = unwrap!(TempDir::new());

    let result = run_in(dir.path(), &[]);
    assert!(!result.status.success());

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Error: data/CNS_source.txt not found"), "stderr: {}", stderr);
    assert_eq!(stderr.matches("data/CNS_source.txt not found").count(), 1, "stderr: {}", stderr);
    assert!(!dir.path().join("tmp").join("pass1.csv").exists());
}

#[test]
fn test_missing_keyboard_stops_after_step_three() {
    let dir = unwrap!(TempDir::new());
    write_data(dir.path());
    unwrap!(fs::remove_file(dir.path().join("data").join("keyboard").join("standard.csv")));

    let result = run_in(dir.path(), &[]);
    assert!(!result.status.success());

    let tmp = dir.path().join("tmp");
    assert_eq!(read(&tmp.join("pass3.csv")), TEST_PASS3);
    assert!(!tmp.join("table.lua").exists());
}
