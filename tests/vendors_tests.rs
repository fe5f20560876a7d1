use std::io::Write;
use subnet_sentry::vendors::{load_vendors_from_path, load_vendors_or_default, parse_vendors_str};

#[test]
fn parse_prefixes_labels_and_comments() {
    let input = r#"
        # home lab
        b8:27:eb  Raspberry Pi
        00:1A:2B  Office Router   # overrides the built-in label

    "#;
    let entries = parse_vendors_str(input).expect("parse ok");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "B8:27:EB");
    assert_eq!(entries[1].1, "Office Router");
}

#[test]
fn vendor_file_extends_builtin_table() {
    let path = std::env::temp_dir().join(format!("subnet-sentry-vendors-{}.txt", std::process::id()));
    {
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "B8:27:EB Raspberry Pi").unwrap();
    }
    let table = load_vendors_from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(table.guess("B8:27:EB:01:02:03"), "Raspberry Pi");
    assert_eq!(table.guess("FC:DB:B3:11:22:33"), "Samsung Device");
}

#[test]
fn no_vendor_file_uses_builtin() {
    let table = load_vendors_or_default(None).unwrap();
    assert_eq!(table.len(), 8);
    assert_eq!(table.guess("DC:85:DE:00:00:00"), "Xiaomi Device");
}

#[test]
fn unreadable_vendor_file_is_an_error() {
    assert!(load_vendors_from_path("/nonexistent/subnet-sentry/vendors.txt").is_err());
}
