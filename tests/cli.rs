use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const CLIENT_PAGE: &str = "\"use client\"\n\nimport { useRouter } from 'next/navigation'\n\nexport default function Page() {\n  const router = useRouter()\n  return <button onClick={() => router.back()}>Back</button>\n}\n";

fn run_pagemod(cwd: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_pagemod");
    Command::new(exe)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run pagemod")
}

fn write_page(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create parent dir");
    fs::write(path, content).expect("write file");
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn runs_with_no_arguments_from_project_root() {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "src/app/page.tsx", CLIENT_PAGE.as_bytes());

    let out = run_pagemod(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Found 1 page.tsx file(s)"), "{text}");
    assert!(text.contains("converted: src/app/page.tsx"), "{text}");
    assert!(text.contains("Done: converted 1 of 1 file(s)"), "{text}");

    let page = fs::read_to_string(dir.path().join("src/app/page.tsx")).unwrap();
    assert!(page.starts_with("import { useNavigate } from 'react-router-dom'\n"));
    assert!(page.contains("navigate(-1)"));
}

#[test]
fn partial_failure_still_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "src/app/page.tsx", CLIENT_PAGE.as_bytes());
    write_page(dir.path(), "src/app/broken/page.tsx", &[0xff, 0xfe, 0xfd]);

    let out = run_pagemod(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    assert!(stdout(&out).contains("converted: src/app/page.tsx"));
    assert!(stderr(&out).contains("failed: src/app/broken/page.tsx"));
}

#[test]
fn missing_root_exits_non_zero() {
    let dir = TempDir::new().unwrap();

    let out = run_pagemod(dir.path(), &["--root", "does/not/exist"]);

    assert_ne!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("Root directory not found"), "{}", stderr(&out));
}

#[test]
fn invalid_config_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "pagemod.yaml", b"rules:\n  - type: replace_pattern\n    pattern: \"(\"\n    replacement: x\n");

    let out = run_pagemod(dir.path(), &["--config", "pagemod.yaml"]);

    assert_ne!(out.status.code(), Some(0));
}

#[test]
fn json_dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "web/app/page.tsx", CLIENT_PAGE.as_bytes());
    let base = dir.path().join("web");

    let out = run_pagemod(
        dir.path(),
        &["--base", base.to_str().unwrap(), "--root", "app", "--dry-run", "--json"],
    );

    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let v: Value = serde_json::from_slice(&out.stdout).expect("parse stdout JSON");
    assert_eq!(v["dry_run"], true);
    assert_eq!(v["total_discovered"], 1);
    assert_eq!(v["total_changed"], 1);
    assert_eq!(v["changed_paths"][0], "app/page.tsx");
    assert_eq!(v["outcomes"][0]["status"], "would_rewrite");

    let page = fs::read_to_string(dir.path().join("web/app/page.tsx")).unwrap();
    assert_eq!(page, CLIENT_PAGE);
}

#[test]
fn config_file_sets_base_and_filename() {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "site/routes/page.jsx", CLIENT_PAGE.as_bytes());
    write_page(
        dir.path(),
        "site/pagemod.json",
        br#"{ "target_filename": "page.jsx", "root_directory": "routes" }"#,
    );

    let out = run_pagemod(dir.path(), &["--config", "site/pagemod.json"]);

    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    assert!(stdout(&out).contains("converted: routes/page.jsx"), "{}", stdout(&out));
}

#[test]
fn rules_subcommand_lists_preset() {
    let dir = TempDir::new().unwrap();

    let out = run_pagemod(dir.path(), &["rules"]);

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("next-to-react-router: "));
    assert!(text.contains("strip-directive"));
    assert!(text.contains("router-call-sites"));
}
