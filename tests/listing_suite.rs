use std::fs;
use std::path::{Path, PathBuf};

use codetrans::codegen::{apply_transform, CodeBuffer, CodeRelabeler, CodeStackTracker, CodeTransform};
use codetrans::parser::{parse_listing, ListingPrinter};
use codetrans::Config;
use walkdir::WalkDir;

fn listings_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("listings")
}

/// Header expectations: `# expect max_stack N|unknown` and optional `# initial <descriptors>`
fn expectations(source: &str) -> Result<(Config, Option<usize>), String> {
    let mut config = Config::default();
    let mut expected = None;
    for line in source.lines() {
        if let Some(rest) = line.strip_prefix("# initial ") {
            config = config.with_initial_stack_descriptor(rest.trim()).map_err(|e| e.to_string())?;
        } else if let Some(rest) = line.strip_prefix("# expect max_stack ") {
            expected = Some(match rest.trim() {
                "unknown" => None,
                n => Some(n.parse::<usize>().map_err(|e| e.to_string())?),
            });
        }
    }
    let expected = expected.ok_or_else(|| "missing '# expect max_stack' header".to_string())?;
    Ok((config, expected))
}

fn check(source: &str) -> Result<(), String> {
    let (config, expected) = expectations(source)?;
    let mut buffer = CodeBuffer::new();
    let elements = parse_listing(source, &mut buffer).map_err(|e| e.to_string())?;

    let mut tracker = CodeStackTracker::with_initial_stack(&config.initial_stack);
    for element in &elements {
        tracker.track(element);
    }
    if tracker.max_stack_size() != expected {
        return Err(format!("max_stack {:?}, expected {:?}", tracker.max_stack_size(), expected));
    }

    // Relabeling then tracking must agree with tracking alone
    let mut chain = CodeRelabeler::new().and_then(CodeStackTracker::with_initial_stack(&config.initial_stack));
    let relabeled = apply_transform(&mut chain, elements.clone());
    let (_, chained) = chain.into_parts();
    if chained.max_stack_size() != expected {
        return Err(format!("relabeled max_stack {:?}, expected {:?}", chained.max_stack_size(), expected));
    }
    if ListingPrinter::render(&relabeled) != ListingPrinter::render(&elements) {
        return Err("relabeled listing differs in shape".to_string());
    }
    Ok(())
}

#[test]
fn track_all_listings_under_tests_listings() {
    let root = listings_root();
    assert!(root.exists(), "tests/listings directory not found: {}", root.display());

    let mut failures: Vec<(String, String)> = Vec::new();
    let mut total: usize = 0;

    for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().map(|e| e == "jasm").unwrap_or(false) {
            total += 1;
            let outcome = fs::read_to_string(path)
                .map_err(|io_err| format!("IO error: {}", io_err))
                .and_then(|source| check(&source));
            if let Err(e) = outcome {
                failures.push((path.display().to_string(), e));
            }
        }
    }

    assert!(total > 0, "no listings found under {}", root.display());
    if !failures.is_empty() {
        eprintln!("Checked {} listings. {} failed:\n", total, failures.len());
        for (p, e) in &failures {
            eprintln!("- {} -> {}\n", p, e);
        }
        panic!("Listing failures: {} of {}", failures.len(), total);
    }
}
