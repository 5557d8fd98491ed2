//! The driver: turns a list of positional paths (or a `--check` file)
//! into printed output.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::error::{WalkError, XsumError};
use crate::gate::Gate;
use crate::hash::HashProvider;
use crate::mask::Mask;
use crate::node::Node;
use crate::queue::OrderedQueue;
use crate::walker::walk;

/// Runs the walker over every positional path and prints one line per
/// path, in input order, as soon as that path's subtree is complete.
/// Returns `true` if every path hashed successfully.
pub fn run(paths: &[PathBuf], mask: &Mask, hasher: &dyn HashProvider) -> bool {
    let gate = Gate::sized_to_cpus();
    let queue: OrderedQueue<Result<Node, WalkError>> = OrderedQueue::new(paths.len());
    let mut all_ok = true;

    thread::scope(|scope| {
        for (index, path) in paths.iter().enumerate() {
            let gate = &gate;
            let queue = &queue;
            scope.spawn(move || {
                let result = walk(path, false, gate, mask, hasher);
                queue.add(index, result);
            });
        }

        while let Some(result) = queue.next() {
            match result {
                Ok(node) => println!("{}", format_line(&node, mask)),
                Err(e) => {
                    log::error!("{e}");
                    eprintln!("xsum: {e}");
                    all_ok = false;
                }
            }
        }
    });

    all_ok
}

fn format_line(node: &Node, mask: &Mask) -> String {
    let digest_hex = hex::encode(&node.digest);
    let path_str = node.path.to_string_lossy().replace('\\', "/");
    if node.is_dir() {
        format!("{digest_hex}:{mask}  {path_str}")
    } else {
        format!("{digest_hex}  {path_str}")
    }
}

/// Re-checks every entry in a previously produced `xsum` output file
/// against the current state of the filesystem. Returns `true` if every
/// path still matches.
pub fn check(list_path: &Path, default_mask: &Mask, hasher: &dyn HashProvider) -> Result<bool, XsumError> {
    let gate = Gate::sized_to_cpus();
    let content = fs::read_to_string(list_path).map_err(XsumError::ReadFailed)?;
    let mut all_ok = true;

    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (expected_hex, mask, path) = parse_check_line(line)
            .ok_or_else(|| XsumError::CheckParse(format!("line {}: {line}", lineno + 1)))?;
        let effective_mask = mask.unwrap_or(*default_mask);

        match walk(&path, false, &gate, &effective_mask, hasher) {
            Ok(node) => {
                let actual_hex = hex::encode(&node.digest);
                if actual_hex == expected_hex {
                    println!("OK {}", path.display());
                } else {
                    println!("FAILED {}", path.display());
                    all_ok = false;
                }
            }
            Err(e) => {
                log::error!("{e}");
                println!("FAILED {} (error: {e})", path.display());
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

/// Parses one line of `xsum` output: `<hex>[:<mask>]  <path>`.
fn parse_check_line(line: &str) -> Option<(String, Option<Mask>, PathBuf)> {
    let (digest_part, path_part) = line.split_once("  ")?;
    let path = PathBuf::from(path_part);

    if let Some((hex_part, mask_part)) = digest_part.split_once(':') {
        let mask = Mask::parse(mask_part).ok()?;
        Some((hex_part.to_string(), Some(mask), path))
    } else {
        Some((digest_part.to_string(), None, path))
    }
}
