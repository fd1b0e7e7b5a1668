//! Trace table chooser for a bare `trace-view` invocation.
//!
//! Lists the FITS files below the working directory and reads a number or a
//! path from stdin. Whether the chosen file really is a trace table is left
//! to the FITS reader.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Directory levels searched below the working directory.
const SEARCH_DEPTH: usize = 2;

/// Ask for a trace table on stdin; `q` or end of input cancels.
pub fn prompt_for_trace_table() -> Result<PathBuf, AppError> {
    let candidates = fits_files_below(Path::new("."), SEARCH_DEPTH);
    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            "No FITS files here. Run `trace-view trace <tw.fits>` instead.",
        ));
    }

    for (n, path) in candidates.iter().enumerate() {
        println!("{:>3}) {}", n + 1, path.strip_prefix(".").unwrap_or(path).display());
    }

    let io_err = |e: io::Error| AppError::new(2, format!("Failed to read the selection: {e}"));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("trace table [1-{}, path, q]: ", candidates.len());
        io::stdout().flush().map_err(io_err)?;

        let Some(line) = lines.next().transpose().map_err(io_err)? else {
            return Err(AppError::new(2, "No trace table selected."));
        };
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "No trace table selected."));
        }

        let chosen = match answer.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => candidates[n - 1].clone(),
            Ok(n) => {
                println!("{n} is not in the list");
                continue;
            }
            Err(_) => PathBuf::from(answer),
        };
        if chosen.is_file() {
            return Ok(chosen);
        }
        println!("not a file: {}", chosen.display());
    }
}

/// FITS files at most `depth` directories below `root`, sorted. Hidden and
/// `target` directories are not entered.
fn fits_files_below(root: &Path, depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0)];
    while let Some((dir, level)) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match entry.file_type() {
                Ok(t) if t.is_dir() => {
                    if level < depth && !name.starts_with('.') && name != "target" {
                        pending.push((path, level + 1));
                    }
                }
                Ok(t) if t.is_file() && is_fits_name(&name) => found.push(path),
                _ => {}
            }
        }
    }
    found.sort();
    found
}

fn is_fits_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    [".fits", ".fit", ".fts"].iter().any(|ext| lower.ends_with(ext))
}
