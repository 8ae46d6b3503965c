//! Offline diagnostics: show canonical forms and the hashes a URL expands to.

use std::io::{self, Write};

use log::warn;

use sb_core::canonical::canonicalize;
use sb_core::hash::Digest;
use sb_core::permutation::permutations;

use crate::input::{open_input, read_lines};

pub struct InspectOptions {
    pub input: String,
}

pub fn run_canonicalize(opts: InspectOptions) -> Result<(), String> {
    let urls = read_lines(open_input(&opts.input)?)?;
    let stdout = io::stdout();
    write_canonical(&urls, &mut stdout.lock())
}

pub fn run_hashes(opts: InspectOptions) -> Result<(), String> {
    let urls = read_lines(open_input(&opts.input)?)?;
    let stdout = io::stdout();
    write_hashes(&urls, &mut stdout.lock())
}

/// One canonical URL per input line; unparseable input is logged and skipped.
fn write_canonical<W: Write>(urls: &[String], out: &mut W) -> Result<(), String> {
    for url in urls {
        match canonicalize(url) {
            Ok(canonical) => writeln!(out, "{}", canonical)
                .map_err(|e| format!("Failed to write output: {}", e))?,
            Err(e) => warn!("{}", e),
        }
    }
    Ok(())
}

/// Each canonical URL followed by its permutations, full hashes and prefixes.
fn write_hashes<W: Write>(urls: &[String], out: &mut W) -> Result<(), String> {
    let write_err = |e: io::Error| format!("Failed to write output: {}", e);

    for url in urls {
        let canonical = match canonicalize(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        writeln!(out, "{}", canonical).map_err(write_err)?;
        for permutation in permutations(&canonical) {
            let digest = Digest::of(&permutation);
            writeln!(
                out,
                "  {:<40} {} {}",
                permutation,
                digest.to_base64(),
                digest.prefix().to_base64()
            )
            .map_err(write_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_write_canonical() {
        let mut out = Vec::new();
        write_canonical(
            &urls(&["http://www.GOOgle.com/", "http:///", "3279880203/blah"]),
            &mut out,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "http://www.google.com/\nhttp://195.127.0.11/blah\n"
        );
    }

    #[test]
    fn test_write_hashes() {
        let mut out = Vec::new();
        write_hashes(&urls(&["http://google.com/a/b.html"]), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "http://google.com/a/b.html");
        assert!(lines[1].trim_start().starts_with("google.com/a/b.html "));
        assert!(lines[1].ends_with("0h4FTPSJM1Damm/PCrfZXtRDoZC4ARG4gUjf1U8Soz0= 0h4FTA=="));
        assert!(lines[3].ends_with("uCjy7Q=="));
    }
}
