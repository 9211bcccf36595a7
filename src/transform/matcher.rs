//! Pattern utilities for locating references inside templated SQL.
//!
//! Two kinds of directive are recognized in model source text:
//!
//! - **Reference calls**: `{{ ref('orders') }}` or `{{ ref("orders") }}` -
//!   the quoted target names another resource the model depends on.
//! - **Configuration calls**: `{{ config(materialized='table', ...) }}` -
//!   key/value settings for how the resource materializes.
//!
//! The matchers here capture only the interior of what they locate: a ref
//! rewrite receives the bare target (no quotes, no call syntax), and
//! [`config_argument_span`] returns the byte range of the argument list
//! alone, never including the delimiters around it. That keeps rewrites from
//! corrupting the surrounding call, and matching never crosses a call
//! boundary - a quoted target cannot span past its closing quote, and the
//! argument scan stops at the parenthesis that balances the opening one.
//!
//! The `regex` crate has no lookaround, so the argument list is located with
//! a regex anchor for the call head plus an explicit quote-aware scan for
//! the balancing parenthesis. Argument values may themselves contain
//! parentheses, either nested or inside string literals; both are handled.

use anyhow::{Context, Result};
use regex::Regex;
use std::ops::Range;

/// Compiled matchers for reference and configuration calls.
///
/// Compile once per transformer, reuse across files.
#[derive(Debug, Clone)]
pub struct ReferenceMatcher {
    /// `ref('target')` with the target captured bare
    ref_single: Regex,
    /// `ref("target")` with the target captured bare
    ref_double: Regex,
    /// Head of a configuration call, up to and including its `(`
    config_head: Regex,
}

impl ReferenceMatcher {
    /// Compile the reference and configuration patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile, which only happens if
    /// the embedded patterns themselves are broken.
    pub fn new() -> Result<Self> {
        // Single- and double-quoted targets are matched independently since
        // source text may mix quoting styles. `[^...]` excludes the closing
        // quote so a match can never cross the call boundary.
        let ref_single =
            Regex::new(r"\bref\(\s*'([^']+)'\s*\)").context("invalid single-quote ref pattern")?;
        let ref_double = Regex::new(r#"\bref\(\s*"([^"]+)"\s*\)"#)
            .context("invalid double-quote ref pattern")?;
        let config_head =
            Regex::new(r"\{\{\s*config\s*\(").context("invalid config-call pattern")?;

        Ok(Self {
            ref_single,
            ref_double,
            config_head,
        })
    }

    /// Rewrite every reference-call target through `rewrite`.
    ///
    /// The callback receives the bare target literal and returns its
    /// replacement; quotes and call syntax are reassembled around it, so the
    /// callback cannot corrupt the enclosing call. Both quoting styles are
    /// rewritten, each preserving the style it was written in.
    #[must_use]
    pub fn rewrite_ref_targets(&self, text: &str, rewrite: impl Fn(&str) -> String) -> String {
        let pass_one = self.ref_single.replace_all(text, |caps: &regex::Captures<'_>| {
            format!("ref('{}')", rewrite(&caps[1]))
        });
        self.ref_double
            .replace_all(&pass_one, |caps: &regex::Captures<'_>| {
                format!("ref(\"{}\")", rewrite(&caps[1]))
            })
            .into_owned()
    }

    /// Locate the argument list of the first configuration call.
    ///
    /// Returns the byte range of the argument interior only - the text
    /// between `config(` and its balancing `)`. Returns `None` when no
    /// configuration call exists, or when the call is unterminated.
    #[must_use]
    pub fn config_argument_span(&self, text: &str) -> Option<Range<usize>> {
        let head = self.config_head.find(text)?;
        let args_start = head.end();
        let args_end = args_start + balanced_paren_end(&text[args_start..])?;
        Some(args_start..args_end)
    }
}

/// Find the offset of the parenthesis balancing an already-open one.
///
/// `text` starts just after an opening `(`. Returns the byte offset of the
/// `)` that closes it, skipping parentheses nested deeper and parentheses
/// inside single- or double-quoted string literals. `None` if the text ends
/// before the call closes.
fn balanced_paren_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (offset, ch) in text.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        return Some(offset);
                    }
                    depth -= 1;
                }
                _ => {}
            },
        }
    }
    None
}
