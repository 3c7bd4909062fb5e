//! matcher: поиск `[[category]]` в rich-text.
//!
//! Правила:
//! - non-greedy: первый `]]` после `[[` закрывает спан;
//! - спан никогда не содержит `[[` внутри (для `[[a [[b]]` совпадение: `[[b]]`);
//! - одиночная `[` никогда не начинает совпадение;
//! - спан не пересекает перевод строки;
//! - category = внутренний текст без пробелов по краям; пустая category не совпадает.
//!
//! Соседние text-run'ы сканируются как одна строка, поэтому спан может начинаться в одном
//! run'е и заканчиваться в другом. Reference/Other run разрывает группу.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::richtext::Run;

fn legacy_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[(.*?)\]\]").expect("static regex"))
}

/// Position inside a run sequence: run index + byte offset into that run's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunPos {
    pub run: usize,
    pub offset: usize,
}

/// One legacy span. `end` is exclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: RunPos,
    pub end: RunPos,
    pub category: String,
}

/// Span found in a single string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMatch {
    pub span: Range<usize>,
    pub category: String,
}

/// Find all legacy spans in `text`, in order.
pub fn find_in_text(text: &str) -> Vec<TextMatch> {
    let mut out = Vec::new();
    for caps in legacy_link_re().captures_iter(text) {
        let (Some(full), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let mut start = full.start();
        let mut inner_start = inner.start();
        // `[[a [[b]]` -> начинаем с последнего `[[`
        if let Some(p) = inner.as_str().rfind("[[") {
            start = inner.start() + p;
            inner_start = start + 2;
        }
        let category = text[inner_start..inner.end()].trim();
        if category.is_empty() {
            continue;
        }
        out.push(TextMatch {
            span: start..full.end(),
            category: category.to_string(),
        });
    }
    out
}

/// Find all legacy spans across a block's runs.
/// Empty result means the block is already covered.
pub fn find_references(runs: &[Run]) -> Vec<Match> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        if runs[i].as_text().is_none() {
            i += 1;
            continue;
        }
        // группа соседних text-run'ов [i, j)
        let mut j = i;
        let mut joined = String::new();
        let mut bounds: Vec<(usize, usize)> = Vec::new(); // (run index, offset in joined)
        while j < runs.len() {
            let Some(t) = runs[j].as_text() else { break };
            bounds.push((j, joined.len()));
            joined.push_str(&t.content);
            j += 1;
        }

        for m in find_in_text(&joined) {
            let (Some(start), Some(end)) = (
                locate_start(runs, &bounds, m.span.start),
                locate_end(runs, &bounds, m.span.end),
            ) else {
                continue;
            };
            out.push(Match {
                start,
                end,
                category: m.category,
            });
        }
        i = j;
    }
    out
}

fn run_len(runs: &[Run], idx: usize) -> usize {
    runs[idx].as_text().map(|t| t.content.len()).unwrap_or(0)
}

// Run, в котором лежит байт `pos` склеенной строки.
fn locate_start(runs: &[Run], bounds: &[(usize, usize)], pos: usize) -> Option<RunPos> {
    bounds.iter().find_map(|&(run, base)| {
        let len = run_len(runs, run);
        (pos >= base && pos < base + len).then(|| RunPos {
            run,
            offset: pos - base,
        })
    })
}

// Run, в котором заканчивается спан (exclusive end внутри или на конце run'а).
fn locate_end(runs: &[Run], bounds: &[(usize, usize)], pos: usize) -> Option<RunPos> {
    bounds.iter().find_map(|&(run, base)| {
        let len = run_len(runs, run);
        (pos > base && pos <= base + len).then(|| RunPos {
            run,
            offset: pos - base,
        })
    })
}
