//! mutate: replace matched `[[category]]` spans with native references.
//!
//! Runs untouched by any match are cloned as-is. A text run that contains (part of) a
//! span is split: the text around the span keeps the run's link and annotations, and the
//! reference takes the annotations of the run where the span starts.

use crate::matcher::Match;
use crate::richtext::{Reference, Run};

#[derive(Clone, Debug, PartialEq)]
pub enum Rewrite {
    /// Nothing to replace; no update call must be issued.
    Unchanged,
    Changed { runs: Vec<Run>, references: usize },
}

impl Rewrite {
    pub fn is_changed(&self) -> bool {
        matches!(self, Rewrite::Changed { .. })
    }
}

/// Build the rewritten run sequence for `runs` given the matcher output.
pub fn rewrite(runs: &[Run], matches: &[Match]) -> Rewrite {
    if matches.is_empty() {
        return Rewrite::Unchanged;
    }

    let mut out = Vec::with_capacity(runs.len() + matches.len() * 2);
    for (idx, run) in runs.iter().enumerate() {
        let text = match run {
            Run::Text(t) => t,
            other => {
                out.push(other.clone());
                continue;
            }
        };

        let touching: Vec<&Match> = matches
            .iter()
            .filter(|m| m.start.run <= idx && idx <= m.end.run)
            .collect();
        if touching.is_empty() {
            out.push(run.clone());
            continue;
        }

        let content = text.content.as_str();
        let mut cursor = 0usize;
        for m in touching {
            let from = if m.start.run == idx { m.start.offset } else { 0 };
            let to = if m.end.run == idx { m.end.offset } else { content.len() };
            if from > cursor {
                out.push(Run::Text(text.with_content(&content[cursor..from])));
            }
            if m.start.run == idx {
                out.push(Run::Reference(Reference::category(
                    m.category.clone(),
                    text.annotations.clone(),
                )));
            }
            cursor = cursor.max(to);
        }
        if cursor < content.len() {
            out.push(Run::Text(text.with_content(&content[cursor..])));
        }
    }

    Rewrite::Changed {
        runs: out,
        references: matches.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_references;
    use crate::richtext::{plain_text, Annotations, RefTarget, TextRun};
    use serde_json::json;

    fn rewrite_runs(runs: &[Run]) -> Rewrite {
        rewrite(runs, &find_references(runs))
    }

    fn cat(name: &str) -> Run {
        Run::Reference(Reference::category(name, Annotations::default()))
    }

    #[test]
    fn unchanged_without_matches() {
        let runs = vec![Run::text("no links here"), Run::Other(json!({"type": "equation"}))];
        assert_eq!(rewrite_runs(&runs), Rewrite::Unchanged);
        assert!(!rewrite_runs(&[]).is_changed());
    }

    #[test]
    fn two_references_in_one_run() {
        let runs = vec![Run::text("See [[Projects]] and [[Ideas]]")];
        let Rewrite::Changed { runs: out, references } = rewrite_runs(&runs) else {
            panic!("expected a rewrite");
        };
        assert_eq!(references, 2);
        assert_eq!(
            out,
            vec![Run::text("See "), cat("Projects"), Run::text(" and "), cat("Ideas")]
        );
    }

    #[test]
    fn whole_run_becomes_reference() {
        let runs = vec![Run::text("[[Projects]]")];
        let Rewrite::Changed { runs: out, .. } = rewrite_runs(&runs) else {
            panic!("expected a rewrite");
        };
        assert_eq!(out, vec![cat("Projects")]);
    }

    #[test]
    fn other_runs_preserved_exactly() {
        let mut linked = TextRun::plain("a link");
        linked.link = Some("https://example.com".into());
        linked.annotations.italic = true;
        let eq = Run::Other(json!({"type": "equation", "equation": {"expression": "x^2"}}));
        let runs = vec![Run::Text(linked.clone()), Run::text(" then [[X]]."), eq.clone()];

        let Rewrite::Changed { runs: out, .. } = rewrite_runs(&runs) else {
            panic!("expected a rewrite");
        };
        assert_eq!(out[0], Run::Text(linked));
        assert_eq!(out[1], Run::text(" then "));
        assert_eq!(out[2], cat("X"));
        assert_eq!(out[3], Run::text("."));
        assert_eq!(out[4], eq);
    }

    #[test]
    fn split_keeps_run_formatting() {
        let mut bold = TextRun::plain("pre [[Deep Work]] post");
        bold.annotations.bold = true;
        bold.annotations.color = "red".into();
        let Rewrite::Changed { runs: out, .. } = rewrite_runs(&[Run::Text(bold.clone())]) else {
            panic!("expected a rewrite");
        };
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Run::Text(bold.with_content("pre ")));
        match &out[1] {
            Run::Reference(r) => {
                assert_eq!(r.target, RefTarget::Category("Deep Work".into()));
                assert!(r.annotations.bold);
                assert_eq!(r.annotations.color, "red");
            }
            other => panic!("unexpected run {other:?}"),
        }
        assert_eq!(out[2], Run::Text(bold.with_content(" post")));
    }

    #[test]
    fn span_across_runs_collapses_to_one_reference() {
        let mut second = TextRun::plain("ects]] tail");
        second.annotations.underline = true;
        let runs = vec![Run::text("x [[Proj"), Run::Text(second.clone())];
        let Rewrite::Changed { runs: out, references } = rewrite_runs(&runs) else {
            panic!("expected a rewrite");
        };
        assert_eq!(references, 1);
        assert_eq!(
            out,
            vec![Run::text("x "), cat("Projects"), Run::Text(second.with_content(" tail"))]
        );
    }

    #[test]
    fn second_pass_is_noop() {
        let runs = vec![
            Run::text("[[a]] b [[c]]"),
            Run::text("[[d"),
            Run::text("]] e"),
        ];
        let Rewrite::Changed { runs: once, .. } = rewrite_runs(&runs) else {
            panic!("expected a rewrite");
        };
        assert_eq!(rewrite_runs(&once), Rewrite::Unchanged);
        assert_eq!(plain_text(&once), "@a b @c@d e");
    }
}
