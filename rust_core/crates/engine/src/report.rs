//! Text and JSON views of an engine.

use std::fmt::Write;

use chrono::NaiveDateTime;
use serde_json::{Value, json};
use swing_types::TrendState;

use crate::engine::TrendEngine;
use crate::pivots::Pivot;
use crate::record::Mark;

const RED: &str = "\x1B[4;31m";
const GREEN: &str = "\x1B[4;32m";
const RESET: &str = "\x1B[0m";

/// Column order of the six recorded states.
const COLUMNS: [TrendState; 6] = [
    TrendState::SRally,
    TrendState::Rally,
    TrendState::UpTrend,
    TrendState::DownTrend,
    TrendState::Reaction,
    TrendState::SReaction,
];

/// Options for [`TrendEngine::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderOptions {
    /// Before the newest pivot, print pivot marks only
    pub pivots_only: bool,
    /// Print records that carry no state
    pub include_empty: bool,
    /// Underline pivots with ANSI colors
    pub color: bool,
}

struct Line {
    stamp: NaiveDateTime,
    mark: Option<Mark>,
    range: Option<i64>,
    obv: Option<i64>,
}

impl TrendEngine {
    /// Renders one line per recorded state: OBV, date, the six state
    /// columns and the average range.
    #[must_use]
    pub fn render(&self, opts: RenderOptions) -> String {
        let last_piv = self.pivot_list().newest().map(|p| p.index);
        let bars = self.series().bars();
        let mut out = String::new();
        for (ix, rec) in self.records().iter().enumerate() {
            if rec.first.is_none() && !opts.include_empty {
                continue;
            }
            let after_last = last_piv.is_none_or(|lp| ix > lp);
            let before_last = last_piv.is_some_and(|lp| ix < lp);
            if opts.pivots_only && before_last && !rec.is_pivot() {
                continue;
            }
            let show = |mark: Option<Mark>| !opts.pivots_only || after_last || mark.is_some_and(|m| m.pivot);
            if show(rec.first) {
                self.push_line(&mut out, ix, bars[ix].stamp, rec.first, rec.range, opts.color);
            }
            if rec.second.is_some() && show(rec.second) {
                self.push_line(&mut out, ix, bars[ix].stamp, rec.second, rec.range, opts.color);
            }
        }
        out
    }

    /// Renders the last `n` confirmed pivots and the tentative one.
    #[must_use]
    pub fn render_pivots(&self, n: usize, color: bool) -> String {
        let mut out = String::new();
        for pivot in self.pivots(n) {
            let line = Line {
                stamp: pivot.date,
                mark: Some(Mark {
                    state: pivot.state,
                    price: pivot.price,
                    pivot: pivot.confirmed,
                }),
                range: Some(pivot.range),
                obv: Some(pivot.obv),
            };
            self.write_line(&mut out, &line, color);
        }
        out
    }

    /// Last `n` confirmed pivots and the tentative one as JSON.
    ///
    /// Keys are short: `d` date, `x` price, `s` state number, `r` range,
    /// `v` OBV and `p` confirmed. The tentative entry also carries `s_1`,
    /// the previous primary state.
    #[must_use]
    pub fn pivots_json(&self, n: usize) -> Value {
        let pivots = self.pivots(n);
        let count = pivots.len();
        let entries: Vec<Value> = pivots
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut entry = pivot_json(p, &self.stamp_label(p.date));
                if i + 1 == count {
                    entry["s_1"] = json!(self.previous_primary_state().map(TrendState::index));
                }
                entry
            })
            .collect();
        json!({ "f": self.factor(), "pivs": entries })
    }

    fn push_line(&self, out: &mut String, ix: usize, stamp: NaiveDateTime, mark: Option<Mark>, range: i64, color: bool) {
        let obv = mark
            .filter(|m| m.pivot)
            .and_then(|m| self.pivot_list().find(ix, m.state))
            .map(|p| p.obv);
        let line = Line {
            stamp,
            mark,
            range: Some(range),
            obv,
        };
        self.write_line(out, &line, color);
    }

    fn write_line(&self, out: &mut String, line: &Line, color: bool) {
        match line.obv {
            Some(obv) => {
                let _ = write!(out, "{obv:6}");
            }
            None => out.push_str("      "),
        }
        let _ = write!(out, " {} |", self.stamp_label(line.stamp));
        for column in COLUMNS {
            match line.mark {
                Some(m) if m.state == column => out.push_str(&cell(m, color)),
                _ => out.push_str("       "),
            }
            out.push('|');
        }
        match line.range {
            Some(rg) => {
                let _ = writeln!(out, "{rg:6}");
            }
            None => out.push_str("      \n"),
        }
    }

    fn stamp_label(&self, stamp: NaiveDateTime) -> String {
        if self.series().interval().is_intraday() {
            stamp.format("%Y-%m-%d %H:%M").to_string()
        } else {
            stamp.format("%Y-%m-%d").to_string()
        }
    }
}

fn cell(mark: Mark, color: bool) -> String {
    let highlight = match mark.state {
        TrendState::Rally | TrendState::DownTrend => Some(RED),
        TrendState::UpTrend | TrendState::Reaction => Some(GREEN),
        _ => None,
    };
    match highlight {
        Some(code) if color && mark.pivot => format!("{code}{:7}{RESET}", mark.price),
        _ => format!("{:7}", mark.price),
    }
}

fn pivot_json(p: &Pivot, date: &str) -> Value {
    json!({
        "d": date,
        "x": p.price,
        "s": p.state.index(),
        "r": p.range,
        "v": p.obv,
        "p": p.confirmed,
    })
}
