//! Transition rules.
//!
//! Each rule looks at the new bar from the state the engine was last in and
//! returns the upward and downward states the bar reached, if any. Rules
//! also move the meta levels (`MRally`, `MReaction`) that remember where
//! the previous swing turned. `threshold` is the factor times the average
//! true range of the previous bar; a reversal needs a move of twice that.

use swing_types::{Bar, TrendState};

use crate::record::{LastSeen, Levels};

use TrendState::{DownTrend, MRally, MReaction, Rally, Reaction, SRally, SReaction, UpTrend};

/// Upward and downward states reached by a bar.
pub type Transition = (Option<TrendState>, Option<TrendState>);

fn is_up(state: Option<TrendState>) -> bool {
    state.is_some_and(TrendState::is_up)
}

fn is_down(state: Option<TrendState>) -> bool {
    state.is_some_and(TrendState::is_down)
}

/// Applies the rule for `from`. Returns `None` for the meta states, which
/// the engine never records.
pub fn transition(from: TrendState, bar: &Bar, lp: &mut Levels, last: &LastSeen, threshold: i64) -> Option<Transition> {
    let rule: fn(&Bar, &mut Levels, &LastSeen, i64) -> Transition = match from {
        SRally => secondary_rally,
        Rally => rally,
        UpTrend => uptrend,
        DownTrend => downtrend,
        Reaction => reaction,
        SReaction => secondary_reaction,
        MRally | MReaction => return None,
    };
    Some(rule(bar, lp, last, threshold))
}

fn secondary_rally(bar: &Bar, lp: &mut Levels, last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if lp[UpTrend] < bar.high {
        up = Some(UpTrend);
    } else if lp[MRally] + f < bar.high {
        up = if is_up(last.prim_state) {
            Some(if bar.high > last.prim_price { UpTrend } else { SRally })
        } else {
            Some(UpTrend)
        };
    } else if lp[Rally] < bar.high && last.prim_state != Some(UpTrend) {
        up = Some(Rally);
    } else if lp[SRally] < bar.high {
        up = Some(SRally);
    }
    if is_up(up) && is_down(last.prim_state) {
        lp[MReaction] = last.prim_price;
    }
    if bar.low < lp[SRally] - 2 * f {
        if lp[Reaction] < bar.low {
            down = Some(SReaction);
        } else {
            down = if bar.low < lp[DownTrend] || bar.low < lp[MReaction] - f {
                Some(DownTrend)
            } else {
                Some(Reaction)
            };
            if is_up(last.prim_state) {
                lp[MRally] = last.prim_price;
            }
        }
    }
    (up, down)
}

fn rally(bar: &Bar, lp: &mut Levels, _last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if lp[UpTrend] < bar.high || lp[MRally] + f < bar.high {
        up = Some(UpTrend);
    } else if lp[Rally] < bar.high {
        up = Some(Rally);
    }
    if bar.low < lp[Rally] - 2 * f {
        down = if lp[Reaction] < bar.low {
            Some(SReaction)
        } else if bar.low < lp[DownTrend] || bar.low < lp[MReaction] - f {
            Some(DownTrend)
        } else {
            Some(Reaction)
        };
        if down != Some(SReaction) {
            lp[MRally] = lp[Rally];
        }
    }
    (up, down)
}

fn uptrend(bar: &Bar, lp: &mut Levels, _last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if lp[UpTrend] < bar.high {
        up = Some(UpTrend);
    }
    if bar.low <= lp[UpTrend] - 2 * f {
        down = if bar.low < lp[DownTrend] || bar.low < lp[MReaction] - f {
            Some(DownTrend)
        } else {
            Some(Reaction)
        };
        lp[MRally] = lp[UpTrend];
    }
    (up, down)
}

fn secondary_reaction(bar: &Bar, lp: &mut Levels, last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if bar.low < lp[DownTrend] {
        down = Some(DownTrend);
    } else if lp[MReaction] - f > bar.low {
        down = if is_down(last.prim_state) {
            Some(if bar.low < last.prim_price { DownTrend } else { SReaction })
        } else {
            Some(DownTrend)
        };
    } else if lp[Reaction] > bar.low && last.prim_state != Some(DownTrend) {
        down = Some(Reaction);
    } else if lp[SReaction] > bar.low {
        down = Some(SReaction);
    }
    if is_down(down) && is_up(last.prim_state) {
        lp[MRally] = last.prim_price;
    }
    if bar.high > lp[SReaction] + 2 * f {
        if lp[Rally] > bar.high {
            up = Some(SRally);
        } else {
            up = if bar.high > lp[UpTrend] || bar.high > lp[MRally] + f {
                Some(UpTrend)
            } else {
                Some(Rally)
            };
            if is_down(last.prim_state) {
                lp[MReaction] = last.prim_price;
            }
        }
    }
    (up, down)
}

fn downtrend(bar: &Bar, lp: &mut Levels, _last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if lp[DownTrend] > bar.low {
        down = Some(DownTrend);
    }
    if bar.high >= lp[DownTrend] + 2 * f {
        up = if bar.high > lp[UpTrend] || bar.high > lp[MRally] + f {
            Some(UpTrend)
        } else {
            Some(Rally)
        };
        lp[MReaction] = lp[DownTrend];
    }
    (up, down)
}

fn reaction(bar: &Bar, lp: &mut Levels, _last: &LastSeen, f: i64) -> Transition {
    let mut up = None;
    let mut down = None;
    if lp[DownTrend] > bar.low || lp[MReaction] - f > bar.low {
        down = Some(DownTrend);
    } else if lp[Reaction] > bar.low {
        down = Some(Reaction);
    }
    if bar.high > lp[Reaction] + 2 * f {
        up = if lp[Rally] > bar.high {
            Some(SRally)
        } else if bar.high > lp[UpTrend] || bar.high > lp[MRally] + f {
            Some(UpTrend)
        } else {
            Some(Rally)
        };
        if up != Some(SRally) {
            lp[MReaction] = lp[Reaction];
        }
    }
    (up, down)
}
