/*!
Pure list rules: time-adjusted urgency, urgency colors and list ordering.
!*/
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, ListKind, Task};
use crate::error::{Error, Result};

pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Highest base urgency first, then by title.
    Priority,
    /// By title or text.
    Alpha,
    /// Most recently created first.
    #[serde(alias = "latest")]
    #[value(alias = "latest")]
    Added,
}

impl SortMode {
    /// Next mode supported by `kind`, for cycling through them in the UI.
    pub fn next(self, kind: ListKind) -> SortMode {
        let next = match self {
            Self::Priority => Self::Alpha,
            Self::Alpha => Self::Added,
            Self::Added => Self::Priority,
        };
        if supports(kind, next) {
            next
        } else {
            next.next(kind)
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Priority => f.write_str("priority"),
            Self::Alpha => f.write_str("alpha"),
            Self::Added => f.write_str("added"),
        }
    }
}

pub fn supports(kind: ListKind, mode: SortMode) -> bool {
    !(kind == ListKind::Todos && mode == SortMode::Priority)
}

pub fn check_sort(kind: ListKind, mode: SortMode) -> Result<()> {
    if supports(kind, mode) {
        Ok(())
    } else {
        Err(Error::UnsupportedSort { kind, mode })
    }
}

pub fn check_urgency(urgency: u8) -> Result<u8> {
    if (MIN_URGENCY..=MAX_URGENCY).contains(&urgency) {
        Ok(urgency)
    } else {
        Err(Error::InvalidUrgency(urgency))
    }
}

/// Base urgency raised towards 5 as `now` moves from `created` to the due
/// date. Progress is not clamped, so before `created` the result can fall
/// below the base value.
pub fn effective_urgency(task: &Task, now: DateTime<Utc>) -> i32 {
    let base = i32::from(task.urgency);
    let Some(due) = task.due_date else {
        return base;
    };
    let total = (due - task.created).num_milliseconds();
    if total <= 0 {
        return base;
    }
    let remaining = (due - now).num_milliseconds();
    let progress = 1.0 - remaining as f64 / total as f64;
    let raise = (progress * f64::from(i32::from(MAX_URGENCY) - base)).floor() as i32;
    (base + raise).min(i32::from(MAX_URGENCY))
}

/// Effective urgency clamped to the 1..=5 range used for rendering.
pub fn display_urgency(task: &Task, now: DateTime<Utc>) -> u8 {
    effective_urgency(task, now).clamp(i32::from(MIN_URGENCY), i32::from(MAX_URGENCY)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Green at level 1, yellow at 3, red at 5.
pub fn color_for(level: f64) -> Rgb {
    let ratio = (level - 1.0) / 4.0;
    // `as u8` saturates, so levels below 1 keep red at 0.
    let r = (510.0 * ratio).min(255.0).round() as u8;
    let g = (510.0 * (1.0 - ratio)).min(255.0).round() as u8;
    Rgb { r, g, b: 0 }
}

/// Hue used by the urgency picker: 120 (green) at level 1 down to 0 (red).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: i32,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, 100%, 50%)", self.hue)
    }
}

pub fn picker_hue(level: u8) -> Hsl {
    Hsl {
        hue: 120 - (i32::from(level) - 1) * 30,
    }
}

thread_local! {
    static COLLATOR: Option<CollatorBorrowed<'static>> =
        Collator::try_new(Default::default(), CollatorOptions::default()).ok();
}

/// Root-locale collation: accents and case only break ties, lowercase
/// before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    })
}

pub fn compare<T: Entry>(a: &T, b: &T, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Priority => b
            .urgency()
            .cmp(&a.urgency())
            .then_with(|| locale_cmp(a.label(), b.label())),
        SortMode::Alpha => locale_cmp(a.label(), b.label()),
        SortMode::Added => b.created().cmp(&a.created()),
    }
}

/// Stable sort of a snapshot into a new list.
pub fn sorted<T: Entry>(items: &[T], mode: SortMode) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by(|a, b| compare(a, b, mode));
    out
}
