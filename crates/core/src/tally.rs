//! Poll vote tallying.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

/// Vote count and share of a single option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option_id: String,
    pub count: u64,
    /// Rounded half-up to the nearest integer.
    pub percentage: u32,
}

/// Presentation-ready result of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollTally {
    /// One entry per option, in option order.
    pub per_option: Vec<OptionTally>,
    pub total_votes: u64,
    /// Options sharing the highest count; empty when nobody voted.
    pub winner_option_ids: BTreeSet<String>,
    pub is_tie: bool,
}

impl PollTally {
    /// Tally entry for one option.
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&OptionTally> {
        self.per_option.iter().find(|o| o.option_id == option_id)
    }
}

/// Count votes per option and pick the winners.
///
/// `vote_option_ids` holds the option ID of every vote row. Votes naming an
/// option that is not in `option_ids` are ignored and do not count towards
/// the total. A repeated option ID is reported once, at its first position.
/// Percentages are not adjusted to sum to 100.
pub fn tally<O, OS, V, VS>(option_ids: O, vote_option_ids: V) -> PollTally
where
    O: IntoIterator<Item = OS>,
    OS: AsRef<str>,
    V: IntoIterator<Item = VS>,
    VS: AsRef<str>,
{
    let mut seen = HashSet::new();
    let options: Vec<String> = option_ids
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let mut counts: HashMap<&str, u64> = options.iter().map(|id| (id.as_str(), 0)).collect();
    let mut total_votes = 0u64;
    for vote in vote_option_ids {
        if let Some(count) = counts.get_mut(vote.as_ref()) {
            *count += 1;
            total_votes += 1;
        }
    }

    let per_option: Vec<OptionTally> = options
        .iter()
        .map(|id| {
            let count = counts.get(id.as_str()).copied().unwrap_or(0);
            OptionTally {
                option_id: id.clone(),
                count,
                percentage: percentage(count, total_votes),
            }
        })
        .collect();

    let winner_option_ids: BTreeSet<String> = if total_votes == 0 {
        BTreeSet::new()
    } else {
        let max = per_option.iter().map(|o| o.count).max().unwrap_or(0);
        per_option
            .iter()
            .filter(|o| o.count == max)
            .map(|o| o.option_id.clone())
            .collect()
    };
    let is_tie = winner_option_ids.len() > 1;

    PollTally {
        per_option,
        total_votes,
        winner_option_ids,
        is_tie,
    }
}

/// `round(count / total * 100)` with halves rounded up, 0 when `total` is 0.
fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 100 + total / 2) / total) as u32
}
