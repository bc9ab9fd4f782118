use crate::problem::{Verdict, Verdicts};

/// Fraction of tests in fully solved groups.
///
/// A group counts only if every test in it is accepted. Returns NaN when
/// there are no tests at all.
pub fn calculate_score(verdicts: &Verdicts) -> f64 {
    let mut total = 0usize;
    let mut solved = 0usize;

    for group in verdicts {
        total += group.len();
        if group.iter().all(Verdict::is_accept) {
            solved += group.len();
        }
    }

    solved as f64 / total as f64
}

/// The first non-accepted verdict in group/test order, or Accept
pub fn first_failure(verdicts: &Verdicts) -> Verdict {
    verdicts
        .iter()
        .flatten()
        .find(|verdict| !verdict.is_accept())
        .cloned()
        .unwrap_or_default()
}
