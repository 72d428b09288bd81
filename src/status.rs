use chrono::{DateTime, Utc};

/// Hours since an account's last tweet, or the marker that its timeline
/// could not be read at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elapsed {
    Hours(f64),
    Unknown,
}

impl Elapsed {
    pub fn since(last_post: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Elapsed::Hours((now - last_post).num_seconds() as f64 / 3600.0)
    }
}

/// Compose the status line for one account.
///
/// Four mutually exclusive outcomes, in precedence order: unreadable
/// timeline, overdue (elapsed past the threshold), confirmation of a
/// healthy account when `confirm` is set, or nothing to say (empty
/// string). Wording is first-person when the checked account is the
/// sender itself, third-person with an @-mention otherwise. Fractional
/// hours are floored only when rendered.
pub fn compose(account: &str, sender: &str, elapsed: Elapsed, hours: i64, confirm: bool) -> String {
    let first_person = account == sender;

    match elapsed {
        Elapsed::Unknown => {
            if first_person {
                "My timeline isn't showing up".to_string()
            } else {
                format!("@{}'s timeline isn't showing up", account)
            }
        }
        Elapsed::Hours(e) if e > hours as f64 => {
            if first_person {
                format!("It's been more than {} hours since my last tweet", e as i64)
            } else {
                format!("No tweets from @{} in more than {} hours", account, e as i64)
            }
        }
        Elapsed::Hours(e) if confirm => {
            if first_person {
                format!("It's been {} hours since my last tweet", e as i64)
            } else {
                format!("Last tweet from @{} was {} hours ago", account, e as i64)
            }
        }
        Elapsed::Hours(_) => String::new(),
    }
}

/// Join the non-empty per-account lines into one report, one alert per
/// line, preserving input order.
pub fn aggregate<I>(messages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    messages
        .into_iter()
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_elapsed_since() {
        let now = Utc::now();
        let elapsed = Elapsed::since(now - Duration::minutes(90), now);
        assert_eq!(elapsed, Elapsed::Hours(1.5));
    }

    #[test]
    fn test_overdue_third_person() {
        let msg = compose("bot1", "", Elapsed::Hours(30.0), 24, false);
        assert_eq!(msg, "No tweets from @bot1 in more than 30 hours");
    }

    #[test]
    fn test_overdue_floors_fractional_hours() {
        let msg = compose("bot1", "", Elapsed::Hours(30.9), 24, false);
        assert_eq!(msg, "No tweets from @bot1 in more than 30 hours");
    }

    #[test]
    fn test_overdue_first_person() {
        let msg = compose("bot1", "bot1", Elapsed::Hours(30.0), 24, false);
        assert_eq!(msg, "It's been more than 30 hours since my last tweet");
    }

    #[test]
    fn test_confirm_first_person() {
        let msg = compose("bot1", "bot1", Elapsed::Hours(5.0), 24, true);
        assert_eq!(msg, "It's been 5 hours since my last tweet");
    }

    #[test]
    fn test_confirm_third_person() {
        let msg = compose("bot1", "watcher", Elapsed::Hours(5.2), 24, true);
        assert_eq!(msg, "Last tweet from @bot1 was 5 hours ago");
    }

    #[test]
    fn test_healthy_without_confirm_is_empty() {
        assert_eq!(compose("bot1", "", Elapsed::Hours(5.0), 24, false), "");
    }

    #[test]
    fn test_elapsed_equal_to_threshold_is_not_overdue() {
        assert_eq!(compose("bot1", "", Elapsed::Hours(24.0), 24, false), "");
    }

    #[test]
    fn test_unknown_third_person() {
        let msg = compose("bot2", "", Elapsed::Unknown, 24, false);
        assert!(msg.contains("@bot2's timeline isn't showing up"));
    }

    #[test]
    fn test_unknown_first_person() {
        let msg = compose("bot2", "bot2", Elapsed::Unknown, 24, false);
        assert_eq!(msg, "My timeline isn't showing up");
    }

    #[test]
    fn test_unknown_wins_regardless_of_threshold() {
        assert_eq!(
            compose("bot2", "", Elapsed::Unknown, 0, true),
            compose("bot2", "", Elapsed::Unknown, 1000, false)
        );
    }

    #[test]
    fn test_zero_threshold_is_always_overdue() {
        let msg = compose("bot1", "", Elapsed::Hours(0.5), 0, false);
        assert_eq!(msg, "No tweets from @bot1 in more than 0 hours");
    }

    #[test]
    fn test_aggregate_preserves_order() {
        let report = aggregate(vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
        ]);
        assert_eq!(report, "first\nsecond\nthird");
        assert_eq!(report.lines().count(), 3);
    }

    #[test]
    fn test_aggregate_skips_empty_messages() {
        let report = aggregate(vec![
            String::new(),
            "only alert".to_string(),
            String::new(),
        ]);
        assert_eq!(report, "only alert");
    }

    #[test]
    fn test_aggregate_all_empty() {
        assert_eq!(aggregate(vec![String::new(), String::new()]), "");
    }
}
