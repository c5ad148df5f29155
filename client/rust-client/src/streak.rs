//! Streaks, achievements and the yearly activity heatmap, all derived from
//! the local activity log.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::activity::ActivityEntry;

const STREAK_WEEK: u32 = 7;
const STREAK_MONTH: u32 = 30;
const COMPLETIONS_MILESTONE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Achievement {
    SevenDayStreak,
    ThirtyDayStreak,
    HundredCompleted,
    PerfectMonth,
}

impl Achievement {
    pub fn id(&self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7_DAY_STREAK",
            Achievement::ThirtyDayStreak => "30_DAY_STREAK",
            Achievement::HundredCompleted => "100_COMPLETED",
            Achievement::PerfectMonth => "PERFECT_MONTH",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7 Day Streak!",
            Achievement::ThirtyDayStreak => "30 Day Streak!",
            Achievement::HundredCompleted => "100 Puzzles Completed!",
            Achievement::PerfectMonth => "Perfect Month!",
        }
    }
}

/// How "perfect month" is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerfectMonthRule {
    /// Every day of the calendar month solved; only reachable on its last day.
    #[default]
    FullMonth,
    /// Every day of the month so far solved, today included.
    MonthToDate,
}

fn solved_dates(entries: &[ActivityEntry]) -> BTreeSet<NaiveDate> {
    entries
        .iter()
        .filter(|entry| entry.solved)
        .map(|entry| entry.date)
        .collect()
}

/// Consecutive solved days ending at `today`. An unsolved or missing `today`
/// gives 0.
pub fn calculate_streak(entries: &[ActivityEntry], today: NaiveDate) -> u32 {
    let solved = solved_dates(entries);
    let mut streak = 0;
    let mut current = Some(today);

    while let Some(day) = current.filter(|day| solved.contains(day)) {
        streak += 1;
        current = day.pred_opt();
    }
    streak
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

pub fn evaluate_achievements(
    entries: &[ActivityEntry],
    today: NaiveDate,
    rule: PerfectMonthRule,
) -> BTreeSet<Achievement> {
    let solved = solved_dates(entries);
    let streak = calculate_streak(entries, today);
    let mut unlocked = BTreeSet::new();

    if streak >= STREAK_WEEK {
        unlocked.insert(Achievement::SevenDayStreak);
    }
    if streak >= STREAK_MONTH {
        unlocked.insert(Achievement::ThirtyDayStreak);
    }
    if solved.len() >= COMPLETIONS_MILESTONE {
        unlocked.insert(Achievement::HundredCompleted);
    }

    let solved_this_month = solved
        .iter()
        .filter(|date| date.year() == today.year() && date.month() == today.month())
        .count() as u32;
    let required = match rule {
        PerfectMonthRule::FullMonth => days_in_month(today),
        PerfectMonthRule::MonthToDate => today.day(),
    };
    if solved_this_month == required {
        unlocked.insert(Achievement::PerfectMonth);
    }

    unlocked
}

/// Achievements in `current` that have not been announced yet.
pub fn newly_unlocked(
    current: &BTreeSet<Achievement>,
    seen: &BTreeSet<Achievement>,
) -> Vec<Achievement> {
    current.difference(seen).copied().collect()
}

/// Heatmap shade 0..=4 for one day.
pub fn activity_intensity(entry: Option<&ActivityEntry>) -> u8 {
    match entry {
        None => 0,
        Some(entry) if !entry.solved => 0,
        Some(entry) if entry.score >= 10 => match entry.time_taken {
            Some(secs) if secs < 15 => 4,
            Some(secs) if secs < 30 => 3,
            _ => 2,
        },
        Some(_) => 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub intensity: u8,
}

/// Every day of `year` as columns of seven, counted from January 1st.
pub fn year_heatmap(entries: &[ActivityEntry], year: i32) -> Vec<Vec<HeatmapCell>> {
    let by_date: HashMap<NaiveDate, &ActivityEntry> =
        entries.iter().map(|entry| (entry.date, entry)).collect();

    let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    let mut weeks: Vec<Vec<HeatmapCell>> = Vec::new();
    for (offset, date) in start
        .iter_days()
        .take_while(|date| date.year() == year)
        .enumerate()
    {
        if offset % 7 == 0 {
            weeks.push(Vec::with_capacity(7));
        }
        if let Some(week) = weeks.last_mut() {
            week.push(HeatmapCell {
                date,
                intensity: activity_intensity(by_date.get(&date).copied()),
            });
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn solved(date: NaiveDate) -> ActivityEntry {
        ActivityEntry::attempt(date, true, 10, Some(20))
    }

    fn run_ending(today: NaiveDate, days: u32) -> Vec<ActivityEntry> {
        (0..days)
            .map(|back| solved(today - chrono::Days::new(back as u64)))
            .collect()
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = date(2024, 3, 15);
        let mut entries = run_ending(today, 4);
        // a gap, then older activity that must not count
        entries.push(solved(date(2024, 3, 10)));
        assert_eq!(calculate_streak(&entries, today), 4);
    }

    #[test]
    fn unsolved_day_breaks_streak() {
        let today = date(2024, 3, 15);
        let mut entries = run_ending(today, 5);
        entries.retain(|entry| entry.date != date(2024, 3, 13));
        entries.push(ActivityEntry::attempt(date(2024, 3, 13), false, 0, None));
        assert_eq!(calculate_streak(&entries, today), 2);
    }

    #[test]
    fn no_activity_today_means_no_streak() {
        let entries = run_ending(date(2024, 3, 14), 10);
        assert_eq!(calculate_streak(&entries, date(2024, 3, 15)), 0);
        assert_eq!(calculate_streak(&[], date(2024, 3, 15)), 0);
    }

    #[test]
    fn streak_achievements_thresholds() {
        let today = date(2024, 3, 15);
        let six = evaluate_achievements(&run_ending(today, 6), today, PerfectMonthRule::FullMonth);
        assert!(!six.contains(&Achievement::SevenDayStreak));

        let seven =
            evaluate_achievements(&run_ending(today, 7), today, PerfectMonthRule::FullMonth);
        assert!(seven.contains(&Achievement::SevenDayStreak));
        assert!(!seven.contains(&Achievement::ThirtyDayStreak));

        let thirty =
            evaluate_achievements(&run_ending(today, 30), today, PerfectMonthRule::FullMonth);
        assert!(thirty.contains(&Achievement::ThirtyDayStreak));
    }

    #[test]
    fn hundred_completions_need_not_be_consecutive() {
        let entries: Vec<_> = (0..100)
            .map(|i| solved(date(2022, 1, 1) + chrono::Days::new(i * 2)))
            .collect();
        let unlocked =
            evaluate_achievements(&entries, date(2024, 3, 15), PerfectMonthRule::FullMonth);
        assert!(unlocked.contains(&Achievement::HundredCompleted));
        assert!(!unlocked.contains(&Achievement::SevenDayStreak));
    }

    #[test]
    fn full_month_rule_needs_the_whole_month() {
        let entries = run_ending(date(2024, 2, 29), 29);
        assert!(evaluate_achievements(&entries, date(2024, 2, 29), PerfectMonthRule::FullMonth)
            .contains(&Achievement::PerfectMonth));

        let partial = run_ending(date(2024, 2, 15), 15);
        assert!(
            !evaluate_achievements(&partial, date(2024, 2, 15), PerfectMonthRule::FullMonth)
                .contains(&Achievement::PerfectMonth)
        );
        assert!(
            evaluate_achievements(&partial, date(2024, 2, 15), PerfectMonthRule::MonthToDate)
                .contains(&Achievement::PerfectMonth)
        );
    }

    #[test]
    fn days_in_month_handles_leap_years_and_december() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
    }

    #[test]
    fn newly_unlocked_is_the_difference() {
        let seen: BTreeSet<_> = [Achievement::SevenDayStreak].into_iter().collect();
        let current: BTreeSet<_> = [Achievement::SevenDayStreak, Achievement::PerfectMonth]
            .into_iter()
            .collect();
        assert_eq!(newly_unlocked(&current, &seen), vec![Achievement::PerfectMonth]);
        assert!(newly_unlocked(&seen, &current).is_empty());
    }

    #[test]
    fn intensity_levels() {
        let day = date(2024, 3, 15);
        assert_eq!(activity_intensity(None), 0);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, false, 0, Some(5)))), 0);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, true, 10, Some(14)))), 4);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, true, 10, Some(29)))), 3);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, true, 10, Some(30)))), 2);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, true, 10, None))), 2);
        assert_eq!(activity_intensity(Some(&ActivityEntry::attempt(day, true, 5, Some(3)))), 1);
    }

    #[test]
    fn heatmap_covers_the_year_in_weeks() {
        let entries = vec![ActivityEntry::attempt(date(2024, 1, 9), true, 10, Some(10))];
        let weeks = year_heatmap(&entries, 2024);

        assert_eq!(weeks.iter().map(Vec::len).sum::<usize>(), 366);
        assert_eq!(weeks.len(), 53);
        assert_eq!(weeks[1][1], HeatmapCell { date: date(2024, 1, 9), intensity: 4 });
        assert_eq!(weeks[52].len(), 2);
        assert_eq!(year_heatmap(&[], 2023).iter().map(Vec::len).sum::<usize>(), 365);
    }

    #[test]
    fn achievement_ids_match_announcements() {
        assert_eq!(Achievement::SevenDayStreak.id(), "7_DAY_STREAK");
        assert_eq!(Achievement::PerfectMonth.title(), "Perfect Month!");
    }
}
