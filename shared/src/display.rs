//! Presentation data derived from tasks. Nothing here is persisted.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::task::{Category, Priority, Status, Task};

/// Renders a point in time as `"MMM dd"`, e.g. `"Jan 05"`.
pub fn format_short_date<Tz>(point: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    point.format("%b %d").to_string()
}

/// Calendar-day distance from `now` to `point`, in `now`'s time zone.
pub fn calendar_days_between<Tz: TimeZone>(point: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let local = point.with_timezone(&now.timezone());
    local
        .date_naive()
        .signed_duration_since(now.date_naive())
        .num_days()
}

/// Human label for how far `point` is from today.
pub fn relative_label<Tz>(point: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match calendar_days_between(point, now) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        days if days > 1 => format!("In {days}d"),
        days if days < -1 => "Overdue".to_string(),
        _ => format_short_date(&point.with_timezone(&now.timezone())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInfo {
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDateInfo {
    pub formatted: String,
    pub relative: String,
    pub is_today: bool,
    /// Strictly before now and not done.
    pub is_past_due: bool,
    /// Calendar yesterday and not done.
    pub is_yesterday: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDisplayInfo {
    pub target_date: Option<TargetDateInfo>,
    pub created_at: DateInfo,
    pub updated_at: DateInfo,
}

pub fn date_display_info<Tz>(task: &Task, now: &DateTime<Tz>) -> DateDisplayInfo
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tz = now.timezone();
    let short = |point: &DateTime<Utc>| DateInfo {
        formatted: format_short_date(&point.with_timezone(&tz)),
    };

    let target_date = task.target_date.as_ref().map(|target| {
        let days = calendar_days_between(target, now);
        let open = !task.is_done();
        TargetDateInfo {
            formatted: format_short_date(&target.with_timezone(&tz)),
            relative: relative_label(target, now),
            is_today: days == 0,
            is_past_due: open && *target < now.with_timezone(&Utc),
            is_yesterday: open && days == -1,
        }
    });

    DateDisplayInfo {
        target_date,
        created_at: short(&task.created_at),
        updated_at: short(&task.updated_at),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDisplay {
    pub badge_color: &'static str,
    pub progress_color: &'static str,
    pub progress_background_color: &'static str,
}

pub fn category_display(category: Category) -> CategoryDisplay {
    let (badge_color, progress_color, progress_background_color) = match category {
        Category::Work => ("bg-blue-700", "bg-blue-500", "bg-blue-100"),
        Category::Personal => ("bg-purple-700", "bg-purple-500", "bg-purple-100"),
        Category::Study => ("bg-green-700", "bg-green-500", "bg-green-100"),
        Category::Health => ("bg-red-700", "bg-red-500", "bg-red-100"),
        Category::Finance => ("bg-emerald-700", "bg-emerald-500", "bg-emerald-100"),
        Category::Shopping => ("bg-orange-700", "bg-orange-500", "bg-orange-100"),
        Category::Projects => ("bg-indigo-700", "bg-indigo-500", "bg-indigo-100"),
        Category::Events => ("bg-pink-700", "bg-pink-500", "bg-pink-100"),
        Category::Goals => ("bg-teal-700", "bg-teal-500", "bg-teal-100"),
        Category::Others => ("bg-gray-700", "bg-gray-500", "bg-gray-100"),
    };
    CategoryDisplay {
        badge_color,
        progress_color,
        progress_background_color,
    }
}

/// Looks up a category by wire name; unknown names get the `Others` styling.
pub fn category_display_for_key(key: &str) -> CategoryDisplay {
    category_display(key.parse().unwrap_or(Category::Others))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityDisplay {
    pub label: &'static str,
    pub text_color: &'static str,
    pub badge_color: &'static str,
}

pub fn priority_display(priority: Priority) -> PriorityDisplay {
    match priority {
        Priority::High => PriorityDisplay {
            label: "High",
            text_color: "text-white",
            badge_color: "bg-red-600",
        },
        Priority::Medium => PriorityDisplay {
            label: "Medium",
            text_color: "text-black",
            badge_color: "bg-amber-400",
        },
        Priority::Low => PriorityDisplay {
            label: "Low",
            text_color: "text-white",
            badge_color: "bg-green-700",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Circle,
    PlayCircle,
    CheckCircle,
}

impl IconKind {
    pub fn glyph(self) -> &'static str {
        match self {
            IconKind::Circle => "○",
            IconKind::PlayCircle => "▶",
            IconKind::CheckCircle => "✓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub text_color: &'static str,
    pub badge_color: &'static str,
    pub icon: IconKind,
}

pub fn status_display(status: Status) -> StatusDisplay {
    match status {
        Status::Todo => StatusDisplay {
            label: "To Do",
            text_color: "text-gray-600",
            badge_color: "bg-gray-100",
            icon: IconKind::Circle,
        },
        Status::InProgress => StatusDisplay {
            label: "In Progress",
            text_color: "text-blue-600",
            badge_color: "bg-blue-100",
            icon: IconKind::PlayCircle,
        },
        Status::Done => StatusDisplay {
            label: "Done",
            text_color: "text-green-600",
            badge_color: "bg-green-100",
            icon: IconKind::CheckCircle,
        },
    }
}

/// Orders by status weight, then priority weight, both descending. Ties keep
/// their input order.
pub fn sort_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        b.status
            .weight()
            .cmp(&a.status.weight())
            .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
    });
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category: Category,
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded half up.
    pub completion_rate: u8,
}

/// Per-category completion, one entry per category in order of first
/// appearance.
pub fn category_stats(tasks: &[Task]) -> Vec<CategoryProgress> {
    let mut stats: Vec<CategoryProgress> = Vec::new();

    for task in tasks {
        let index = match stats.iter().position(|s| s.category == task.category) {
            Some(index) => index,
            None => {
                stats.push(CategoryProgress {
                    category: task.category,
                    completed: 0,
                    total: 0,
                    completion_rate: 0,
                });
                stats.len() - 1
            }
        };
        let entry = &mut stats[index];
        entry.total += 1;
        if task.is_done() {
            entry.completed += 1;
        }
    }

    for entry in &mut stats {
        entry.completion_rate = (entry.completed as f64 * 100.0 / entry.total as f64).round() as u8;
    }
    stats
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.done
    }
}

pub fn status_counts(tasks: &[Task]) -> StatusCounts {
    tasks
        .iter()
        .fold(StatusCounts::default(), |mut counts, task| {
            match task.status {
                Status::Todo => counts.todo += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Done => counts.done += 1,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap()
    }

    fn task(id: u32, status: Status, priority: Priority) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: String::new(),
            category: Category::Work,
            priority,
            status,
            target_date: None,
            created_at: day(1),
            updated_at: day(1),
        }
    }

    #[test]
    fn relative_labels_follow_calendar_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
        assert_eq!(relative_label(&day(10), &now), "Today");
        assert_eq!(relative_label(&day(11), &now), "Tomorrow");
        assert_eq!(relative_label(&day(9), &now), "Yesterday");
        assert_eq!(relative_label(&day(15), &now), "In 5d");
        assert_eq!(relative_label(&day(1), &now), "Overdue");
    }

    #[test]
    fn day_boundaries_are_calendar_not_elapsed() {
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 0).unwrap();
        let early_next = Utc.with_ymd_and_hms(2024, 6, 11, 0, 1, 0).unwrap();
        assert_eq!(relative_label(&early_next, &late), "Tomorrow");

        // Two minutes apart in UTC, same local day at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let evening = Utc
            .with_ymd_and_hms(2024, 6, 10, 21, 59, 0)
            .unwrap()
            .with_timezone(&plus_two);
        let point = Utc.with_ymd_and_hms(2024, 6, 10, 22, 1, 0).unwrap();
        assert_eq!(relative_label(&point, &evening), "Tomorrow");
    }

    #[test]
    fn short_date_pads_the_day() {
        let point = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        assert_eq!(format_short_date(&point), "Jan 05");
    }

    #[test]
    fn past_due_and_yesterday_ignore_done_tasks() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut open = task(1, Status::Todo, Priority::Low);
        open.target_date = Some(day(9));

        let info = date_display_info(&open, &now).target_date.unwrap();
        assert!(info.is_past_due);
        assert!(info.is_yesterday);
        assert!(!info.is_today);
        assert_eq!(info.relative, "Yesterday");
        assert_eq!(info.formatted, "Jun 09");

        let mut done = open.clone();
        done.status = Status::Done;
        let info = date_display_info(&done, &now).target_date.unwrap();
        assert!(!info.is_past_due);
        assert!(!info.is_yesterday);
    }

    #[test]
    fn today_target_is_past_due_only_once_passed() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut later = task(1, Status::Todo, Priority::Low);
        later.target_date = Some(Utc.with_ymd_and_hms(2024, 6, 10, 18, 0, 0).unwrap());
        let info = date_display_info(&later, &now).target_date.unwrap();
        assert!(info.is_today);
        assert!(!info.is_past_due);

        let mut earlier = later.clone();
        earlier.target_date = Some(Utc.with_ymd_and_hms(2024, 6, 10, 6, 0, 0).unwrap());
        assert!(date_display_info(&earlier, &now).target_date.unwrap().is_past_due);
    }

    #[test]
    fn no_target_date_means_no_target_info() {
        let now = day(10);
        let info = date_display_info(&task(1, Status::Todo, Priority::Low), &now);
        assert!(info.target_date.is_none());
        assert_eq!(info.created_at.formatted, "Jun 01");
    }

    #[test]
    fn unknown_category_key_falls_back_to_others() {
        assert_eq!(
            category_display_for_key("Hobbies"),
            category_display(Category::Others)
        );
        assert_eq!(category_display_for_key("Work").badge_color, "bg-blue-700");
    }

    #[test]
    fn lookups_cover_every_variant() {
        assert_eq!(priority_display(Priority::Medium).badge_color, "bg-amber-400");
        assert_eq!(status_display(Status::Done).icon, IconKind::CheckCircle);
        assert_eq!(status_display(Status::InProgress).label, "In Progress");
    }

    #[test]
    fn sorts_by_status_then_priority() {
        let tasks = vec![
            task(1, Status::Done, Priority::High),
            task(2, Status::Todo, Priority::Low),
            task(3, Status::InProgress, Priority::Medium),
        ];
        let ids: Vec<u32> = sort_tasks(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        // input untouched
        assert_eq!(tasks[0].id, 1);
    }

    #[test]
    fn sort_keeps_ties_in_input_order() {
        let tasks = vec![
            task(5, Status::Todo, Priority::High),
            task(2, Status::Todo, Priority::High),
            task(9, Status::Todo, Priority::High),
        ];
        let ids: Vec<u32> = sort_tasks(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn category_stats_in_first_appearance_order() {
        let mut tasks = vec![
            task(1, Status::Done, Priority::Low),
            task(2, Status::Todo, Priority::Low),
            task(3, Status::Done, Priority::Low),
            task(4, Status::Todo, Priority::Low),
        ];
        tasks[0].category = Category::Health;
        tasks[1].category = Category::Work;
        tasks[2].category = Category::Work;
        tasks[3].category = Category::Work;

        let stats = category_stats(&tasks);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, Category::Health);
        assert_eq!((stats[0].completed, stats[0].total, stats[0].completion_rate), (1, 1, 100));
        assert_eq!(stats[1].category, Category::Work);
        assert_eq!((stats[1].completed, stats[1].total, stats[1].completion_rate), (1, 3, 33));

        assert!(category_stats(&[]).is_empty());
    }

    #[test]
    fn completion_rate_rounds_half_up() {
        let tasks = vec![
            task(1, Status::Done, Priority::Low),
            task(2, Status::Done, Priority::Low),
            task(3, Status::Todo, Priority::Low),
        ];
        // 2/3 = 66.67
        assert_eq!(category_stats(&tasks)[0].completion_rate, 67);

        let half = vec![
            task(1, Status::Done, Priority::Low),
            task(2, Status::Todo, Priority::Low),
            task(3, Status::Todo, Priority::Low),
            task(4, Status::Todo, Priority::Low),
            task(5, Status::Todo, Priority::Low),
            task(6, Status::Todo, Priority::Low),
            task(7, Status::Todo, Priority::Low),
            task(8, Status::Todo, Priority::Low),
        ];
        // 1/8 = 12.5
        assert_eq!(category_stats(&half)[0].completion_rate, 13);
    }

    #[test]
    fn counts_statuses() {
        let tasks = vec![
            task(1, Status::Done, Priority::Low),
            task(2, Status::InProgress, Priority::Low),
            task(3, Status::InProgress, Priority::Low),
        ];
        let counts = status_counts(&tasks);
        assert_eq!(counts, StatusCounts { todo: 0, in_progress: 2, done: 1 });
        assert_eq!(counts.total(), 3);
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (
            any::<u32>(),
            prop::sample::select(Status::ALL.to_vec()),
            prop::sample::select(Priority::ALL.to_vec()),
        )
            .prop_map(|(id, status, priority)| task(id, status, priority))
    }

    proptest! {
        #[test]
        fn sort_is_idempotent(tasks in prop::collection::vec(arb_task(), 0..40)) {
            let once = sort_tasks(&tasks);
            prop_assert_eq!(sort_tasks(&once), once);
        }

        #[test]
        fn sort_is_a_permutation_in_weight_order(tasks in prop::collection::vec(arb_task(), 0..40)) {
            let sorted = sort_tasks(&tasks);
            prop_assert_eq!(sorted.len(), tasks.len());
            for pair in sorted.windows(2) {
                let key = |t: &Task| (t.status.weight(), t.priority.weight());
                prop_assert!(key(&pair[0]) >= key(&pair[1]));
            }
        }
    }
}
