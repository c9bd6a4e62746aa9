use chrono::{Local, NaiveTime};
use planust::commands::*;
use planust::config::{Config, DateOrder};
use planust::error::CliError;
use planust::models::{RecurrenceType, Task, TaskStatus};
use planust::storage::Store;
use tempfile::TempDir;

fn with_test_db<F>(f: F)
where
    F: FnOnce(&Config),
{
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        db_path: dir.path().join("planust").join("tasks.json"),
        date_order: DateOrder::DayFirst,
    };
    f(&cfg);
}

fn load_tasks(cfg: &Config) -> Vec<Task> {
    Store::new(&cfg.db_path).load().unwrap().into_tasks()
}

fn add(cfg: &Config, title: &str) -> u64 {
    cmd_add(
        cfg,
        AddArgs {
            title: title.into(),
            ..Default::default()
        },
        true,
    )
    .unwrap()
}

#[test]
fn test_add_and_list() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Test Task".into(),
                project: Some("Project".into()),
                due: Some("2025-12-01".into()),
                energy: Some("high".into()),
                estimate: Some(45),
                ..Default::default()
            },
            true,
        )
        .unwrap();

        let tasks = load_tasks(cfg);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert_eq!(tasks[0].title, "Test Task");
        assert_eq!(tasks[0].project, Some("Project".into()));
        assert_eq!(tasks[0].due_date.unwrap().to_string(), "2025-12-01");
        assert_eq!(tasks[0].time_estimate, Some(45));
        assert_eq!(tasks[0].status, TaskStatus::Backlog);
        cmd_list(cfg, true, false).unwrap();
    });
}

#[test]
fn test_add_rejects_bad_input() {
    with_test_db(|cfg| {
        let bad_date = cmd_add(
            cfg,
            AddArgs {
                title: "x".into(),
                due: Some("someday".into()),
                ..Default::default()
            },
            true,
        );
        assert!(matches!(bad_date, Err(CliError::InvalidDate(_))));

        let bad_energy = cmd_add(
            cfg,
            AddArgs {
                title: "x".into(),
                energy: Some("extreme".into()),
                ..Default::default()
            },
            true,
        );
        assert!(matches!(bad_energy, Err(CliError::InvalidArgument(_))));
        assert!(load_tasks(cfg).is_empty());
    });
}

#[test]
fn test_add_with_shorthand_date() {
    with_test_db(|cfg| {
        cmd_add(
            cfg,
            AddArgs {
                title: "Soon".into(),
                due: Some("D+3".into()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        let today = Local::now().date_naive();
        let tasks = load_tasks(cfg);
        assert_eq!(tasks[0].due_date, today.checked_add_days(chrono::Days::new(3)));
    });
}

#[test]
fn test_quick_add() {
    with_test_db(|cfg| {
        cmd_quick_add(cfg, "water plants tomorrow", true).unwrap();
        let tasks = load_tasks(cfg);
        assert_eq!(tasks[0].title, "water plants");
        assert_eq!(tasks[0].due_date, Local::now().date_naive().succ_opt());
    });
}

#[test]
fn test_complete_task() {
    with_test_db(|cfg| {
        let id = add(cfg, "Task to complete");
        cmd_complete(cfg, id, true).unwrap();

        let tasks = load_tasks(cfg);
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert!(tasks[0].completed_at.is_some());

        assert!(matches!(cmd_complete(cfg, 99, true), Err(CliError::TaskNotFound(99))));
    });
}

#[test]
fn test_recurrence() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Recurring Task".into(),
                due: Some("T-3".into()),
                recur: Some("daily".into()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        cmd_complete(cfg, id, true).unwrap();

        let tasks = load_tasks(cfg);
        // Should have 2 tasks: one completed, one new
        assert_eq!(tasks.len(), 2);

        let completed = tasks.iter().find(|t| t.is_done()).unwrap();
        let new_task = tasks.iter().find(|t| !t.is_done()).unwrap();
        assert_eq!(new_task.title, "Recurring Task");
        assert_ne!(completed.id, new_task.id);
        assert_eq!(new_task.recurrence_parent_id, Some(id));
        assert_eq!(new_task.series_id, completed.series_id);
        assert!(new_task.due_date.unwrap() > Local::now().date_naive());
    });
}

#[test]
fn test_recur_pre_generates_series() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Standup".into(),
                start: Some("2030-01-07".into()),
                recur: Some("weekly".into()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        cmd_recur(cfg, id, Some(3), None, true).unwrap();
        assert_eq!(load_tasks(cfg).len(), 4);

        // Default count for weekly is 8; the three existing dates are skipped.
        cmd_recur(cfg, id, None, None, true).unwrap();
        let tasks = load_tasks(cfg);
        assert_eq!(tasks.len(), 9);
        assert!(tasks.iter().all(|t| t.recurrence_type == RecurrenceType::Weekly));

        cmd_recur(cfg, id, None, Some("2030-03-31"), true).unwrap();
        assert_eq!(load_tasks(cfg).len(), 12);

        let plain = add(cfg, "Plain");
        assert!(matches!(
            cmd_recur(cfg, plain, Some(2), None, true),
            Err(CliError::InvalidArgument(_))
        ));
    });
}

#[test]
fn test_remove_series() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Review".into(),
                start: Some("2030-01-07".into()),
                recur: Some("weekly".into()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        cmd_recur(cfg, id, Some(4), None, true).unwrap();
        let third = load_tasks(cfg)
            .into_iter()
            .find(|t| t.start_date.map(|d| d.to_string()) == Some("2030-01-21".into()))
            .unwrap()
            .id;

        cmd_remove(cfg, third, true, true).unwrap();
        assert_eq!(load_tasks(cfg).len(), 2);

        cmd_remove(cfg, id, false, true).unwrap();
        assert_eq!(load_tasks(cfg).len(), 1);
        assert!(matches!(cmd_remove(cfg, id, false, true), Err(CliError::TaskNotFound(_))));
    });
}

#[test]
fn test_edit_task() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Draft".into(),
                project: Some("Docs".into()),
                due: Some("2025-12-01".into()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        let dep = add(cfg, "Research");

        cmd_edit(
            cfg,
            id,
            EditArgs {
                title: Some("Final draft".into()),
                project: Some(String::new()),
                due: Some(String::new()),
                critical: Some(true),
                depends: Some(vec![dep, id]),
                ..Default::default()
            },
            true,
        )
        .unwrap();

        let tasks = load_tasks(cfg);
        let t = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(t.title, "Final draft");
        assert_eq!(t.project, None);
        assert_eq!(t.due_date, None);
        assert!(t.critical);
        assert_eq!(t.dependencies.iter().copied().collect::<Vec<_>>(), vec![dep]);
    });
}

#[test]
fn test_bulk_status() {
    with_test_db(|cfg| {
        let a = add(cfg, "A");
        let b = add(cfg, "B");
        cmd_status(cfg, &[a, b, 42], "in-progress", true).unwrap();
        assert!(load_tasks(cfg).iter().all(|t| t.status == TaskStatus::InProgress));

        assert!(matches!(
            cmd_status(cfg, &[a], "someday", true),
            Err(CliError::InvalidArgument(_))
        ));
    });
}

#[test]
fn test_schedule_resize_unschedule() {
    with_test_db(|cfg| {
        let id = cmd_add(
            cfg,
            AddArgs {
                title: "Deep work".into(),
                estimate: Some(45),
                ..Default::default()
            },
            true,
        )
        .unwrap();

        cmd_schedule(cfg, id, "9am", Some("2030-01-07"), true).unwrap();
        let t = &load_tasks(cfg)[0];
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.start_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(t.end_time, NaiveTime::from_hms_opt(9, 45, 0));
        assert_eq!(t.start_date.unwrap().to_string(), "2030-01-07");

        cmd_resize(cfg, id, -1, true).unwrap();
        assert_eq!(load_tasks(cfg)[0].time_estimate, Some(15));

        cmd_schedule(cfg, id, "@28", Some("2030-01-07"), true).unwrap();
        assert_eq!(load_tasks(cfg)[0].start_time, NaiveTime::from_hms_opt(14, 0, 0));

        cmd_unschedule(cfg, id, true).unwrap();
        let t = &load_tasks(cfg)[0];
        assert_eq!(t.start_time, None);
        assert_eq!(t.status, TaskStatus::Todo);

        assert!(matches!(
            cmd_schedule(cfg, id, "noonish", None, true),
            Err(CliError::InvalidTime(_))
        ));
        assert!(matches!(
            cmd_schedule(cfg, 77, "9", None, true),
            Err(CliError::TaskNotFound(77))
        ));
    });
}

#[test]
fn test_focus_and_dismiss() {
    with_test_db(|cfg| {
        let id = add(cfg, "Inbox zero");
        let today = Local::now().date_naive();

        cmd_focus(cfg, id, false, true).unwrap();
        assert_eq!(load_tasks(cfg)[0].my_day_date, Some(today));

        cmd_focus(cfg, id, true, true).unwrap();
        assert_eq!(load_tasks(cfg)[0].my_day_date, today.pred_opt());
    });
}

#[test]
fn test_reset_removes_database() {
    with_test_db(|cfg| {
        add(cfg, "Doomed");
        assert!(cfg.db_path.exists());
        cmd_reset(cfg, true).unwrap();
        assert!(!cfg.db_path.exists());
        assert!(load_tasks(cfg).is_empty());
        // Resetting twice is fine.
        cmd_reset(cfg, true).unwrap();
    });
}
