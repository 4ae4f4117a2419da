//! Demo board loaded by `SEED_FIXTURES=true`.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{NewTask, TaskCategory};
use crate::store::{EntityStore, StoreResult};

struct DemoTask {
    title: &'static str,
    description: &'static str,
    due: (i32, u32, u32),
    created: (i32, u32, u32),
    category: TaskCategory,
}

const TASKS: &[DemoTask] = &[
    DemoTask {
        title: "Design homepage",
        description: "Create wireframes and mockups for the homepage.",
        due: (2025, 7, 10),
        created: (2025, 6, 1),
        category: TaskCategory::Todo,
    },
    DemoTask {
        title: "Set up CI/CD pipeline",
        description: "Configure GitHub Actions for automated testing and deployment.",
        due: (2025, 10, 15),
        created: (2025, 6, 5),
        category: TaskCategory::InProgress,
    },
    DemoTask {
        title: "Implement authentication",
        description: "Add login and registration functionality using OAuth.",
        due: (2025, 11, 7),
        created: (2025, 9, 7),
        category: TaskCategory::Draft,
    },
    DemoTask {
        title: "Write unit tests",
        description: "Increase test coverage for the frontend components.",
        due: (2025, 10, 12),
        created: (2025, 8, 10),
        category: TaskCategory::Completed,
    },
    DemoTask {
        title: "Implement authentication",
        description: "Add login and registration functionality using OAuth.",
        due: (2025, 11, 1),
        created: (2025, 9, 27),
        category: TaskCategory::InProgress,
    },
    DemoTask {
        title: "Write unit tests",
        description: "Increase test coverage for the frontend components.",
        due: (2025, 12, 12),
        created: (2025, 9, 10),
        category: TaskCategory::Todo,
    },
];

// (name, color, indexes into TASKS)
const LABELS: &[(&str, &str, &[usize])] = &[
    ("Urgent", "#FF0000", &[0, 1]),
    ("Feature", "#00BFFF", &[3, 5, 2]),
    ("Bug", "#FFA500", &[4, 1]),
    ("Documentation", "#32CD32", &[0]),
];

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn timestamp(ymd: (i32, u32, u32)) -> DateTime<Utc> {
    date(ymd)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub tasks: usize,
    pub labels: usize,
}

/// Loads the demo board into an empty store. A store that already holds
/// tasks or labels is left untouched and `None` is returned.
pub async fn seed(store: &dyn EntityStore) -> StoreResult<Option<SeedReport>> {
    if !store.list_tasks().await?.is_empty() || !store.list_labels().await?.is_empty() {
        tracing::info!("store is not empty, skipping fixtures");
        return Ok(None);
    }

    let mut task_ids = Vec::with_capacity(TASKS.len());
    for demo in TASKS {
        let record = store
            .insert_task(&NewTask {
                title: demo.title.to_string(),
                description: demo.description.to_string(),
                due_date: date(demo.due),
                date_created: timestamp(demo.created),
                category: demo.category,
            })
            .await?;
        task_ids.push(record.id);
    }

    for (name, color, tasks) in LABELS {
        let label = store.insert_label(name, color).await?;
        for &index in *tasks {
            store.attach_labels(task_ids[index], &[label.id]).await?;
        }
    }

    let report = SeedReport {
        tasks: TASKS.len(),
        labels: LABELS.len(),
    };
    tracing::info!(tasks = report.tasks, labels = report.labels, "fixtures loaded");

    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeds_empty_store_once() {
        let store = MemoryStore::new();

        let report = seed(&store).await.unwrap();
        assert_eq!(report, Some(SeedReport { tasks: 6, labels: 4 }));
        assert_eq!(seed(&store).await.unwrap(), None);
        assert_eq!(store.list_tasks().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn seeded_associations_match_demo_board() {
        let store = MemoryStore::new();
        seed(&store).await.unwrap();

        let labels = store.list_labels().await.unwrap();
        let bug = labels.iter().find(|l| l.name == "Bug").unwrap();
        let mut task_ids: Vec<i32> = store
            .tasks_of_labels(&[bug.id])
            .await
            .unwrap()
            .into_iter()
            .map(|(_, t)| t.id)
            .collect();
        task_ids.sort();
        assert_eq!(task_ids, vec![2, 5]);

        let first = store.find_task(1).await.unwrap().unwrap();
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2025, 7, 10));
        assert_eq!(first.date_created.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }
}
