use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use synapse_shared::store::{decode_slot, encode_slot};
use synapse_shared::{
    Category, Clock, MemoryStorage, Priority, Status, StorageError, StoreConfig, Task, TaskInput,
    TaskStorage, TaskStore, TaskUpdate,
};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Storage whose backend is gone, like local storage in a locked-down browser.
struct Unavailable;

impl TaskStorage for Unavailable {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("access denied".to_string()))
    }

    fn write(&mut self, key: &str, _contents: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_string(),
            reason: "access denied".to_string(),
        })
    }
}

/// Reads fail but writes go through, like a backend that comes back mid-session.
struct UnreadableSlot(MemoryStorage);

impl TaskStorage for UnreadableSlot {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("security error".to_string()))
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.0.write(key, contents)
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
}

fn seed_task(id: u32, title: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: "from seed".to_string(),
        category: Category::Personal,
        priority: Priority::Low,
        status: Status::Todo,
        target_date: None,
        created_at: noon(),
        updated_at: noon(),
    }
}

fn stored_entry(id: u32, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "category": "Study",
        "priority": "high",
        "status": "todo",
        "createdAt": "2024-06-01T08:00:00.000Z",
        "updatedAt": "2024-06-01T08:00:00.000Z"
    })
}

#[test]
fn reopening_restores_every_field() {
    let storage = MemoryStorage::new();
    let mut store = TaskStore::open_with_clock(storage.clone(), FixedClock(noon()), StoreConfig::default());
    let added = store
        .add(TaskInput {
            title: "Quarterly taxes".to_string(),
            description: "Collect receipts".to_string(),
            category: Category::Finance,
            priority: Priority::High,
            status: Status::InProgress,
            target_date: Some(Utc.with_ymd_and_hms(2024, 6, 30, 17, 45, 12).unwrap()),
        })
        .unwrap();

    let reopened = TaskStore::open_with_clock(storage, FixedClock(noon()), StoreConfig::default());
    assert_eq!(reopened.list(), &[added]);
}

#[test]
fn slot_round_trip_keeps_tasks_equal() {
    let mut task = seed_task(3, "Write tests");
    task.target_date = Some(Utc.with_ymd_and_hms(2024, 12, 24, 18, 30, 0).unwrap());
    let tasks = vec![seed_task(1, "Buy milk"), task];

    let (decoded, problems) = decode_slot(&encode_slot(&tasks).unwrap());
    assert!(problems.is_empty());
    assert_eq!(decoded, tasks);
}

#[test]
fn invalid_entries_are_dropped_individually() {
    let slot = json!([
        stored_entry(1, "Keep me"),
        stored_entry(2, "no"),
        { "id": 3, "title": "Missing everything" },
        stored_entry(4, "Keep me too"),
    ]);
    let storage = MemoryStorage::with_slot("tasks", slot.to_string());

    let store = TaskStore::open_with_clock(
        storage.clone(),
        FixedClock(noon()),
        StoreConfig::default().with_seed(vec![seed_task(9, "Seeded")]),
    );

    let ids: Vec<u32> = store.list().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 4]);

    // the slot now mirrors what survived
    let (persisted, problems) = decode_slot(&storage.slot("tasks").unwrap());
    assert!(problems.is_empty());
    assert_eq!(persisted, store.list());
}

#[test]
fn unusable_slots_fall_back_to_the_seed() {
    let seed = vec![seed_task(1, "Breakfast"), seed_task(2, "Work out")];
    for contents in ["", "[]", "not json at all", r#"{"tasks": []}"#, r#"[{"id": "x"}]"#] {
        let storage = MemoryStorage::with_slot("tasks", contents);
        let store = TaskStore::open_with_clock(
            storage,
            FixedClock(noon()),
            StoreConfig::default().with_seed(seed.clone()),
        );
        assert_eq!(store.list(), seed.as_slice(), "slot contents: {contents:?}");
    }
}

#[test]
fn absent_slot_with_no_seed_starts_empty() {
    let storage = MemoryStorage::new();
    let store = TaskStore::open_with_clock(storage.clone(), FixedClock(noon()), StoreConfig::default());
    assert!(store.list().is_empty());
    assert_eq!(storage.slot("tasks").as_deref(), Some("[]"));
}

#[test]
fn storage_key_is_configurable() {
    let storage = MemoryStorage::with_slot("dataTasks", json!([stored_entry(5, "Legacy")]).to_string());
    let mut store = TaskStore::open_with_clock(
        storage.clone(),
        FixedClock(noon()),
        StoreConfig::default().with_storage_key("dataTasks"),
    );
    assert_eq!(store.storage_key(), "dataTasks");
    assert_eq!(store.list().len(), 1);

    store.edit(5, TaskUpdate::status(Status::Done)).unwrap();
    assert!(storage.slot("dataTasks").unwrap().contains("\"done\""));
    assert!(storage.slot("tasks").is_none());
}

#[test]
fn unavailable_storage_still_serves_the_session() {
    let mut store = TaskStore::open_with_clock(
        Unavailable,
        FixedClock(noon()),
        StoreConfig::default().with_seed(vec![seed_task(1, "Seeded")]),
    );
    let added = store
        .add(TaskInput {
            title: "Still works".to_string(),
            description: String::new(),
            category: Category::Others,
            priority: Priority::Medium,
            status: Status::Todo,
            target_date: None,
        })
        .unwrap();

    assert_eq!(added.id, 2);
    assert!(store.remove(1));
    assert!(!store.remove(1));
    assert_eq!(store.list(), &[added]);
}

#[test]
fn persisted_dates_are_text() {
    let storage = MemoryStorage::new();
    let mut store = TaskStore::open_with_clock(storage.clone(), FixedClock(noon()), StoreConfig::default());
    store
        .add(TaskInput {
            title: "Check format".to_string(),
            description: String::new(),
            category: Category::Work,
            priority: Priority::Low,
            status: Status::Todo,
            target_date: None,
        })
        .unwrap();

    let slot: serde_json::Value = serde_json::from_str(&storage.slot("tasks").unwrap()).unwrap();
    assert_eq!(slot[0]["createdAt"], "2024-06-10T12:00:00Z");
    assert_eq!(slot[0]["updatedAt"], "2024-06-10T12:00:00Z");
    assert!(slot[0].get("targetDate").is_none());
}

#[test]
fn seed_tasks_are_checked_like_stored_ones() {
    let config: StoreConfig = serde_json::from_value(json!({
        "seed": [
            {
                "id": 1, "title": "x", "description": "", "category": "Work",
                "priority": "low", "status": "todo",
                "createdAt": "2024-06-02T00:00:00Z", "updatedAt": "2024-06-01T00:00:00Z"
            },
            {
                "id": 2, "title": "Water plants", "description": "", "category": "Personal",
                "priority": "low", "status": "todo",
                "createdAt": "2024-06-02T00:00:00Z", "updatedAt": "2024-06-01T00:00:00Z"
            },
            stored_entry(3, "Renew passport"),
            stored_entry(3, "Same id again"),
            stored_entry(4, "  Call the bank  "),
        ]
    }))
    .unwrap();

    let mut store = TaskStore::open_with_clock(MemoryStorage::new(), FixedClock(noon()), config);

    let kept: Vec<(u32, &str)> = store.list().iter().map(|t| (t.id, t.title.as_str())).collect();
    assert_eq!(kept, vec![(3, "Renew passport"), (4, "Call the bank")]);

    assert!(store.remove(3));
    assert!(!store.remove(3));
    assert_eq!(store.list().len(), 1);
}

#[test]
fn seed_built_in_code_drops_repeated_ids() {
    let config = StoreConfig::default().with_seed(vec![
        seed_task(1, "Breakfast"),
        seed_task(1, "Second breakfast"),
        seed_task(2, "ok"),
    ]);
    let store = TaskStore::open_with_clock(MemoryStorage::new(), FixedClock(noon()), config);

    assert_eq!(store.list(), &[seed_task(1, "Breakfast")]);
}

#[test]
fn unreadable_slot_is_not_overwritten_on_open() {
    let backing = MemoryStorage::with_slot("tasks", json!([stored_entry(8, "Real data")]).to_string());
    let before = backing.slot("tasks");

    let store = TaskStore::open_with_clock(
        UnreadableSlot(backing.clone()),
        FixedClock(noon()),
        StoreConfig::default().with_seed(vec![seed_task(1, "Seeded")]),
    );

    assert_eq!(store.list(), &[seed_task(1, "Seeded")]);
    assert_eq!(backing.slot("tasks"), before);
}
