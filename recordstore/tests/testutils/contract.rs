//! Handle contract checks
//!
//! Each check takes a handle already bound to an empty table.

#![allow(dead_code)]

use recordstore::{Database, DbError, Record, SearchQuery};

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

/// Insert `count` records with ids `r01..` and created `1..=count`
fn seed(db: &dyn Database, count: i64) {
    for n in 1..=count {
        let mut record = Record::new(format!("r{:02}", n)).with_field("n", n);
        record.created = n;
        db.create(&mut record).expect("seed record");
    }
}

pub fn create_then_read_returns_record(db: &dyn Database) {
    let mut record = Record::new("1")
        .with_field("title", "hello")
        .with_field("views", 3);
    db.create(&mut record).unwrap();

    assert!(record.created > 0);
    assert!(record.updated >= record.created);

    let stored = db.read("1").unwrap().expect("record should exist");
    assert_eq!(stored, record);
}

pub fn update_keeps_created_and_advances_updated(db: &dyn Database) {
    let mut record = Record::new("u1").with_field("body", "draft");
    db.create(&mut record).unwrap();
    let (created, updated) = (record.created, record.updated);

    let mut edited = record.clone().with_field("body", "final");
    db.update(&mut edited).unwrap();
    assert_eq!(edited.created, created);
    assert!(edited.updated >= updated);

    let stored = db.read("u1").unwrap().unwrap();
    assert_eq!(stored.created, created);
    assert_eq!(stored.field("body"), Some(&serde_json::json!("final")));
}

pub fn reserved_payload_fields_are_rejected(db: &dyn Database) {
    db.delete("shadow").unwrap();
    for key in ["id", "created", "updated"] {
        let mut record = Record::new("shadow").with_field(key, "yesterday");
        assert!(matches!(
            db.create(&mut record),
            Err(DbError::InvalidRecord(_))
        ));
    }
    assert_eq!(db.read("shadow").unwrap(), None);

    // Look-alike keys are ordinary payload
    let mut record = Record::new("shadow")
        .with_field("created_by", "alice")
        .with_field("Updated", true);
    db.create(&mut record).unwrap();
    assert_eq!(db.read("shadow").unwrap(), Some(record));
}

pub fn update_upserts_missing_record(db: &dyn Database) {
    let mut record = Record::new("fresh");
    db.update(&mut record).unwrap();
    assert!(record.created > 0);
    assert!(db.read("fresh").unwrap().is_some());
}

pub fn delete_removes_record(db: &dyn Database) {
    db.create(&mut Record::new("d1")).unwrap();
    db.delete("d1").unwrap();

    assert_eq!(db.read("d1").unwrap(), None);
    assert!(db.search(&SearchQuery::all()).unwrap().is_empty());

    // delete-if-present
    db.delete("d1").unwrap();
    db.delete("never-existed").unwrap();
}

pub fn search_orders_by_created(db: &dyn Database) {
    seed(db, 12);

    let ascending = db.search(&SearchQuery::all().limit(10)).unwrap();
    assert_eq!(ascending.len(), 10);
    assert_eq!(ids(&ascending).first().map(String::as_str), Some("r01"));
    assert!(ascending.windows(2).all(|w| w[0].created <= w[1].created));

    let all_ascending = db.search(&SearchQuery::all().limit(100)).unwrap();
    let all_descending = db.search(&SearchQuery::all().limit(100).reversed()).unwrap();
    let mut reversed = ids(&all_descending);
    reversed.reverse();
    assert_eq!(reversed, ids(&all_ascending));
    assert_eq!(all_descending[0].id, "r12");
}

pub fn search_paging_is_normalized(db: &dyn Database) {
    seed(db, 15);

    let defaulted = db.search(&SearchQuery::all().limit(0)).unwrap();
    assert_eq!(defaulted.len(), 10);

    let clamped = db.search(&SearchQuery::all().offset(-5)).unwrap();
    let origin = db.search(&SearchQuery::all().offset(0)).unwrap();
    assert_eq!(ids(&clamped), ids(&origin));

    let second_page = db.search(&SearchQuery::all().limit(10).offset(10)).unwrap();
    assert_eq!(
        ids(&second_page),
        vec!["r11", "r12", "r13", "r14", "r15"]
    );

    let past_end = db.search(&SearchQuery::all().offset(100)).unwrap();
    assert!(past_end.is_empty());
}

pub fn search_terms_are_conjunctive(db: &dyn Database) {
    let rows = [
        ("p1", "alice", "rust"),
        ("p2", "alice", "go"),
        ("p3", "bob", "rust"),
    ];
    for (n, (id, author, lang)) in rows.iter().enumerate() {
        let mut record = Record::new(*id)
            .with_field("author", *author)
            .with_field("lang", *lang);
        record.created = n as i64 + 1;
        db.create(&mut record).unwrap();
    }

    let alice = db
        .search(&SearchQuery::all().term("author", "alice"))
        .unwrap();
    assert_eq!(ids(&alice), vec!["p1", "p2"]);

    let alice_rust = db
        .search(&SearchQuery::all().term("author", "alice").term("lang", "rust"))
        .unwrap();
    assert_eq!(ids(&alice_rust), vec!["p1"]);

    let nobody = db
        .search(&SearchQuery::all().term("author", "carol"))
        .unwrap();
    assert!(nobody.is_empty());

    let rust_newest_first = db
        .search(&SearchQuery::all().term("lang", "rust").reversed())
        .unwrap();
    assert_eq!(ids(&rust_newest_first), vec!["p3", "p1"]);
}

/// Fresh handle: `Init` twice, one create, match-all search
pub fn blog_scenario(db: &dyn Database, database: &recordstore::DatabaseInfo) {
    db.init(database).unwrap();
    db.init(database).unwrap();

    db.create(&mut Record::new("1").with_field("payload", "hello"))
        .unwrap();

    let found = db.search(&SearchQuery::all().limit(10)).unwrap();
    assert_eq!(ids(&found), vec!["1"]);
    assert_eq!(found[0].field("payload"), Some(&serde_json::json!("hello")));
}

pub fn closed_handle_rejects_calls(db: &dyn Database) {
    db.close().unwrap();
    db.close().unwrap();

    assert!(matches!(db.read("1"), Err(DbError::NotAvailable(_))));
    assert!(matches!(
        db.create(&mut Record::new("1")),
        Err(DbError::NotAvailable(_))
    ));
    assert!(matches!(
        db.search(&SearchQuery::all()),
        Err(DbError::NotAvailable(_))
    ));
}
