// ═══════════════════════════════════════════════════════════════════
// Store Tests — TransactionStore mutations, queries and persistence
// ═══════════════════════════════════════════════════════════════════

use chrono::{NaiveDate, NaiveDateTime};
use finance_tracker_core::errors::CoreError;
use finance_tracker_core::models::transaction::{Category, TransactionFilter, TransactionKind};
use finance_tracker_core::services::transaction_store::{LoadStatus, TransactionStore};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn data_path(dir: &TempDir) -> PathBuf {
    dir.path().join("Data").join("financial_data.json")
}

fn store_in(dir: &TempDir) -> TransactionStore {
    TransactionStore::open(data_path(dir))
}

fn expense(
    store: &mut TransactionStore,
    description: &str,
    amount: f64,
    at: NaiveDateTime,
) -> String {
    store
        .add(description, amount, TransactionKind::Expense, Category::Food, Some(at), None)
        .unwrap()
        .id
}

fn income(
    store: &mut TransactionStore,
    description: &str,
    amount: f64,
    at: NaiveDateTime,
) -> String {
    store
        .add(description, amount, TransactionKind::Income, Category::Salary, Some(at), None)
        .unwrap()
        .id
}

// ═══════════════════════════════════════════════════════════════════
// add
// ═══════════════════════════════════════════════════════════════════

mod add {
    use super::*;

    #[test]
    fn added_transaction_is_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let t = store
            .add(
                "Posto Shell",
                180.0,
                TransactionKind::Expense,
                Category::Transport,
                Some(dt(2025, 1, 10, 9, 0)),
                Some("tanque cheio".into()),
            )
            .unwrap();

        let listed = store.list(None, None);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, t.id);
        assert_eq!(listed[0].description, "Posto Shell");
        assert_eq!(listed[0].amount, 180.0);
        assert_eq!(listed[0].kind, TransactionKind::Expense);
        assert_eq!(listed[0].category, Category::Transport);
        assert_eq!(listed[0].notes.as_deref(), Some("tanque cheio"));
    }

    #[test]
    fn ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let at = dt(2025, 1, 10, 9, 0);

        let ids: HashSet<String> = (0..50)
            .map(|_| expense(&mut store, "Café", 5.0, at))
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn occurred_at_defaults_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let before = chrono::Local::now().naive_local() - chrono::Duration::seconds(1);

        let t = store
            .add("Pão", 8.0, TransactionKind::Expense, Category::Food, None, None)
            .unwrap();

        let after = chrono::Local::now().naive_local() + chrono::Duration::seconds(1);
        assert!(t.occurred_at >= before && t.occurred_at <= after);
    }

    #[test]
    fn blank_notes_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let t = store
            .add("Pão", 8.0, TransactionKind::Expense, Category::Food, None, Some("  ".into()))
            .unwrap();
        assert_eq!(t.notes, None);
    }

    #[test]
    fn rejects_empty_description() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let result = store.add("   ", 10.0, TransactionKind::Expense, Category::Food, None, None);
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result = store.add(
                "Uber",
                amount,
                TransactionKind::Expense,
                Category::Transport,
                None,
                None,
            );
            assert!(
                matches!(result, Err(CoreError::ValidationError(_))),
                "amount {amount} should be rejected"
            );
        }
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_category_kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let income_with_expense_category =
            store.add("Salário", 5000.0, TransactionKind::Income, Category::Food, None, None);
        assert!(matches!(income_with_expense_category, Err(CoreError::ValidationError(_))));

        let expense_with_income_category =
            store.add("Mercado", 200.0, TransactionKind::Expense, Category::Salary, None, None);
        assert!(matches!(expense_with_income_category, Err(CoreError::ValidationError(_))));

        assert!(store.is_empty());
        assert!(!data_path(&dir).exists());
    }

    #[test]
    fn creates_data_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(!data_path(&dir).exists());

        expense(&mut store, "Mercado", 50.0, dt(2025, 1, 1, 12, 0));

        assert!(data_path(&dir).is_file());
        assert!(!store.has_unsaved_changes());
    }
}

// ═══════════════════════════════════════════════════════════════════
// remove
// ═══════════════════════════════════════════════════════════════════

mod remove {
    use super::*;

    #[test]
    fn unknown_id_returns_false_and_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        expense(&mut store, "Mercado", 50.0, dt(2025, 1, 1, 12, 0));

        assert!(!store.remove("does-not-exist"));
        assert!(!store.remove("does-not-exist"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removes_exactly_one_among_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let at = dt(2025, 1, 1, 12, 0);
        let first = expense(&mut store, "Uber", 25.0, at);
        let second = expense(&mut store, "Uber", 25.0, at);
        let third = expense(&mut store, "Uber", 25.0, at);

        assert!(store.remove(&second));

        let remaining: Vec<&str> = store.transactions().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(remaining, vec![first.as_str(), third.as_str()]);
        assert!(!store.remove(&second));
    }

    #[test]
    fn removal_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let id = expense(&mut store, "Mercado", 50.0, dt(2025, 1, 1, 12, 0));
        expense(&mut store, "Feira", 30.0, dt(2025, 1, 2, 12, 0));

        assert!(store.remove(&id));

        let reopened = store_in(&dir);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.transactions()[0].description, "Feira");
    }
}

// ═══════════════════════════════════════════════════════════════════
// list / filter
// ═══════════════════════════════════════════════════════════════════

mod list {
    use super::*;

    #[test]
    fn newest_first_with_stable_ties() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let old = expense(&mut store, "old", 1.0, dt(2025, 1, 1, 8, 0));
        let tie_a = expense(&mut store, "tie a", 1.0, dt(2025, 1, 5, 8, 0));
        let new = expense(&mut store, "new", 1.0, dt(2025, 1, 9, 8, 0));
        let tie_b = expense(&mut store, "tie b", 1.0, dt(2025, 1, 5, 8, 0));

        let ids: Vec<&str> = store.list(None, None).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![new.as_str(), tie_a.as_str(), tie_b.as_str(), old.as_str()]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        expense(&mut store, "a", 1.0, dt(2025, 1, 1, 0, 0));
        expense(&mut store, "b", 1.0, dt(2025, 1, 15, 0, 0));
        expense(&mut store, "c", 1.0, dt(2025, 1, 31, 0, 0));

        let within = store.list(Some(dt(2025, 1, 1, 0, 0)), Some(dt(2025, 1, 15, 0, 0)));
        let names: Vec<&str> = within.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert_eq!(store.list(Some(dt(2025, 1, 16, 0, 0)), None).len(), 1);
        assert_eq!(store.list(None, Some(dt(2024, 12, 31, 0, 0))).len(), 0);
    }

    #[test]
    fn filter_by_kind_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let at = dt(2025, 1, 1, 0, 0);
        expense(&mut store, "Mercado", 100.0, at);
        income(&mut store, "Salário", 3000.0, at);
        store
            .add("Ônibus", 4.5, TransactionKind::Expense, Category::Transport, Some(at), None)
            .unwrap();

        let expenses =
            store.filter(&TransactionFilter::default().with_kind(TransactionKind::Expense));
        assert_eq!(expenses.len(), 2);

        let transport =
            store.filter(&TransactionFilter::default().with_category(Category::Transport));
        assert_eq!(transport.len(), 1);
        assert_eq!(transport[0].description, "Ônibus");
    }
}

// ═══════════════════════════════════════════════════════════════════
// balance / category_summary
// ═══════════════════════════════════════════════════════════════════

mod aggregates {
    use super::*;

    #[test]
    fn empty_store_balance_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let b = store.balance(None, None);
        assert_eq!((b.income_total, b.expense_total, b.net), (0.0, 0.0, 0.0));
    }

    #[test]
    fn empty_range_balance_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        income(&mut store, "Salário", 3000.0, dt(2025, 1, 5, 0, 0));

        let b = store.balance(Some(dt(2026, 1, 1, 0, 0)), None);
        assert_eq!((b.income_total, b.expense_total, b.net), (0.0, 0.0, 0.0));
    }

    #[test]
    fn net_is_income_minus_expense() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        income(&mut store, "Salário", 3000.0, dt(2025, 1, 5, 0, 0));
        income(&mut store, "Salário", 500.0, dt(2025, 2, 5, 0, 0));
        expense(&mut store, "Mercado", 400.0, dt(2025, 1, 10, 0, 0));
        expense(&mut store, "Mercado", 100.0, dt(2025, 2, 10, 0, 0));

        let all = store.balance(None, None);
        assert_eq!(all.income_total, 3500.0);
        assert_eq!(all.expense_total, 500.0);
        assert_eq!(all.net, 3000.0);

        let january = store.balance(Some(dt(2025, 1, 1, 0, 0)), Some(dt(2025, 1, 31, 23, 59)));
        assert_eq!(january.net, january.income_total - january.expense_total);
        assert_eq!(january.net, 2600.0);
    }

    #[test]
    fn category_summary_splits_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let at = dt(2025, 1, 1, 0, 0);
        income(&mut store, "Salário", 3000.0, at);
        store
            .add("Projeto", 800.0, TransactionKind::Income, Category::Freelance, Some(at), None)
            .unwrap();
        expense(&mut store, "Mercado", 100.0, at);
        expense(&mut store, "Feira", 50.0, at);
        store
            .add("Uber", 20.0, TransactionKind::Expense, Category::Transport, Some(at), None)
            .unwrap();

        let summary = store.category_summary(None, None);
        assert_eq!(summary.income.get(&Category::Salary), Some(&3000.0));
        assert_eq!(summary.income.get(&Category::Freelance), Some(&800.0));
        assert_eq!(summary.expense.get(&Category::Food), Some(&150.0));
        assert_eq!(summary.expense.get(&Category::Transport), Some(&20.0));
        assert_eq!(summary.income.len(), 2);
        assert_eq!(summary.expense.len(), 2);
    }
}

// ═══════════════════════════════════════════════════════════════════
// persist / reload
// ═══════════════════════════════════════════════════════════════════

mod persistence {
    use super::*;

    #[test]
    fn persist_then_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        income(&mut store, "Salário", 3000.0, dt(2025, 1, 5, 9, 0));
        store
            .add(
                "Farmácia",
                45.9,
                TransactionKind::Expense,
                Category::Health,
                Some(dt(2025, 1, 6, 18, 30)),
                Some("remédio".into()),
            )
            .unwrap();
        store.persist().unwrap();

        let before = store.transactions().to_vec();
        assert_eq!(store.reload(), LoadStatus::Loaded(2));
        assert_eq!(store.transactions(), before.as_slice());

        let reopened = store_in(&dir);
        assert_eq!(reopened.transactions(), before.as_slice());
    }

    #[test]
    fn file_has_expected_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        expense(&mut store, "Mercado", 50.0, dt(2025, 1, 1, 12, 0));

        let raw = std::fs::read_to_string(data_path(&dir)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(doc["transactions"].is_array());
        assert!(doc["saved_at"].is_string());
        assert_eq!(doc["schema_version"], "2.0.0");
        assert_eq!(doc["total_transactions"], 1);
        assert_eq!(doc["transactions"][0]["transaction_type"], "despesa");
        assert_eq!(doc["transactions"][0]["category"], "Alimentação");
        assert_eq!(doc["transactions"][0]["date"], "2025-01-01T12:00:00");
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(store.is_empty());
        assert_eq!(store.reload(), LoadStatus::Missing);
    }

    #[test]
    fn corrupt_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = data_path(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = TransactionStore::open(&path);
        assert!(store.is_empty());
        assert!(matches!(store.reload(), LoadStatus::Corrupt(_)));
    }

    #[test]
    fn file_with_invalid_record_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = data_path(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"transactions":[{"id":"1","description":"x","amount":1,
                "transaction_type":"despesa","category":"Nope","date":"2025-01-01T00:00:00"}]}"#,
        )
        .unwrap();

        let mut store = TransactionStore::new(&path);
        assert!(matches!(store.reload(), LoadStatus::Corrupt(_)));
        assert!(store.is_empty());
    }

    fn plant(dir: &TempDir, records: &str) -> PathBuf {
        let path = data_path(dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!(r#"{{"transactions": [{records}]}}"#)).unwrap();
        path
    }

    fn assert_rejected(path: &std::path::Path) {
        let mut store = TransactionStore::new(path);
        assert!(matches!(store.reload(), LoadStatus::Corrupt(_)));
        assert!(store.is_empty());
        let b = store.balance(None, None);
        assert_eq!((b.income_total, b.expense_total, b.net), (0.0, 0.0, 0.0));
    }

    #[test]
    fn negative_amount_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"Mercado","amount":-50,
                "transaction_type":"despesa","category":"Alimentação",
                "date":"2025-01-01T00:00:00"}"#,
        );
        assert_rejected(&path);
    }

    #[test]
    fn zero_amount_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"Pix","amount":0,
                "transaction_type":"receita","category":"Vendas","date":"2025-01-01T00:00:00"}"#,
        );
        assert_rejected(&path);
    }

    #[test]
    fn mismatched_category_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"Mercado","amount":50,
                "transaction_type":"despesa","category":"Salário","date":"2025-01-01T00:00:00"}"#,
        );
        assert_rejected(&path);
    }

    #[test]
    fn blank_description_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"  ","amount":50,
                "transaction_type":"despesa","category":"Alimentação",
                "date":"2025-01-01T00:00:00"}"#,
        );
        assert_rejected(&path);
    }

    #[test]
    fn duplicate_ids_on_disk_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"Mercado","amount":50,
                "transaction_type":"despesa","category":"Alimentação",
                "date":"2025-01-01T00:00:00"},
               {"id":"a","description":"Feira","amount":20,
                "transaction_type":"despesa","category":"Alimentação",
                "date":"2025-01-02T00:00:00"}"#,
        );
        assert_rejected(&path);
    }

    #[test]
    fn valid_records_on_disk_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(
            &dir,
            r#"{"id":"a","description":"Mercado","amount":50,
                "transaction_type":"despesa","category":"Alimentação",
                "date":"2025-01-01T00:00:00"},
               {"id":"b","description":"Salário","amount":3000,
                "transaction_type":"receita","category":"Salário","date":"2025-01-02T00:00:00"}"#,
        );
        let mut store = TransactionStore::new(&path);
        assert_eq!(store.reload(), LoadStatus::Loaded(2));
        assert_eq!(store.balance(None, None).net, 2950.0);
    }

    #[test]
    fn legacy_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = data_path(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
              "transactions": [
                {"id": "6f1c", "description": "Uber", "amount": 25.0,
                 "transaction_type": "despesa", "category": "Transporte",
                 "date": "2024-06-01T08:00:00.250000", "notes": null}
              ],
              "saved_at": "2024-06-01T08:00:01",
              "version": "1.0.0"
            }"#,
        )
        .unwrap();

        let store = TransactionStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("6f1c").unwrap().category, Category::Transport);
    }

    #[test]
    fn failed_write_keeps_memory_state_and_flags_it() {
        let dir = tempfile::tempdir().unwrap();
        // Parent of the data file is a regular file, so the directory cannot be created.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let mut store = TransactionStore::new(blocker.join("financial_data.json"));

        let t = store
            .add("Mercado", 50.0, TransactionKind::Expense, Category::Food, None, None)
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&t.id).unwrap().description, "Mercado");
        assert!(store.has_unsaved_changes());
        assert!(matches!(store.persist(), Err(CoreError::Persistence(_))));
    }

    #[test]
    fn relocate_writes_to_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        expense(&mut store, "Mercado", 50.0, dt(2025, 1, 1, 12, 0));

        let new_path = dir.path().join("elsewhere").join("money.json");
        store.relocate(&new_path).unwrap();

        assert_eq!(store.path(), new_path.as_path());
        assert_eq!(TransactionStore::open(&new_path).len(), 1);
        assert!(data_path(&dir).exists());
    }
}
