//! Property tests for the circulation invariants.

use library_ledger::{CirculationError, CirculationManager, EntityKind, StoreConfig};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;

fn test_manager(dir: &TempDir) -> CirculationManager {
    CirculationManager::open(StoreConfig {
        path: dir.path().join("library.json"),
        pretty: false,
        ..Default::default()
    })
    .unwrap()
}

#[derive(Clone, Debug)]
enum Op {
    Checkout { book: usize, member: usize },
    Return { book: usize },
    SetActive { member: usize, active: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, 0..3usize).prop_map(|(book, member)| Op::Checkout { book, member }),
        (0..4usize).prop_map(|book| Op::Return { book }),
        (0..3usize, any::<bool>()).prop_map(|(member, active)| Op::SetActive { member, active }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn isbns_stay_unique(isbns in prop::collection::vec("[a-c]{1,2}", 1..20)) {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);
        let mut seen = HashSet::new();

        for isbn in &isbns {
            let result = manager.add_book(isbn, "Title", "Author");
            if seen.insert(isbn.clone()) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(
                    result,
                    Err(CirculationError::DuplicateIdentifier { kind: EntityKind::Book, .. })
                );
                prop_assert!(is_duplicate);
            }
            prop_assert_eq!(manager.list_books().unwrap().len(), seen.len());
        }

        let stored: HashSet<_> = manager
            .list_books()
            .unwrap()
            .into_iter()
            .map(|book| book.isbn)
            .collect();
        prop_assert_eq!(stored, seen);
    }

    #[test]
    fn emails_without_at_are_rejected(email in "[a-z0-9.]{1,16}") {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);

        let result = manager.register_member("U1", "Ana", &email);
        let is_invalid = matches!(result, Err(CirculationError::InvalidFormat(_)));
        prop_assert!(is_invalid);
        prop_assert!(manager.list_members().unwrap().is_empty());
        prop_assert!(!manager.store().path().exists());
    }

    #[test]
    fn availability_tracks_active_loans(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);

        let books = ["B0", "B1", "B2", "B3"];
        let members = ["M0", "M1", "M2"];
        for isbn in books {
            manager.add_book(isbn, "Title", "Author").unwrap();
        }
        for id in members {
            manager.register_member(id, "Name", "name@example.com").unwrap();
        }

        for op in ops {
            match op {
                Op::Checkout { book, member } => {
                    let _ = manager.checkout(books[book], members[member]);
                }
                Op::Return { book } => {
                    let _ = manager.return_book(books[book]);
                }
                Op::SetActive { member, active } => {
                    manager.set_member_active(members[member], active).unwrap();
                }
            }

            let mut active_per_book: HashMap<String, usize> = HashMap::new();
            for loan in manager.list_active_loans().unwrap() {
                *active_per_book.entry(loan.book_isbn).or_default() += 1;
            }

            for book in manager.list_books().unwrap() {
                let active = active_per_book.get(&book.isbn).copied().unwrap_or(0);
                prop_assert!(active <= 1);
                prop_assert_eq!(book.available, active == 0);
            }
        }
    }
}
