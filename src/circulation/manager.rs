//! Circulation manager implementation.

use super::loan_id::LoanIdGenerator;
use crate::error::{
    CirculationError, CirculationResult, EntityKind, Result, StateViolation, StoreError,
};
use crate::models::{Book, Loan, Member};
use crate::store::{Store, StoreConfig};
use crate::types::{patch, Clock, SystemClock, BOOKS, LOANS, MEMBERS};
use chrono::{NaiveDateTime, SubsecRound};
use serde_json::Value;

/// Attempts at finding an unused loan id before giving up.
const LOAN_ID_ATTEMPTS: usize = 16;

/// Enforces catalog, membership and loan rules over a [`Store`].
pub struct CirculationManager {
    store: Store,
    clock: Box<dyn Clock>,
    loan_ids: LoanIdGenerator,
}

impl CirculationManager {
    /// Manage an already opened store.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            loan_ids: LoanIdGenerator::new(),
        }
    }

    /// Open the store described by `config` and manage it.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self::new(Store::open(config)?))
    }

    /// Replace the clock used for loan and return dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    // --- Catalog ---

    /// Add a new, available book to the catalog.
    pub fn add_book(&self, isbn: &str, title: &str, author: &str) -> CirculationResult<Book> {
        require("isbn", isbn)?;
        require("title", title)?;
        require("author", author)?;

        if self.store.contains_key::<Book>(isbn) {
            return Err(rejected(CirculationError::DuplicateIdentifier {
                kind: EntityKind::Book,
                id: isbn.to_string(),
            }));
        }

        let book = Book::new(isbn, title, author);
        self.store.insert_model(&book)?;

        tracing::info!(isbn, "book added");
        Ok(book)
    }

    /// Every book, in catalog order.
    pub fn list_books(&self) -> CirculationResult<Vec<Book>> {
        Ok(self.store.all_models()?)
    }

    pub fn find_book_by_isbn(&self, isbn: &str) -> CirculationResult<Option<Book>> {
        Ok(self.store.find_by_key(isbn)?)
    }

    // --- Membership ---

    /// Register a new, active member.
    pub fn register_member(
        &self,
        member_id: &str,
        name: &str,
        email: &str,
    ) -> CirculationResult<Member> {
        require("memberId", member_id)?;
        require("name", name)?;
        require("email", email)?;

        if !email.contains('@') {
            return Err(rejected(CirculationError::InvalidFormat(email.to_string())));
        }

        if self.store.contains_key::<Member>(member_id) {
            return Err(rejected(CirculationError::DuplicateIdentifier {
                kind: EntityKind::Member,
                id: member_id.to_string(),
            }));
        }

        let member = Member::new(member_id, name, email);
        self.store.insert_model(&member)?;

        tracing::info!(member_id, "member registered");
        Ok(member)
    }

    /// Every member, in registration order.
    pub fn list_members(&self) -> CirculationResult<Vec<Member>> {
        Ok(self.store.all_models()?)
    }

    pub fn find_member_by_id(&self, member_id: &str) -> CirculationResult<Option<Member>> {
        Ok(self.store.find_by_key(member_id)?)
    }

    /// Activate or deactivate a member. Inactive members cannot borrow.
    pub fn set_member_active(&self, member_id: &str, active: bool) -> CirculationResult<Member> {
        let mut member = self
            .find_member_by_id(member_id)?
            .ok_or_else(|| not_found(EntityKind::Member, member_id))?;

        self.store.update(
            MEMBERS,
            Member::MEMBER_ID,
            &Value::from(member_id),
            patch(Member::ACTIVE, active),
        )?;
        member.active = active;

        tracing::info!(member_id, active, "member status changed");
        Ok(member)
    }

    // --- Loans ---

    /// Lend an available book to an active member.
    ///
    /// Checks run in order: book exists, book available, member exists,
    /// member active. The first failing check is reported.
    pub fn checkout(&self, isbn: &str, member_id: &str) -> CirculationResult<Loan> {
        let book = self
            .find_book_by_isbn(isbn)?
            .ok_or_else(|| not_found(EntityKind::Book, isbn))?;
        if !book.available {
            let violation = StateViolation::BookNotAvailable(isbn.to_string());
            return Err(rejected(violation.into()));
        }

        let member = self
            .find_member_by_id(member_id)?
            .ok_or_else(|| not_found(EntityKind::Member, member_id))?;
        if !member.active {
            let violation = StateViolation::MemberInactive(member_id.to_string());
            return Err(rejected(violation.into()));
        }

        let now = self.now();
        let loan_id = self.allocate_loan_id(now, isbn, member_id)?;
        let loan = Loan::open(loan_id, isbn, member_id, now);

        self.store.update(
            BOOKS,
            Book::ISBN,
            &Value::from(isbn),
            patch(Book::AVAILABLE, false),
        )?;

        if let Err(e) = self.store.insert_model(&loan) {
            self.restore_availability(isbn);
            return Err(e.into());
        }

        tracing::info!(isbn, member_id, loan_id = %loan.loan_id, "book checked out");
        Ok(loan)
    }

    /// Close the book's active loan and make the book available again.
    ///
    /// Returns the closed loan. The loan is matched on its id, book and
    /// missing return date together, since files from older versions may
    /// reuse loan ids.
    pub fn return_book(&self, isbn: &str) -> CirculationResult<Loan> {
        let no_active_loan = || rejected(StateViolation::NoActiveLoan(isbn.to_string()).into());
        let mut loan = self
            .loan_history(isbn)?
            .into_iter()
            .find(Loan::is_active)
            .ok_or_else(no_active_loan)?;

        let now = self.now();
        let return_date = serde_json::to_value(now).map_err(StoreError::from)?;
        let closed = self.store.update_where(
            LOANS,
            &[
                (Loan::LOAN_ID, &Value::from(loan.loan_id.as_str())),
                (Loan::BOOK_ISBN, &Value::from(isbn)),
                (Loan::RETURN_DATE, &Value::Null),
            ],
            patch(Loan::RETURN_DATE, return_date),
        )?;
        if !closed {
            return Err(no_active_loan());
        }
        loan.return_date = Some(now);

        let restored = self
            .store
            .update(BOOKS, Book::ISBN, &Value::from(isbn), patch(Book::AVAILABLE, true))
            .inspect_err(|e| {
                tracing::error!(
                    isbn,
                    loan_id = %loan.loan_id,
                    error = %e,
                    "loan closed but book availability not restored"
                );
            })?;
        if !restored {
            tracing::warn!(
                isbn,
                loan_id = %loan.loan_id,
                "returned loan references an unknown book"
            );
        }

        tracing::info!(isbn, loan_id = %loan.loan_id, "book returned");
        Ok(loan)
    }

    /// Every loan without a return date, in store order.
    pub fn list_active_loans(&self) -> CirculationResult<Vec<Loan>> {
        Ok(self.store.find_models(Loan::RETURN_DATE, Value::Null)?)
    }

    /// Every loan of a book, active or closed, in store order.
    pub fn loan_history(&self, isbn: &str) -> CirculationResult<Vec<Loan>> {
        Ok(self.store.find_models(Loan::BOOK_ISBN, isbn)?)
    }

    /// Active loans held by a member.
    pub fn active_loans_for_member(&self, member_id: &str) -> CirculationResult<Vec<Loan>> {
        let loans: Vec<Loan> = self.store.find_models(Loan::MEMBER_ID, member_id)?;
        Ok(loans.into_iter().filter(Loan::is_active).collect())
    }

    // --- Internal ---

    fn now(&self) -> NaiveDateTime {
        self.clock.now().trunc_subsecs(6)
    }

    fn allocate_loan_id(&self, at: NaiveDateTime, isbn: &str, member_id: &str) -> Result<String> {
        for _ in 0..LOAN_ID_ATTEMPTS {
            let candidate = self.loan_ids.generate(at, isbn, member_id);
            if !self.store.contains_key::<Loan>(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(loan_id = %candidate, "loan id already taken, regenerating");
        }

        Err(StoreError::InvalidOperation(
            "could not allocate an unused loan id".into(),
        ))
    }

    /// Undo the availability flip of a checkout whose loan was not recorded.
    fn restore_availability(&self, isbn: &str) {
        let restored = self.store.update(
            BOOKS,
            Book::ISBN,
            &Value::from(isbn),
            patch(Book::AVAILABLE, true),
        );
        if let Err(e) = restored {
            tracing::error!(
                isbn,
                error = %e,
                "checkout failed and book is still marked unavailable"
            );
        }
    }
}

fn require(field: &'static str, value: &str) -> CirculationResult<()> {
    if value.is_empty() {
        return Err(rejected(CirculationError::MissingField(field)));
    }
    Ok(())
}

fn not_found(kind: EntityKind, id: &str) -> CirculationError {
    rejected(CirculationError::NotFound {
        kind,
        id: id.to_string(),
    })
}

fn rejected(err: CirculationError) -> CirculationError {
    tracing::debug!(error = %err, "request rejected");
    err
}
