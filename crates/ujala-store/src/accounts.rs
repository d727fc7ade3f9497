//! CRUD operations for [`Account`] records and reporter approval.

use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, OptionalExtension};
use ujala_shared::constants::REPORTER_CODE_MAX_ATTEMPTS;
use ujala_shared::{generate_reporter_code, Role};
use uuid::Uuid;

use crate::codec::{fmt_opt_ts, fmt_ts, get_opt_ts, get_ts, get_uuid, now};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Account, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, is_approved, \
     reporter_id, approved_at, avatar, created_at, updated_at";

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create an account. Reporters get a reporter code straight away.
    ///
    /// Fails with [`StoreError::Duplicate`] (`field == "email"`) when the
    /// email is taken.
    pub fn create_account(&self, new: NewAccount) -> Result<Account> {
        let name = new.name.trim().to_string();
        let email = normalize_email(&new.email);
        if name.is_empty() || email.is_empty() || new.password_hash.is_empty() {
            return Err(StoreError::Validation(
                "name, email and password are required".into(),
            ));
        }

        let reporter_id = match new.role {
            Role::Reporter => Some(self.unused_reporter_code()?),
            _ => None,
        };

        let now = now();
        let account = Account {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: new.password_hash,
            role: new.role,
            is_approved: new.is_approved,
            reporter_id,
            approved_at: new.is_approved.then_some(now),
            avatar: new.avatar,
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            &format!(
                "INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES (
                    :id, :name, :email, :password_hash, :role, :is_approved,
                    :reporter_id, :approved_at, :avatar, :created_at, :updated_at)"
            ),
            named_params! {
                ":id": account.id.to_string(),
                ":name": account.name,
                ":email": account.email,
                ":password_hash": account.password_hash,
                ":role": account.role.as_str(),
                ":is_approved": account.is_approved,
                ":reporter_id": account.reporter_id,
                ":approved_at": fmt_opt_ts(&account.approved_at),
                ":avatar": account.avatar,
                ":created_at": fmt_ts(&account.created_at),
                ":updated_at": fmt_ts(&account.updated_at),
            },
        )?;

        tracing::info!(id = %account.id, role = %account.role, "account created");
        Ok(account)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        self.account_where("id = ?1", &id.to_string())
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Account> {
        self.account_where("email = ?1", &normalize_email(email))
    }

    fn account_where(&self, predicate: &str, value: &str) -> Result<Account> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {predicate}"),
                [value],
                row_to_account,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::from(other),
            })
    }

    /// All reporter accounts, newest first.
    pub fn list_reporters(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE role = 'reporter'
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], row_to_account)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    pub fn reporter_code_exists(&self, code: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM accounts WHERE reporter_id = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Draw reporter codes until one is unused, at most
    /// [`REPORTER_CODE_MAX_ATTEMPTS`] times. The UNIQUE index still backs
    /// this up if two writers race for the same code.
    pub fn unused_reporter_code(&self) -> Result<String> {
        self.unused_reporter_code_with(generate_reporter_code)
    }

    fn unused_reporter_code_with(&self, mut generate: impl FnMut() -> String) -> Result<String> {
        for attempt in 1..=REPORTER_CODE_MAX_ATTEMPTS {
            let code = generate();
            if !self.reporter_code_exists(&code)? {
                return Ok(code);
            }
            tracing::debug!(attempt, code = %code, "reporter code taken, retrying");
        }
        Err(StoreError::ReporterCodeExhausted)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    fn save_account(&self, account: &mut Account) -> Result<()> {
        account.updated_at = now();
        let affected = self.conn().execute(
            "UPDATE accounts SET
                name = :name, is_approved = :is_approved, reporter_id = :reporter_id,
                approved_at = :approved_at, avatar = :avatar, updated_at = :updated_at
             WHERE id = :id",
            named_params! {
                ":id": account.id.to_string(),
                ":name": account.name,
                ":is_approved": account.is_approved,
                ":reporter_id": account.reporter_id,
                ":approved_at": fmt_opt_ts(&account.approved_at),
                ":avatar": account.avatar,
                ":updated_at": fmt_ts(&account.updated_at),
            },
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Approve a reporter so they can log in.
    ///
    /// Idempotent: `approved_at` keeps its first value and an existing
    /// reporter code is never replaced. Non-reporters are rejected with
    /// [`StoreError::NotAReporter`] and left untouched.
    pub fn approve_reporter(&self, id: Uuid) -> Result<Account> {
        self.approve_reporter_at(id, now())
    }

    fn approve_reporter_at(&self, id: Uuid, now: DateTime<Utc>) -> Result<Account> {
        let mut account = self.get_account(id)?;
        if account.role != Role::Reporter {
            return Err(StoreError::NotAReporter);
        }

        account.is_approved = true;
        if account.approved_at.is_none() {
            account.approved_at = Some(now);
        }
        if account.reporter_id.is_none() {
            account.reporter_id = Some(self.unused_reporter_code()?);
        }
        self.save_account(&mut account)?;

        tracing::info!(id = %id, reporter_id = ?account.reporter_id, "reporter approved");
        Ok(account)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Hard-delete a reporter account. Non-reporters are rejected.
    pub fn delete_reporter(&self, id: Uuid) -> Result<Account> {
        let account = self.get_account(id)?;
        if account.role != Role::Reporter {
            return Err(StoreError::NotAReporter);
        }
        self.conn()
            .execute("DELETE FROM accounts WHERE id = ?1", [id.to_string()])?;

        tracing::info!(id = %id, "reporter deleted");
        Ok(account)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let role_idx = row.as_ref().column_index("role")?;
    let role_str: String = row.get(role_idx)?;
    let role = role_str.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            role_idx,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;

    Ok(Account {
        id: get_uuid(row, "id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role,
        is_approved: row.get("is_approved")?,
        reporter_id: row.get("reporter_id")?,
        approved_at: get_opt_ts(row, "approved_at")?,
        avatar: row.get("avatar")?,
        created_at: get_ts(row, "created_at")?,
        updated_at: get_ts(row, "updated_at")?,
    })
}
