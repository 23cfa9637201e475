//! SQLite adapter: Implementation of `IdentityStore`.
//!
//! Provides persistence for the four role tables, OTP challenges, and
//! server-held sessions.
//!
//! # Schema
//!
//! The role tables keep their historical column names (`mobile` vs
//! `mobile_number`, `village` vs `clinic_village`); the per-role
//! [`crate::domain::RoleSchema`] constants drive the SQL text so the
//! inconsistency is confined to this module and `domain::role`.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from
//! panic in another thread) will cause panic. This fail-fast behavior
//! is intentional for data integrity in healthcare applications.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::domain::{
    AdminAccount, OtpChallenge, Profile, Role, Session, UserAccount, UserRole,
};
use crate::ports::IdentityStore;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// SQLite identity store.
pub struct SqliteIdentityStore {
    conn: Mutex<Connection>,
}

impl SqliteIdentityStore {
    /// Open (or create) the store at the given database path.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS admins (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS doctors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                mobile TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                clinic_village TEXT NOT NULL,
                clinic_address TEXT NOT NULL,
                specialization TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hospitals (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                village TEXT NOT NULL,
                address TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                mobile TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                village TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                height_cm REAL NOT NULL,
                weight_kg REAL NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS otp_challenges (
                role TEXT NOT NULL,
                user_id TEXT NOT NULL,
                code TEXT NOT NULL,
                valid_until TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (role, user_id)
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT,
                mobile TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_expires
                ON sessions(expires_at);
            ",
        )?;

        Ok(())
    }

    fn parse_timestamp(table: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::MalformedRow {
                table,
                reason: format!("bad timestamp {value:?}: {e}"),
            })
    }

    /// Map a full row from a role table into raw (unparsed) form.
    ///
    /// Column order is fixed per role by [`Self::select_list`].
    fn row_to_user(role: UserRole, row: &Row<'_>) -> rusqlite::Result<RawUserRow> {
        Ok(RawUserRow {
            id: row.get(0)?,
            name: row.get(1)?,
            mobile: row.get(2)?,
            email: row.get(3)?,
            password_hash: row.get(4)?,
            village: row.get(5)?,
            extra: match role {
                UserRole::Doctor => RawProfile::Doctor {
                    clinic_address: row.get(6)?,
                    specialization: row.get(7)?,
                },
                UserRole::Hospital => RawProfile::Hospital {
                    address: row.get(6)?,
                },
                UserRole::Patient => RawProfile::Patient {
                    date_of_birth: row.get(6)?,
                    height_cm: row.get(7)?,
                    weight_kg: row.get(8)?,
                },
            },
            created_at: match role {
                UserRole::Doctor => row.get(8)?,
                UserRole::Hospital => row.get(7)?,
                UserRole::Patient => row.get(9)?,
            },
        })
    }

    /// SELECT list for a role table, normalized column order:
    /// id, name, mobile, email, password_hash, village, profile..., created_at.
    fn select_list(role: UserRole) -> String {
        let schema = role.schema();
        let profile_columns = match role {
            UserRole::Doctor => "clinic_address, specialization",
            UserRole::Hospital => "address",
            UserRole::Patient => "date_of_birth, height_cm, weight_kg",
        };
        format!(
            "id, name, {mobile}, email, password_hash, {village}, {profile}, created_at",
            mobile = schema.mobile_column,
            village = schema.village_column,
            profile = profile_columns,
        )
    }

    fn find_user_where(
        &self,
        role: UserRole,
        column: &str,
        value: &str,
    ) -> Result<Option<UserAccount>, StoreError> {
        let conn = self.conn.lock().expect("Lock failed");
        let schema = role.schema();

        let sql = format!(
            "SELECT {list} FROM {table} WHERE {column} = ?1",
            list = Self::select_list(role),
            table = schema.table,
        );
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(params![value], |row| Self::row_to_user(role, row));
        match result {
            Ok(raw) => Ok(Some(raw.into_account(role)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Row contents before parsing into a validated [`UserAccount`].
struct RawUserRow {
    id: String,
    name: String,
    mobile: String,
    email: String,
    password_hash: String,
    village: String,
    extra: RawProfile,
    created_at: String,
}

enum RawProfile {
    Doctor {
        clinic_address: String,
        specialization: String,
    },
    Hospital {
        address: String,
    },
    Patient {
        date_of_birth: String,
        height_cm: f64,
        weight_kg: f64,
    },
}

impl RawUserRow {
    fn into_account(self, role: UserRole) -> Result<UserAccount, StoreError> {
        let table = role.schema().table;
        let profile = match self.extra {
            RawProfile::Doctor {
                clinic_address,
                specialization,
            } => Profile::Doctor {
                clinic_address,
                specialization,
            },
            RawProfile::Hospital { address } => Profile::Hospital { address },
            RawProfile::Patient {
                date_of_birth,
                height_cm,
                weight_kg,
            } => Profile::Patient {
                date_of_birth: date_of_birth.parse().map_err(|e| StoreError::MalformedRow {
                    table,
                    reason: format!("bad date_of_birth {date_of_birth:?}: {e}"),
                })?,
                height_cm,
                weight_kg,
            },
        };

        Ok(UserAccount {
            id: self.id,
            name: self.name,
            mobile: self.mobile,
            email: self.email,
            password_hash: self.password_hash,
            village: self.village,
            profile,
            created_at: SqliteIdentityStore::parse_timestamp(table, &self.created_at)?,
        })
    }
}

impl IdentityStore for SqliteIdentityStore {
    type Error = StoreError;

    fn insert_user(&self, account: &UserAccount) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let created_at = account.created_at.to_rfc3339();

        match &account.profile {
            Profile::Doctor {
                clinic_address,
                specialization,
            } => {
                conn.execute(
                    r"
                    INSERT INTO doctors (
                        id, name, mobile, email, password_hash,
                        clinic_village, clinic_address, specialization, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ",
                    params![
                        account.id,
                        account.name,
                        account.mobile,
                        account.email,
                        account.password_hash,
                        account.village,
                        clinic_address,
                        specialization,
                        created_at,
                    ],
                )?;
            }
            Profile::Hospital { address } => {
                conn.execute(
                    r"
                    INSERT INTO hospitals (
                        id, name, mobile_number, email, password_hash,
                        village, address, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ",
                    params![
                        account.id,
                        account.name,
                        account.mobile,
                        account.email,
                        account.password_hash,
                        account.village,
                        address,
                        created_at,
                    ],
                )?;
            }
            Profile::Patient {
                date_of_birth,
                height_cm,
                weight_kg,
            } => {
                conn.execute(
                    r"
                    INSERT INTO patients (
                        id, name, mobile, email, password_hash,
                        village, date_of_birth, height_cm, weight_kg, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ",
                    params![
                        account.id,
                        account.name,
                        account.mobile,
                        account.email,
                        account.password_hash,
                        account.village,
                        date_of_birth.to_string(),
                        height_cm,
                        weight_kg,
                        created_at,
                    ],
                )?;
            }
        }

        tracing::debug!(role = %account.role(), "Inserted new account");
        Ok(())
    }

    fn find_user_by_id(
        &self,
        role: UserRole,
        id: &str,
    ) -> Result<Option<UserAccount>, Self::Error> {
        self.find_user_where(role, "id", id)
    }

    fn find_user_by_mobile(
        &self,
        role: UserRole,
        mobile: &str,
    ) -> Result<Option<UserAccount>, Self::Error> {
        self.find_user_where(role, role.schema().mobile_column, mobile)
    }

    fn user_id_exists(&self, role: UserRole, id: &str) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", role.schema().table);
        let count: i64 = conn.query_row(&sql, params![id], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn update_password(
        &self,
        role: UserRole,
        id: &str,
        password_hash: &str,
    ) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let sql = format!(
            "UPDATE {} SET password_hash = ?1 WHERE id = ?2",
            role.schema().table
        );
        let changed = conn.execute(&sql, params![password_hash, id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("{role} account {id}")));
        }
        Ok(())
    }

    fn delete_user(&self, role: UserRole, id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let sql = format!("DELETE FROM {} WHERE id = ?1", role.schema().table);
        conn.execute(&sql, params![id])?;
        Ok(())
    }

    fn insert_admin(&self, admin: &AdminAccount) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            "INSERT INTO admins (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![
                admin.username,
                admin.password_hash,
                admin.created_at.to_rfc3339()
            ],
        )?;
        tracing::info!("Seeded admin account");
        Ok(())
    }

    fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut stmt = conn.prepare(
            "SELECT username, password_hash, created_at FROM admins WHERE username = ?1",
        )?;

        let result = stmt.query_row(params![username], |row| {
            let username: String = row.get(0)?;
            let password_hash: String = row.get(1)?;
            let created_at: String = row.get(2)?;
            Ok((username, password_hash, created_at))
        });

        match result {
            Ok((username, password_hash, created_at)) => Ok(Some(AdminAccount {
                username,
                password_hash,
                created_at: Self::parse_timestamp("admins", &created_at)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn upsert_otp(&self, challenge: &OtpChallenge) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            r"
            INSERT OR REPLACE INTO otp_challenges (
                role, user_id, code, valid_until, attempts
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                challenge.role.as_str(),
                challenge.user_id,
                challenge.code,
                challenge.valid_until.to_rfc3339(),
                challenge.attempts,
            ],
        )?;
        Ok(())
    }

    fn load_otp(&self, role: UserRole, user_id: &str) -> Result<Option<OtpChallenge>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut stmt = conn.prepare(
            r"
            SELECT code, valid_until, attempts FROM otp_challenges
            WHERE role = ?1 AND user_id = ?2
            ",
        )?;

        let result = stmt.query_row(params![role.as_str(), user_id], |row| {
            let code: String = row.get(0)?;
            let valid_until: String = row.get(1)?;
            let attempts: u32 = row.get(2)?;
            Ok((code, valid_until, attempts))
        });

        match result {
            Ok((code, valid_until, attempts)) => Ok(Some(OtpChallenge {
                role,
                user_id: user_id.to_string(),
                code,
                valid_until: Self::parse_timestamp("otp_challenges", &valid_until)?,
                attempts,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record_otp_attempt(&self, role: UserRole, user_id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            r"
            UPDATE otp_challenges SET attempts = attempts + 1
            WHERE role = ?1 AND user_id = ?2
            ",
            params![role.as_str(), user_id],
        )?;
        Ok(())
    }

    fn delete_otp(&self, role: UserRole, user_id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            "DELETE FROM otp_challenges WHERE role = ?1 AND user_id = ?2",
            params![role.as_str(), user_id],
        )?;
        Ok(())
    }

    fn insert_session(&self, session: &Session) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            r"
            INSERT INTO sessions (
                token, user_id, role, name, email, mobile, created_at, expires_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                session.token,
                session.user_id,
                session.role.as_str(),
                session.name,
                session.email,
                session.mobile,
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn find_session(&self, token: &str) -> Result<Option<Session>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut stmt = conn.prepare(
            r"
            SELECT token, user_id, role, name, email, mobile, created_at, expires_at
            FROM sessions WHERE token = ?1
            ",
        )?;

        type SessionRow = (
            String,
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            String,
            String,
        );
        let result: rusqlite::Result<SessionRow> = stmt.query_row(params![token], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        });

        match result {
            Ok((token, user_id, role, name, email, mobile, created_at, expires_at)) => {
                let role = Role::parse(&role).ok_or_else(|| StoreError::MalformedRow {
                    table: "sessions",
                    reason: format!("unknown role {role:?}"),
                })?;
                Ok(Some(Session {
                    token,
                    user_id,
                    role,
                    name,
                    email,
                    mobile,
                    created_at: Self::parse_timestamp("sessions", &created_at)?,
                    expires_at: Self::parse_timestamp("sessions", &expires_at)?,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_session(&self, token: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now.to_rfc3339()],
        )?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    fn count_sessions(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
