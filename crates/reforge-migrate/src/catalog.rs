//! Per-table migration descriptors.
//!
//! Each [`TableSpec`] drives the generic table step: which columns to copy,
//! which to normalise, which foreign keys to remap, and in what order to read
//! the source rows. [`TABLES`] lists them in dependency order.

use crate::mapper::EntityKind;

/// How a table's rows are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// The table has an integer `id` replaced by a freshly minted UUID.
    Minted(EntityKind),
    /// Junction or keyed table; the key is its reference columns.
    Composite,
}

/// Conversion applied to one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    /// Copied unchanged.
    Copy,
    /// Text with a fallback for NULL or blank values.
    Text { default: &'static str },
    /// 0/1-style flag normalised to a boolean.
    Bool { default: bool },
    /// SQLite datetime text converted to a UTC timestamp. When `default_now`
    /// is set an absent value is filled with the run's start time.
    Timestamp { default_now: bool },
    /// Foreign key remapped through the id mapper.
    Reference { entity: EntityKind, required: bool },
}

/// One migrated column. Source and target share the column name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Descriptor for one table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSpec {
    /// Table name, identical in source and target.
    pub name: &'static str,
    /// Label used in the run summary.
    pub label: &'static str,
    pub identity: Identity,
    /// Source read order; also the row key of composite tables.
    pub order_by: &'static [&'static str],
    /// Columns other than the minted `id`.
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Entity minted by this table, if any.
    pub fn minted(&self) -> Option<EntityKind> {
        match self.identity {
            Identity::Minted(kind) => Some(kind),
            Identity::Composite => None,
        }
    }

    /// Foreign-key columns and the entities they reference.
    pub fn references(&self) -> impl Iterator<Item = (&'static str, EntityKind, bool)> + '_ {
        self.columns.iter().filter_map(|c| match c.kind {
            ColumnKind::Reference { entity, required } => Some((c.name, entity, required)),
            _ => None,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn copy(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Copy,
    }
}

const fn text_or(name: &'static str, default: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text { default },
    }
}

const fn flag(name: &'static str, default: bool) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Bool { default },
    }
}

const fn timestamp(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Timestamp { default_now: false },
    }
}

const fn timestamp_or_now(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Timestamp { default_now: true },
    }
}

const fn refers(name: &'static str, entity: EntityKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Reference {
            entity,
            required: true,
        },
    }
}

const fn maybe_refers(name: &'static str, entity: EntityKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Reference {
            entity,
            required: false,
        },
    }
}

pub const USERS: TableSpec = TableSpec {
    name: "users",
    label: "Users",
    identity: Identity::Minted(EntityKind::User),
    order_by: &["id"],
    columns: &[
        copy("username"),
        copy("email"),
        copy("password_hash"),
        text_or("role", "user"),
        flag("is_active", false),
        timestamp_or_now("created_at"),
    ],
};

pub const INVITE_CODES: TableSpec = TableSpec {
    name: "invite_codes",
    label: "Invite Codes",
    identity: Identity::Minted(EntityKind::InviteCode),
    order_by: &["id"],
    columns: &[
        copy("code"),
        maybe_refers("created_by_user_id", EntityKind::User),
        flag("is_used", false),
        timestamp_or_now("created_at"),
        timestamp("used_at"),
    ],
};

pub const PATTERNS: TableSpec = TableSpec {
    name: "patterns",
    label: "Patterns",
    identity: Identity::Minted(EntityKind::Pattern),
    order_by: &["id"],
    columns: &[
        copy("title"),
        copy("description"),
        timestamp_or_now("created_at"),
    ],
};

pub const PROBLEMS: TableSpec = TableSpec {
    name: "problems",
    label: "Problems",
    identity: Identity::Minted(EntityKind::Problem),
    order_by: &["id"],
    columns: &[
        copy("title"),
        copy("source"),
        copy("url"),
        copy("difficulty"),
        timestamp_or_now("created_at"),
    ],
};

pub const PROBLEM_PATTERNS: TableSpec = TableSpec {
    name: "problem_patterns",
    label: "Problem Patterns",
    identity: Identity::Composite,
    order_by: &["problem_id", "pattern_id"],
    columns: &[
        refers("problem_id", EntityKind::Problem),
        refers("pattern_id", EntityKind::Pattern),
    ],
};

pub const SESSIONS: TableSpec = TableSpec {
    name: "sessions",
    label: "Sessions",
    identity: Identity::Minted(EntityKind::Session),
    order_by: &["id"],
    columns: &[
        refers("user_id", EntityKind::User),
        copy("title"),
        copy("session_type"),
        copy("status"),
        copy("total_problems"),
        copy("completed_problems"),
        copy("elapsed_time_seconds"),
        copy("timer_state"),
        timestamp("timer_last_updated_at"),
        timestamp("started_at"),
        timestamp("completed_at"),
        timestamp_or_now("created_at"),
    ],
};

pub const SESSION_PROBLEMS: TableSpec = TableSpec {
    name: "session_problems",
    label: "Session Problems",
    identity: Identity::Composite,
    order_by: &["session_id", "order_index", "problem_id"],
    columns: &[
        refers("session_id", EntityKind::Session),
        refers("problem_id", EntityKind::Problem),
        copy("order_index"),
        flag("is_completed", false),
    ],
};

pub const ATTEMPTS: TableSpec = TableSpec {
    name: "attempts",
    label: "Attempts",
    identity: Identity::Minted(EntityKind::Attempt),
    order_by: &["id"],
    columns: &[
        refers("user_id", EntityKind::User),
        refers("problem_id", EntityKind::Problem),
        maybe_refers("session_id", EntityKind::Session),
        copy("confidence_score"),
        copy("duration_seconds"),
        copy("outcome"),
        copy("notes"),
        timestamp_or_now("performed_at"),
        text_or("status", "completed"),
        copy("elapsed_time_seconds"),
        copy("timer_state"),
        timestamp("timer_last_updated_at"),
        timestamp("started_at"),
    ],
};

pub const USER_PROBLEM_STATS: TableSpec = TableSpec {
    name: "user_problem_stats",
    label: "User Problem Stats",
    identity: Identity::Composite,
    order_by: &["user_id", "problem_id"],
    columns: &[
        refers("user_id", EntityKind::User),
        refers("problem_id", EntityKind::Problem),
        copy("status"),
        copy("confidence"),
        copy("avg_confidence"),
        timestamp("last_attempt_at"),
        copy("total_attempts"),
        copy("avg_time_seconds"),
        copy("last_outcome"),
        copy("recent_history_json"),
        timestamp("next_review_at"),
        copy("interval_days"),
        copy("ease_factor"),
        copy("review_count"),
    ],
};

pub const USER_PATTERN_STATS: TableSpec = TableSpec {
    name: "user_pattern_stats",
    label: "User Pattern Stats",
    identity: Identity::Composite,
    order_by: &["user_id", "pattern_id"],
    columns: &[
        refers("user_id", EntityKind::User),
        refers("pattern_id", EntityKind::Pattern),
        copy("avg_confidence"),
        copy("times_revised"),
    ],
};

/// All tables in dependency order: every parent precedes its dependents.
pub static TABLES: [TableSpec; 10] = [
    USERS,
    INVITE_CODES,
    PATTERNS,
    PROBLEMS,
    PROBLEM_PATTERNS,
    SESSIONS,
    SESSION_PROBLEMS,
    ATTEMPTS,
    USER_PROBLEM_STATS,
    USER_PATTERN_STATS,
];

/// Look up a table descriptor by name.
pub fn table(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}

/// Table names in the order they are cleared: reverse dependency order.
pub fn clear_order() -> impl Iterator<Item = &'static str> {
    TABLES.iter().rev().map(|t| t.name)
}
