/// SQL dialect spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgresql,
    Mysql,
}

#[derive(Debug)]
pub struct Capability {
    pub dialect: Dialect,

    /// Column storage types supported by the database
    pub storage_types: StorageTypes,

    /// SQL: Supports row-level locking with `SELECT ... FOR UPDATE`.
    pub select_for_update: bool,

    /// Supports `INSERT ... ON CONFLICT` / `ON DUPLICATE KEY`. Without it,
    /// upserts are emulated with a read followed by an insert or update.
    pub native_upsert: bool,

    /// Inserted identities are read back with `RETURNING` instead of the
    /// driver-reported last insert id.
    pub returning_identity: bool,

    /// Booleans are bound as booleans rather than integers.
    pub native_bool: bool,
}

#[derive(Debug)]
pub struct StorageTypes {
    /// Largest `n` accepted in `VARCHAR(n)`. Longer strings are stored as
    /// text.
    pub varchar: u64,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        dialect: Dialect::Sqlite,
        storage_types: StorageTypes::SQLITE,
        select_for_update: false,
        native_upsert: true,
        returning_identity: false,
        native_bool: false,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        dialect: Dialect::Postgresql,
        storage_types: StorageTypes::POSTGRESQL,
        select_for_update: true,
        returning_identity: true,
        native_bool: true,
        ..Self::SQLITE
    };

    /// MySQL capabilities
    pub const MYSQL: Self = Self {
        dialect: Dialect::Mysql,
        storage_types: StorageTypes::MYSQL,
        select_for_update: true,
        ..Self::SQLITE
    };
}

impl StorageTypes {
    /// SQLite ignores the length of `VARCHAR(n)`; the only limit is
    /// `SQLITE_MAX_LENGTH`.
    pub const SQLITE: StorageTypes = StorageTypes {
        varchar: 1_000_000_000,
    };

    pub const POSTGRESQL: StorageTypes = StorageTypes {
        varchar: 10_485_760,
    };

    pub const MYSQL: StorageTypes = StorageTypes { varchar: 65_535 };
}
