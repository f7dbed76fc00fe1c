//! Fixture databases for sqv integration tests.
//!
//! Each fixture lives in its own temp directory, removed when the fixture is
//! dropped.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use sqv::db::Database;
use tempfile::TempDir;

pub struct Fixture {
    dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    fn create(name: &str, build: impl FnOnce(&Connection)) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(name);
        let conn = Connection::open(&path).expect("create fixture database");
        build(&conn);
        drop(conn);
        Self { dir, path }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> Database {
        Database::open(&self.path).expect("open fixture database")
    }

    /// A second, independent connection for checking what was committed.
    pub fn raw(&self) -> Connection {
        Connection::open(&self.path).expect("open raw connection")
    }
}

/// Users, posts, an empty table, two indexes, a view and a trigger.
pub fn sample_db() -> Fixture {
    Fixture::create("sample.db", |conn| {
        conn.execute_batch(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 email TEXT UNIQUE,
                 age INTEGER DEFAULT 0,
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
             );
             CREATE TABLE posts (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 user_id INTEGER NOT NULL,
                 title TEXT NOT NULL,
                 content TEXT,
                 FOREIGN KEY (user_id) REFERENCES users(id)
             );
             CREATE TABLE empty_table (id INTEGER PRIMARY KEY, value TEXT);
             CREATE INDEX idx_users_email ON users(email);
             CREATE INDEX idx_posts_user ON posts(user_id);
             CREATE VIEW user_post_counts AS
                 SELECT u.name, COUNT(p.id) AS post_count
                 FROM users u LEFT JOIN posts p ON u.id = p.user_id
                 GROUP BY u.id;
             CREATE TRIGGER update_timestamp AFTER UPDATE ON users
             BEGIN
                 UPDATE users SET created_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
             END;",
        )
        .expect("create sample schema");

        for (name, age) in [
            ("Alice", 30),
            ("Bob", 25),
            ("Charlie", 35),
            ("Diana", 28),
            ("Eve", 32),
        ] {
            let email = format!("{}@example.com", name.to_lowercase());
            conn.execute(
                "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3)",
                params![name, email, age],
            )
            .expect("insert user");
        }

        let posts: [(i64, &str, Option<&str>); 4] = [
            (1, "Hello World", Some("First post content")),
            (1, "Second Post", Some("More content here")),
            (2, "Bob's Post", Some("Bob writes something")),
            (3, "Charlie's Thoughts", None),
        ];
        for (user_id, title, content) in posts {
            conn.execute(
                "INSERT INTO posts (user_id, title, content) VALUES (?1, ?2, ?3)",
                params![user_id, title, content],
            )
            .expect("insert post");
        }
    })
}

/// Bytes of the `large` blob, repeated 1000 times.
pub const LARGE_BLOB_CHUNK: &[u8] = b"\xb4|\x05xSg\xfb\xfeyO\x926";

pub fn blob_db() -> Fixture {
    Fixture::create("blobs.db", |conn| {
        conn.execute_batch("CREATE TABLE blobs (id INTEGER PRIMARY KEY, name TEXT, data BLOB);")
            .expect("create blobs table");
        let rows: [(i64, &str, Vec<u8>); 3] = [
            (1, "simple", vec![0x00, 0x01, 0x02, 0x03]),
            (2, "with_brackets", b"[test]data[/test]".to_vec()),
            (3, "large", LARGE_BLOB_CHUNK.repeat(1000)),
        ];
        for (id, name, data) in rows {
            conn.execute(
                "INSERT INTO blobs (id, name, data) VALUES (?1, ?2, ?3)",
                params![id, name, data],
            )
            .expect("insert blob");
        }
    })
}

/// `numbers(id, value, label)` with 500 rows: `(i, i * 10, "Label i")`.
pub fn large_db() -> Fixture {
    Fixture::create("large.db", |conn| {
        conn.execute_batch(
            "CREATE TABLE numbers (id INTEGER PRIMARY KEY, value INTEGER, label TEXT);",
        )
        .expect("create numbers table");
        let tx = conn.unchecked_transaction().expect("begin");
        for i in 1..=500i64 {
            tx.execute(
                "INSERT INTO numbers (id, value, label) VALUES (?1, ?2, ?3)",
                params![i, i * 10, format!("Label {}", i)],
            )
            .expect("insert number");
        }
        tx.commit().expect("commit");
    })
}
