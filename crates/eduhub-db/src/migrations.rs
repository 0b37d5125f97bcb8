use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE profiles (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                full_name   TEXT NOT NULL,
                role        TEXT NOT NULL CHECK (role IN ('student', 'professor', 'ngo')),
                grade       TEXT,
                center      TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE lectures (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                subject     TEXT NOT NULL DEFAULT '',
                grade       TEXT NOT NULL,
                video_url   TEXT,
                author_id   TEXT NOT NULL REFERENCES profiles(id),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_lectures_grade ON lectures(grade);

            CREATE TABLE challenges (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                ngo_id      TEXT NOT NULL REFERENCES profiles(id),
                deadline    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE ideas (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                author_id    TEXT NOT NULL REFERENCES profiles(id),
                challenge_id TEXT REFERENCES challenges(id),
                status       TEXT NOT NULL DEFAULT 'pending'
                             CHECK (status IN ('pending', 'approved', 'rejected')),
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_ideas_status ON ideas(status);

            CREATE TABLE test_results (
                id          TEXT PRIMARY KEY,
                student_id  TEXT NOT NULL REFERENCES profiles(id),
                topic       TEXT NOT NULL,
                score       INTEGER NOT NULL,
                total       INTEGER NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_results_student ON test_results(student_id);

            CREATE TABLE learning_centers (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                address     TEXT NOT NULL,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL
            );

            -- Seed the centers shown on the map
            INSERT INTO learning_centers (id, name, address, latitude, longitude) VALUES
                ('00000000-0000-0000-0000-000000000101', 'Riverside Community Library',
                 '12 Mill Road', 12.9716, 77.5946),
                ('00000000-0000-0000-0000-000000000102', 'Hilltop Learning Hub',
                 '4 Temple Street', 13.0827, 80.2707),
                ('00000000-0000-0000-0000-000000000103', 'Open Sky Study Center',
                 '88 Market Lane', 19.0760, 72.8777);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
