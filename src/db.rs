use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "absensi.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // class_label stays nullable and untrimmed; normalization happens on read.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            national_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            class_label TEXT,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_sort ON students(sort_order)",
        [],
    )?;

    // One row per student per day; a re-submitted day replaces its rows.
    // year/month are denormalized from date_key for the recap queries.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            date_key TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            national_id TEXT NOT NULL,
            student_name TEXT NOT NULL,
            class_label TEXT,
            status TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            UNIQUE(date_key, national_id, student_name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_period ON attendance(year, month)",
        [],
    )?;

    Ok(())
}
