//! Scenarios against real Postgres servers. Run with
//! `DBMIRROR_TEST_SOURCE_URL=... DBMIRROR_TEST_DEST_URL=... cargo test -- --ignored`.
