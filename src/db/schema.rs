//! Table inventory of the job portal schema (`sql/schema.sql`).

/// Every table the schema creates, in dependency order.
pub const KNOWN_TABLES: &[&str] = &[
    "users",
    "companies",
    "jobs",
    "skills",
    "resume_templates",
    "resumes",
    "resume_skills",
    "job_skills",
    "applications",
    "referrals",
    "payments",
];

pub fn is_known_table(name: &str) -> bool {
    KNOWN_TABLES.contains(&name)
}

/// `SELECT COUNT(*)` for a table from [`KNOWN_TABLES`].
///
/// Only inventory names are accepted, so the identifier never comes from input.
pub fn count_query(table: &str) -> Option<String> {
    is_known_table(table).then(|| format!("SELECT COUNT(*) FROM \"{table}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_query_only_for_known_tables() {
        assert_eq!(
            count_query("jobs").as_deref(),
            Some("SELECT COUNT(*) FROM \"jobs\"")
        );
        assert_eq!(count_query("jobs; DROP TABLE users"), None);
    }

    #[test]
    fn inventory_matches_schema_file() {
        let ddl = include_str!("../../sql/schema.sql");
        for table in KNOWN_TABLES {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "schema.sql has no CREATE TABLE for {table}"
            );
        }
    }
}
