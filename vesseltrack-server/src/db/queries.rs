//! SQL text for the two position queries
//!
//! Only the validated, quoted table name is spliced into the text.
//! Request values are always bound parameters.

use crate::models::TableName;

/// Rank column added by the live query; stripped from records.
pub const LIVE_RANK_COLUMN: &str = "__live_rank";

/// Latest row per vessel, ranked inside the database.
pub fn live_sql(table: &TableName) -> String {
    format!(
        r#"
        SELECT *
        FROM (
            SELECT *, ROW_NUMBER() OVER (PARTITION BY mmsi ORDER BY "timestamp" DESC) AS "{rank}"
            FROM {table}
        ) latest
        WHERE "{rank}" = 1
        "#,
        rank = LIVE_RANK_COLUMN,
        table = table.quoted(),
    )
}

/// One vessel's rows in an inclusive date range, oldest first.
///
/// Binds: `$1` mmsi (text), `$2` start date, `$3` end date. The mmsi
/// column is compared as text so numeric and character columns both work.
pub fn history_sql(table: &TableName) -> String {
    format!(
        r#"
        SELECT *
        FROM {table}
        WHERE CAST(mmsi AS TEXT) = $1
          AND "timestamp" BETWEEN $2 AND $3
        ORDER BY "timestamp" ASC
        "#,
        table = table.quoted(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_ranks_in_sql() {
        let sql = live_sql(&TableName::default());
        assert!(sql.contains("ROW_NUMBER() OVER (PARTITION BY mmsi ORDER BY \"timestamp\" DESC)"));
        assert!(sql.contains(r#"FROM "spire"."vessel""#));
        assert!(sql.contains(r#"WHERE "__live_rank" = 1"#));
    }

    #[test]
    fn history_uses_placeholders_only() {
        let sql = history_sql(&TableName::default());
        assert!(sql.contains("CAST(mmsi AS TEXT) = $1"));
        assert!(sql.contains("BETWEEN $2 AND $3"));
        assert!(sql.contains("ORDER BY \"timestamp\" ASC"));
        assert!(!sql.contains('?'));
    }

    #[test]
    fn qualified_table_is_quoted() {
        let table = TableName::new("ais.Spire.Vessel").unwrap();
        assert!(history_sql(&table).contains(r#"FROM "ais"."Spire"."Vessel""#));
        assert!(live_sql(&table).contains(r#"FROM "ais"."Spire"."Vessel""#));
    }
}
