use crate::schema::{OnDelete, TableSchema};

/// Quote an identifier; some column names (`trigger`) are SQL keywords
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", quote(schema.name));
    let mut columns = vec!["    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let default = col
            .default
            .map(|d| format!(" DEFAULT {}", d))
            .unwrap_or_default();

        columns.push(format!(
            "    {} {}{}{}",
            quote(col.name),
            col.col_type.sql_type(),
            null_constraint,
            default
        ));
    }

    if schema.timestamps {
        columns.push("    \"created_at\" TEXT".to_string());
        columns.push("    \"updated_at\" TEXT".to_string());
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        let on_delete = match fk.on_delete {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        };
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {}",
            quote(fk.column),
            quote(fk.references_table),
            quote(fk.references_column),
            on_delete
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for declared indexes and foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let mut statements: Vec<String> = schema
        .indexes
        .iter()
        .map(|index| {
            let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
            let prefix = if index.unique { "uniq" } else { "idx" };
            let cols: Vec<String> = index.columns.iter().map(|c| quote(c)).collect();
            format!(
                "CREATE {} IF NOT EXISTS {}_{}_{} ON {}({})",
                kind,
                prefix,
                schema.name,
                index.columns.join("_"),
                quote(schema.name),
                cols.join(", ")
            )
        })
        .collect();

    for fk in schema.foreign_keys {
        let covered = schema
            .indexes
            .iter()
            .any(|index| index.columns.first() == Some(&fk.column));
        if !covered {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name,
                fk.column,
                quote(schema.name),
                quote(fk.column)
            ));
        }
    }

    statements
}
