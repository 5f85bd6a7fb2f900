//! FILENAME: core/engine/src/record.rs
//! PURPOSE: Defines the row model used by every stage of the pipeline.
//! CONTEXT: Values are kept as the literal text they were read with. Nothing is
//! coerced to numbers or dates, so leading zeros and surrounding characters survive
//! into pivot keys. A missing value is stored as the empty string.

use serde::{Deserialize, Serialize};

/// Index into a batch's columns (0-based).
pub type ColumnIndex = usize;

// ============================================================================
// SCHEMA
// ============================================================================

/// The ordered column names of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the first column with this exact name.
    pub fn index_of(&self, name: &str) -> Option<ColumnIndex> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn name(&self, index: ColumnIndex) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }
}

// ============================================================================
// RECORD BATCH
// ============================================================================

/// A contiguous slice of input records sharing one schema.
///
/// Every stored record has exactly `schema.len()` values: short records are
/// padded with empty strings and long ones are truncated when pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    schema: Schema,
    records: Vec<Vec<String>>,
}

impl RecordBatch {
    pub fn new(schema: Schema) -> Self {
        RecordBatch {
            schema,
            records: Vec::new(),
        }
    }

    pub fn with_capacity(schema: Schema, capacity: usize) -> Self {
        RecordBatch {
            schema,
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn from_records(schema: Schema, records: Vec<Vec<String>>) -> Self {
        let mut batch = RecordBatch::with_capacity(schema, records.len());
        for record in records {
            batch.push_record(record);
        }
        batch
    }

    /// Builds a batch from rows given as `(column, value)` pairs.
    ///
    /// The schema is the union of all column names in first-seen order; a row
    /// that does not mention a column gets the empty string for it.
    pub fn from_rows<I, R, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut pending: Vec<Vec<(usize, String)>> = Vec::new();

        for row in rows {
            let mut cells = Vec::new();
            for (key, value) in row {
                let key = key.into();
                let index = match columns.iter().position(|c| *c == key) {
                    Some(i) => i,
                    None => {
                        columns.push(key);
                        columns.len() - 1
                    }
                };
                cells.push((index, value.into()));
            }
            pending.push(cells);
        }

        let width = columns.len();
        let mut batch = RecordBatch::with_capacity(Schema { columns }, pending.len());
        for cells in pending {
            let mut record = vec![String::new(); width];
            for (index, value) in cells {
                record[index] = value;
            }
            batch.records.push(record);
        }
        batch
    }

    /// Appends a record, normalizing its width to the schema. Fields past the
    /// last column are dropped; readers report them.
    pub fn push_record(&mut self, mut record: Vec<String>) {
        record.resize(self.schema.len(), String::new());
        self.records.push(record);
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The value at (`row`, `column`). Panics if `row` is out of range.
    pub fn value(&self, row: usize, column: ColumnIndex) -> &str {
        self.records[row]
            .get(column)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.records.get(index).map(|values| Row {
            schema: &self.schema,
            values,
            index,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().enumerate().map(move |(index, values)| Row {
            schema: &self.schema,
            values,
            index,
        })
    }

    /// True when no record holds a non-empty value in `column`.
    pub fn column_is_blank(&self, column: ColumnIndex) -> bool {
        self.records
            .iter()
            .all(|r| r.get(column).map_or(true, |v| v.is_empty()))
    }

    /// Copies the records at `indices` (in the given order) into a new batch.
    pub fn select(&self, indices: &[usize]) -> RecordBatch {
        RecordBatch {
            schema: self.schema.clone(),
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }

    /// Splits the batch into consecutive batches of at most `size` records.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = RecordBatch> + '_ {
        self.records.chunks(size.max(1)).map(move |records| RecordBatch {
            schema: self.schema.clone(),
            records: records.to_vec(),
        })
    }
}

// ============================================================================
// ROW VIEW
// ============================================================================

/// A borrowed view of one record, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    schema: &'a Schema,
    values: &'a [String],
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of this row inside its batch.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.schema
            .index_of(column)
            .map(|i| self.values.get(i).map(String::as_str).unwrap_or(""))
    }

    pub fn value(&self, column: ColumnIndex) -> &'a str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    /// `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (schema, values) = (self.schema, self.values);
        schema
            .columns
            .iter()
            .enumerate()
            .map(move |(i, c)| (c.as_str(), values.get(i).map(String::as_str).unwrap_or("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordBatch {
        RecordBatch::from_records(
            Schema::new(["Destination", "Anchor", "Follow"]),
            vec![
                vec!["NY".into(), "Blue".into(), "".into()],
                vec!["LA".into(), "Red".into()],
                vec!["SF".into(), "Green".into(), "".into(), "extra".into()],
            ],
        )
    }

    #[test]
    fn test_push_record_normalizes_width() {
        let batch = sample();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.value(1, 2), "");
        assert_eq!(batch.row(2).unwrap().iter().count(), 3);
    }

    #[test]
    fn test_blank_column_detection() {
        let batch = sample();
        assert!(!batch.column_is_blank(0));
        assert!(batch.column_is_blank(2));
        assert!(RecordBatch::new(Schema::new(["A"])).column_is_blank(0));
    }

    #[test]
    fn test_select_and_chunks_keep_schema() {
        let batch = sample();
        let picked = batch.select(&[2, 0]);
        assert_eq!(picked.value(0, 0), "SF");
        assert_eq!(picked.schema(), batch.schema());

        let sizes: Vec<usize> = batch.chunks(2).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let batch = RecordBatch::from_rows(vec![vec![("Code", " 007 ")]]);
        let json = serde_json::to_string(&batch).unwrap();
        let back: RecordBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(0, 0), " 007 ");
    }
}
