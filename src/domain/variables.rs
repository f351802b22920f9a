//! Variable table: one row per output unit.

/// One row of template variables.
///
/// Keys keep the CSV header order. A key is present when the header names it
/// and the record has a field at that position, even if the value is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRow {
    index: usize,
    values: Vec<(String, String)>,
}

impl VariableRow {
    pub fn new(index: usize, values: Vec<(String, String)>) -> Self {
        Self { index, values }
    }

    /// Zero-based position among the table's data rows.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based line in the CSV file, counting the header.
    pub fn line(&self) -> usize {
        self.index + 2
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }
}

/// Header names plus rows, as read from a variables CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    pub headers: Vec<String>,
    pub rows: Vec<VariableRow>,
}

impl VariableTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Append a row built from values in header order.
    ///
    /// Extra values beyond the header are ignored; a short record leaves the
    /// trailing keys absent.
    pub fn push_record<I, S>(&mut self, record: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = self.headers.iter().cloned().zip(record.into_iter().map(Into::into)).collect();
        let index = self.rows.len();
        self.rows.push(VariableRow::new(index, values));
    }

    /// Values of one column in row order. Rows missing the key are skipped.
    #[cfg(test)]
    pub fn column(&self, key: &str) -> Vec<&str> {
        self.rows.iter().filter_map(|row| row.get(key)).collect()
    }
}

/// Build the learning-resource variable table from a topic list.
///
/// The first row is an overview of the whole subject; every topic follows
/// as its own row with its description (empty when none was supplied).
pub fn topic_table(
    title: &str,
    topics: &[String],
    descriptions: Option<&[String]>,
) -> Result<VariableTable, String> {
    if let Some(descriptions) = descriptions {
        if descriptions.len() != topics.len() {
            return Err(format!(
                "Number of topics ({}) must match number of descriptions ({})",
                topics.len(),
                descriptions.len()
            ));
        }
    }

    let mut table = VariableTable::new(vec!["title".to_string(), "description".to_string()]);
    let overview = format!("{}\n\n{}", title, topics.join("\n"));
    table.push_record([title.to_string(), overview]);

    for (i, topic) in topics.iter().enumerate() {
        let description = descriptions.map(|d| d[i].clone()).unwrap_or_default();
        table.push_record([topic.clone(), description]);
    }
    Ok(table)
}
