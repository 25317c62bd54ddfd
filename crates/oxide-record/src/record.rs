//! Key/value entity storage with snapshot diffing.
//!
//! A [`Record`] holds the current field values of one row, the snapshot taken
//! when the row was hydrated, and any fields whose value is a sub-query. The
//! difference between snapshot and current data is a [`ChangeSet`].

use std::collections::BTreeMap;

use oxide_record_core::{Row, SqlValue, Statement, ToSqlValue};

/// Field storage for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: Row,
    snapshot: Row,
    subqueries: BTreeMap<String, Statement>,
    loaded: bool,
}

impl Record {
    /// Creates an empty, unloaded record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.data.get(field)
    }

    /// Returns whether the field is set.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.data.contains_key(field) || self.subqueries.contains_key(field)
    }

    /// Sets a field value, replacing any pending sub-query for it.
    pub fn set<V: ToSqlValue>(&mut self, field: &str, value: V) -> &mut Self {
        self.subqueries.remove(field);
        self.data.insert(field.to_string(), value.to_sql_value());
        self
    }

    /// Sets a field to the result of a sub-query, evaluated by the database
    /// when the entity is saved.
    pub fn set_subquery(&mut self, field: &str, statement: Statement) -> &mut Self {
        self.data.remove(field);
        self.subqueries.insert(field.to_string(), statement);
        self
    }

    /// Removes a field.
    pub fn unset(&mut self, field: &str) -> &mut Self {
        self.data.remove(field);
        self.subqueries.remove(field);
        self
    }

    /// Current field values.
    #[must_use]
    pub const fn data(&self) -> &Row {
        &self.data
    }

    /// Field values as they were at hydration or at the last successful save.
    #[must_use]
    pub const fn snapshot(&self) -> &Row {
        &self.snapshot
    }

    /// Pending sub-query fields.
    #[must_use]
    pub const fn subqueries(&self) -> &BTreeMap<String, Statement> {
        &self.subqueries
    }

    /// Whether the record was hydrated from the database.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replaces data and snapshot with `row` and marks the record loaded.
    pub fn hydrate(&mut self, row: Row) {
        self.snapshot.clone_from(&row);
        self.data = row;
        self.subqueries.clear();
        self.loaded = true;
    }

    /// Copies the current data into the snapshot. Sub-query fields are
    /// dropped: their value is only known to the database.
    pub fn commit_snapshot(&mut self) {
        self.snapshot.clone_from(&self.data);
        self.subqueries.clear();
    }

    /// Differences between the snapshot and the current data.
    #[must_use]
    pub fn changes(&self) -> ChangeSet {
        let mut changes = ChangeSet::between(&self.snapshot, &self.data);
        for (field, statement) in &self.subqueries {
            changes
                .fields
                .insert(field.clone(), FieldValue::Subquery(statement.clone()));
        }
        changes
    }

    /// Whether any field differs from the snapshot.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.subqueries.is_empty()
            || self
                .data
                .iter()
                .any(|(field, value)| self.snapshot.get(field) != Some(value))
    }
}

/// The value a changed field will be written with.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A plain value, bound as a parameter.
    Value(SqlValue),
    /// A sub-query, inlined in parentheses with its own parameters.
    Subquery(Statement),
}

/// Fields whose current value differs from the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    fields: BTreeMap<String, FieldValue>,
}

impl ChangeSet {
    /// Compares two field maps. A field is changed when it is present in
    /// `current` and absent from or different in `snapshot`. Fields only in
    /// the snapshot are not changes.
    #[must_use]
    pub fn between(snapshot: &Row, current: &Row) -> Self {
        let fields = current
            .iter()
            .filter(|(field, value)| snapshot.get(*field) != Some(*value))
            .map(|(field, value)| (field.clone(), FieldValue::Value(value.clone())))
            .collect();
        Self { fields }
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether `field` changed.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Changed fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_hydrate_sets_snapshot() {
        let mut record = Record::new();
        record.hydrate(row(&[("id", SqlValue::Int(5)), ("name", SqlValue::Text("Ann".into()))]));

        assert!(record.is_loaded());
        assert_eq!(record.data(), record.snapshot());
        assert!(!record.has_changes());
        assert!(record.changes().is_empty());
    }

    #[test]
    fn test_change_set_between() {
        let snapshot = row(&[("id", SqlValue::Int(1)), ("name", SqlValue::Text("Ann".into()))]);
        let current = row(&[
            ("id", SqlValue::Int(1)),
            ("name", SqlValue::Text("Bob".into())),
            ("email", SqlValue::Text("bob@example.com".into())),
        ]);

        let changes = ChangeSet::between(&snapshot, &current);
        assert_eq!(changes.len(), 2);
        assert!(changes.contains("name"));
        assert!(changes.contains("email"));
        assert!(!changes.contains("id"));
    }

    #[test]
    fn test_setting_same_value_is_not_a_change() {
        let mut record = Record::new();
        record.hydrate(row(&[("name", SqlValue::Text("Ann".into()))]));
        record.set("name", "Ann");
        assert!(!record.has_changes());
    }

    #[test]
    fn test_subquery_is_always_a_change() {
        let mut record = Record::new();
        record.hydrate(row(&[("total", SqlValue::Int(3))]));
        record.set_subquery("total", Statement::prepare("SELECT COUNT(*) FROM orders"));

        assert!(record.has_changes());
        assert!(record.get("total").is_none());
        assert!(record.has("total"));
        assert!(matches!(
            record.changes().iter().next(),
            Some(("total", FieldValue::Subquery(_)))
        ));
    }

    #[test]
    fn test_commit_snapshot_drops_subqueries() {
        let mut record = Record::new();
        record.set("name", "Ann");
        record.set_subquery("total", Statement::prepare("SELECT 1"));
        record.commit_snapshot();

        assert!(!record.has_changes());
        assert!(record.subqueries().is_empty());
        assert_eq!(record.snapshot().get("name"), Some(&SqlValue::Text("Ann".into())));
    }
}
