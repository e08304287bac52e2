//! Query specification composed by request filters
//!
//! A [`QuerySpec`] is a plain value describing one SELECT: the endpoint supplies the
//! projection, joins, account scope and grouping, and request filters extend it with
//! predicates, having conditions, orderings and paging. Builder methods take `self` by
//! value so a specification always has exactly one owner while it is being composed.
//! The storage layer renders it once into SQL text plus an ordered list of bind values.

use thiserror::Error;

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Real(f64),
    Integer(i64),
}

/// SQL fragment with its bind values, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

impl Condition {
    pub fn new(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }

    /// Condition without bind values
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Single ORDER BY term. Nulls always sort last.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub expr: String,
    pub descending: bool,
}

impl OrderClause {
    pub fn new(expr: impl Into<String>, descending: bool) -> Self {
        Self {
            expr: expr.into(),
            descending,
        }
    }

    pub fn to_sql(&self) -> String {
        if self.descending {
            format!("{} DESC NULLS LAST", self.expr)
        } else {
            format!("{} ASC NULLS LAST", self.expr)
        }
    }
}

/// Returned when a having condition is added to a query without GROUP BY
#[derive(Error, Debug, Clone, PartialEq)]
#[error("having conditions require a grouped query")]
pub struct UngroupedQuery;

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    select: String,
    from: String,
    predicates: Vec<Condition>,
    group_by: Option<String>,
    having: Vec<Condition>,
    orderings: Vec<OrderClause>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QuerySpec {
    /// Start a query from a projection list and a FROM clause (including joins)
    pub fn new(select: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            from: from.into(),
            predicates: Vec::new(),
            group_by: None,
            having: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    /// AND a row predicate onto the WHERE clause
    pub fn filter(mut self, condition: Condition) -> Self {
        self.predicates.push(condition);
        self
    }

    /// AND an aggregate condition onto the HAVING clause
    pub fn having(mut self, condition: Condition) -> Result<Self, UngroupedQuery> {
        if !self.is_grouped() {
            return Err(UngroupedQuery);
        }
        self.having.push(condition);
        Ok(self)
    }

    pub fn order_by(mut self, clause: OrderClause) -> Self {
        self.orderings.push(clause);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn predicates(&self) -> &[Condition] {
        &self.predicates
    }

    pub fn having_conditions(&self) -> &[Condition] {
        &self.having
    }

    pub fn orderings(&self) -> &[OrderClause] {
        &self.orderings
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
    }

    /// Render the full query: body, ORDER BY, LIMIT and OFFSET
    pub fn to_sql(&self) -> (String, Vec<BindValue>) {
        let (mut sql, mut binds) = self.render_body();

        if !self.orderings.is_empty() {
            let terms: Vec<String> = self.orderings.iter().map(OrderClause::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                binds.push(BindValue::Integer(clamp_i64(limit)));
                binds.push(BindValue::Integer(clamp_i64(offset)));
            }
            (Some(limit), None) => {
                sql.push_str(" LIMIT ?");
                binds.push(BindValue::Integer(clamp_i64(limit)));
            }
            (None, Some(offset)) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                binds.push(BindValue::Integer(clamp_i64(offset)));
            }
            (None, None) => {}
        }

        (sql, binds)
    }

    /// Render a COUNT(*) over the filtered rows, ignoring ordering and paging
    pub fn to_count_sql(&self) -> (String, Vec<BindValue>) {
        let (body, binds) = self.render_body();
        (format!("SELECT COUNT(*) FROM ({}) AS filtered", body), binds)
    }

    fn render_body(&self) -> (String, Vec<BindValue>) {
        let mut sql = format!("SELECT {} FROM {}", self.select, self.from);
        let mut binds = Vec::new();

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&join_conditions(&self.predicates, &mut binds));
        }

        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&join_conditions(&self.having, &mut binds));
        }

        (sql, binds)
    }
}

fn join_conditions(conditions: &[Condition], binds: &mut Vec<BindValue>) -> String {
    conditions
        .iter()
        .map(|c| {
            binds.extend(c.binds.iter().cloned());
            format!("({})", c.sql)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
