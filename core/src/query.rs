use std::cmp::Ordering;

use kestrel_proto::{Cursor, MoreResults};

use crate::{entity::Entity, key::Key, value::Value};

/// Pseudo-property naming an entity's own key in filters and orders
pub const KEY_PROPERTY: &str = "__key__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Operator {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Equal => "=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub property: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    /// A value satisfies a filter only when it has the filter value's type. For list
    /// properties, any matching element is enough.
    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::List(items) if !matches!(self.value, Value::List(_)) => items.iter().any(|item| self.accepts(item)),
            _ => value.same_type(&self.value) && self.operator.accepts(value.total_cmp(&self.value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

/// A query over one kind, built up with chained calls:
///
/// ```
/// # use kestrel_core::{Direction, Operator, Query};
/// let query = Query::new("Task")
///     .filter("done", Operator::Equal, false)
///     .filter("priority", Operator::GreaterThanOrEqual, 4)
///     .order("priority", Direction::Descending)
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    kind: Option<String>,
    namespace: Option<String>,
    ancestor: Option<Key>,
    filters: Vec<Filter>,
    orders: Vec<Order>,
    projection: Vec<String>,
    distinct_on: Vec<String>,
    limit: Option<usize>,
    offset: usize,
    start: Option<Cursor>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self { Self { kind: Some(kind.into()), ..Default::default() } }

    /// A query across every kind. Only useful together with an ancestor or key filter.
    pub fn kindless() -> Self { Self::default() }

    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn filter(mut self, property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { property: property.into(), operator, value: value.into() });
        self
    }

    /// Restrict results to `ancestor` and its descendants. The query adopts the ancestor's namespace.
    pub fn ancestor(mut self, ancestor: Key) -> Self {
        self.namespace = ancestor.namespace().map(str::to_owned);
        self.ancestor = Some(ancestor);
        self
    }

    pub fn order(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order { property: property.into(), direction });
        self
    }

    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection.extend(properties.into_iter().map(Into::into));
        self
    }

    pub fn distinct_on<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct_on.extend(properties.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Resume from a cursor returned with an earlier batch of results
    pub fn start(mut self, cursor: Cursor) -> Self {
        self.start = Some(cursor);
        self
    }

    pub fn kind(&self) -> Option<&str> { self.kind.as_deref() }

    pub fn get_namespace(&self) -> Option<&str> { self.namespace.as_deref() }

    pub fn get_ancestor(&self) -> Option<&Key> { self.ancestor.as_ref() }

    pub fn filters(&self) -> &[Filter] { &self.filters }

    pub fn orders(&self) -> &[Order] { &self.orders }

    pub fn projection(&self) -> &[String] { &self.projection }

    pub fn get_distinct_on(&self) -> &[String] { &self.distinct_on }

    pub fn get_limit(&self) -> Option<usize> { self.limit }

    pub fn get_offset(&self) -> usize { self.offset }

    pub fn start_cursor(&self) -> Option<&Cursor> { self.start.as_ref() }

    /// The value a query sees for `property` on `entity`
    pub fn property_value(entity: &Entity, property: &str) -> Option<Value> {
        if property == KEY_PROPERTY {
            Some(Value::Key(entity.key()))
        } else {
            entity.get(property)
        }
    }

    /// Whether `entity` satisfies this query's kind, namespace, ancestor and filters.
    ///
    /// An entity that lacks a filtered or ordered property never matches.
    pub fn matches(&self, entity: &Entity) -> bool {
        let key = entity.key();
        if self.kind.as_deref().is_some_and(|kind| kind != key.kind()) {
            return false;
        }
        if self.namespace.as_deref() != key.namespace() {
            return false;
        }
        if let Some(ancestor) = &self.ancestor {
            if !key.descends_from(ancestor) {
                return false;
            }
        }
        if self.orders.iter().any(|order| Self::property_value(entity, &order.property).is_none()) {
            return false;
        }
        self.filters.iter().all(|filter| match Self::property_value(entity, &filter.property) {
            Some(value) => filter.accepts(&value),
            None => false,
        })
    }

    /// Compare two matching entities by this query's orders, falling back to key order
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        for order in &self.orders {
            let left = Self::property_value(a, &order.property).unwrap_or(Value::Null);
            let right = Self::property_value(b, &order.property).unwrap_or(Value::Null);
            let ordering = match order.direction {
                Direction::Ascending => left.total_cmp(&right),
                Direction::Descending => right.total_cmp(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.key().cmp(&b.key())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Query({}", self.kind.as_deref().unwrap_or("*"))?;
        if let Some(ancestor) = &self.ancestor {
            write!(f, " ancestor {}", ancestor)?;
        }
        for filter in &self.filters {
            write!(f, " {} {} {}", filter.property, filter.operator, filter.value)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        write!(f, ")")
    }
}

/// One batch of query results
#[derive(Debug)]
pub struct QueryResults {
    pub entities: Vec<Entity>,
    /// Where the next batch begins; pass it to [`Query::start`]
    pub cursor: Option<Cursor>,
    pub more_results: MoreResults,
}

impl QueryResults {
    pub fn has_more(&self) -> bool { self.more_results != MoreResults::NoMoreResults }
}

impl std::ops::Deref for QueryResults {
    type Target = Vec<Entity>;
    fn deref(&self) -> &Self::Target { &self.entities }
}

impl IntoIterator for QueryResults {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;
    fn into_iter(self) -> Self::IntoIter { self.entities.into_iter() }
}
