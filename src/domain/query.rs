//! Query objects
//!
//! Filters are expressed as (column, operator) pairs and interpreted into
//! SeaORM expressions, so callers never hand raw SQL to a repository.

use std::marker::PhantomData;

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, JoinType, Order, QueryFilter, QuerySelect, RelationDef,
    Select, Value,
};

/// Comparison applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// `LIKE '%text%'`
    Contains(String),
    /// `LIKE 'text%'`
    StartsWith(String),
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

/// One column compared with one operator.
#[derive(Debug, Clone)]
pub struct Criterion<C: ColumnTrait> {
    pub column: C,
    pub operator: Operator,
}

impl<C: ColumnTrait> Criterion<C> {
    pub fn new(column: C, operator: Operator) -> Self {
        Self { column, operator }
    }

    pub fn into_expr(self) -> SimpleExpr {
        let column = self.column;
        match self.operator {
            Operator::Eq(v) => column.eq(v),
            Operator::Ne(v) => column.ne(v),
            Operator::Gt(v) => column.gt(v),
            Operator::Gte(v) => column.gte(v),
            Operator::Lt(v) => column.lt(v),
            Operator::Lte(v) => column.lte(v),
            Operator::Contains(text) => column.contains(text),
            Operator::StartsWith(text) => column.starts_with(text),
            Operator::In(values) => column.is_in(values),
            Operator::IsNull => column.is_null(),
            Operator::IsNotNull => column.is_not_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    All,
    Any,
}

/// Criteria combined with AND (`all`) or OR (`any`).
///
/// Criteria may target columns of a related entity once the relation is
/// named with [`Filter::join`]. Joined relations are required: a row with no
/// related row never matches.
#[derive(Debug)]
pub struct Filter<E: EntityTrait> {
    combinator: Combinator,
    exprs: Vec<SimpleExpr>,
    joins: Vec<RelationDef>,
    entity: PhantomData<E>,
}

impl<E: EntityTrait> Filter<E> {
    pub fn all() -> Self {
        Self {
            combinator: Combinator::All,
            exprs: Vec::new(),
            joins: Vec::new(),
            entity: PhantomData,
        }
    }

    pub fn any() -> Self {
        Self {
            combinator: Combinator::Any,
            exprs: Vec::new(),
            joins: Vec::new(),
            entity: PhantomData,
        }
    }

    /// Single-criterion filter on one of the entity's own columns.
    pub fn by(column: E::Column, operator: Operator) -> Self {
        Self::all().add(column, operator)
    }

    pub fn add<C: ColumnTrait>(mut self, column: C, operator: Operator) -> Self {
        self.exprs.push(Criterion::new(column, operator).into_expr());
        self
    }

    /// Inner join `relation` so criteria can reach its columns.
    pub fn join(mut self, relation: RelationDef) -> Self {
        self.joins.push(relation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Restrict `select` to matching rows, joining what the criteria need.
    pub fn apply(mut self, mut select: Select<E>) -> Select<E> {
        let joins = std::mem::take(&mut self.joins);
        if !joins.is_empty() {
            for relation in joins {
                select = select.join(JoinType::InnerJoin, relation);
            }
            select = select.distinct();
        }
        select.filter(self.into_condition())
    }

    /// Criteria only. Joins are left to the caller.
    pub fn into_condition(self) -> Condition {
        let base = match self.combinator {
            Combinator::All => Condition::all(),
            Combinator::Any => Condition::any(),
        };
        self.exprs.into_iter().fold(base, |cond, expr| cond.add(expr))
    }
}

/// Arguments of `Repository::get`.
pub struct GetQuery<E: EntityTrait> {
    pub filter: Option<Filter<E>>,
    pub order_by: Option<Vec<(E::Column, Order)>>,
    pub is_tracking: bool,
    /// Carried but not applied to the query.
    pub page: u32,
    /// Carried but not applied to the query.
    pub size: u32,
    /// Relations to eager-load. LEFT JOINed, so they never narrow the result.
    pub include: Vec<RelationDef>,
}

impl<E: EntityTrait> GetQuery<E> {
    pub const DEFAULT_SIZE: u32 = u16::MAX as u32;

    pub fn new() -> Self {
        Self {
            filter: None,
            order_by: None,
            is_tracking: false,
            page: 0,
            size: Self::DEFAULT_SIZE,
            include: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter<E>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: E::Column, order: Order) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push((column, order));
        self
    }

    pub fn order_by_asc(self, column: E::Column) -> Self {
        self.order_by(column, Order::Asc)
    }

    pub fn order_by_desc(self, column: E::Column) -> Self {
        self.order_by(column, Order::Desc)
    }

    pub fn tracking(mut self, is_tracking: bool) -> Self {
        self.is_tracking = is_tracking;
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn include(mut self, relation: RelationDef) -> Self {
        self.include.push(relation);
        self
    }

    pub(crate) fn has_pagination(&self) -> bool {
        self.page != 0 || self.size != Self::DEFAULT_SIZE
    }
}

impl<E: EntityTrait> Default for GetQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parking_record, vehicle};
    use sea_orm::{DbBackend, QueryTrait, RelationTrait};

    fn sql(filter: Filter<vehicle::Entity>) -> String {
        filter
            .apply(vehicle::Entity::find())
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn test_all_filter_joins_with_and() {
        let filter = Filter::all()
            .add(vehicle::Column::Id, Operator::Gt(1.into()))
            .add(vehicle::Column::Kind, Operator::Eq("car".into()));

        let sql = sql(filter);
        assert!(sql.contains(r#""vehicles"."id" > 1"#), "{}", sql);
        assert!(sql.contains(" AND "), "{}", sql);
        assert!(sql.contains(r#""vehicles"."kind" = 'car'"#), "{}", sql);
    }

    #[test]
    fn test_any_filter_joins_with_or() {
        let filter = Filter::any()
            .add(vehicle::Column::Plate, Operator::StartsWith("ABC".into()))
            .add(vehicle::Column::CylinderCapacity, Operator::IsNull);

        let sql = sql(filter);
        assert!(sql.contains(r#""vehicles"."plate" LIKE 'ABC%'"#), "{}", sql);
        assert!(sql.contains(" OR "), "{}", sql);
        assert!(sql.contains(r#""vehicles"."cylinder_capacity" IS NULL"#), "{}", sql);
    }

    #[test]
    fn test_in_and_contains() {
        let filter = Filter::all()
            .add(vehicle::Column::Id, Operator::In(vec![1.into(), 3.into()]))
            .add(vehicle::Column::Plate, Operator::Contains("12".into()));

        let sql = sql(filter);
        assert!(sql.contains(r#""vehicles"."id" IN (1, 3)"#), "{}", sql);
        assert!(sql.contains(r#"LIKE '%12%'"#), "{}", sql);
    }

    #[test]
    fn test_related_column_is_qualified() {
        let filter = Filter::<vehicle::Entity>::all()
            .join(vehicle::Relation::ParkingRecords.def())
            .add(parking_record::Column::ExitedAt, Operator::IsNull);
        assert!(filter.has_joins());

        let sql = sql(filter);
        assert!(sql.starts_with("SELECT DISTINCT"), "{}", sql);
        assert!(sql.contains(r#"INNER JOIN "parking_records""#), "{}", sql);
        assert!(
            sql.contains(r#""parking_records"."exited_at" IS NULL"#),
            "{}",
            sql
        );
    }

    #[test]
    fn test_filter_without_joins_selects_plainly() {
        let filter = Filter::by(vehicle::Column::Kind, Operator::Eq("car".into()));
        assert!(!filter.has_joins());

        let sql = sql(filter);
        assert!(sql.starts_with(r#"SELECT "vehicles"."id""#), "{}", sql);
        assert!(!sql.contains("JOIN"), "{}", sql);
    }

    #[test]
    fn test_get_query_defaults() {
        let query = GetQuery::<vehicle::Entity>::default();
        assert!(query.filter.is_none());
        assert!(query.order_by.is_none());
        assert!(!query.is_tracking);
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 65535);
        assert!(!query.has_pagination());

        let query = query.page(2, 10).order_by_desc(vehicle::Column::Id);
        assert!(query.has_pagination());
        assert_eq!(query.order_by.map(|o| o.len()), Some(1));
    }
}
