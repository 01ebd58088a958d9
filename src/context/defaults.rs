//! Ready-made contexts for the common cases: plain column equality and
//! ordering, and `created_at` based timestamps.

use super::handlers::{FilterContext, SortContext};
use crate::query::{FilterOperator, Select};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sea_orm::Order;

const CREATED_AT: &str = "created_at";

impl FilterContext {
    /// One equality filter per column: `?filter=email:["a@b.c"]` becomes
    /// `email = 'a@b.c'`. A missing argument compares with the empty string.
    #[must_use]
    pub fn attributes(columns: &[&str]) -> Self {
        columns.iter().fold(Self::new(), |context, name| {
            let column = (*name).to_string();
            context.operation(name, 0, move |query, args| {
                let value = args.first().cloned().unwrap_or_default();
                query.where_eq(column.as_str(), value);
            })
        })
    }

    /// `created_between:[from,to]`, inclusive whole days on `created_at`.
    /// Dates that cannot be read add no predicate.
    #[must_use]
    pub fn timestamps() -> Self {
        Self::new().binary("created_between", |query, from, to| {
            created_between(query, from, to);
        })
    }
}

impl SortContext {
    /// `column` and `column_asc` sort ascending, `column_desc` descending.
    #[must_use]
    pub fn attributes(columns: &[&str]) -> Self {
        columns.iter().fold(Self::new(), |context, column| {
            let asc = (*column).to_string();
            let asc_suffix = asc.clone();
            let desc = asc.clone();
            context
                .operation(column, move |query| {
                    query.order_by(asc.as_str(), Order::Asc);
                })
                .operation(&format!("{column}_asc"), move |query| {
                    query.order_by(asc_suffix.as_str(), Order::Asc);
                })
                .operation(&format!("{column}_desc"), move |query| {
                    query.order_by(desc.as_str(), Order::Desc);
                })
        })
    }

    /// `latest` (newest first) and `oldest` on `created_at`.
    #[must_use]
    pub fn timestamps() -> Self {
        Self::new()
            .operation("latest", |query| {
                query.order_by(CREATED_AT, Order::Desc);
            })
            .operation("oldest", |query| {
                query.order_by(CREATED_AT, Order::Asc);
            })
    }
}

fn created_between(query: &mut Select, from: &str, to: &str) {
    let (Some(from), Some(to)) = (parse_day(from), parse_day(to)) else {
        tracing::debug!(from, to, "created_between ignored, unreadable date");
        return;
    };

    query
        .filter(
            CREATED_AT,
            FilterOperator::Gte,
            from.format("%Y-%m-%d 00:00:00").to_string(),
        )
        .filter(
            CREATED_AT,
            FilterOperator::Lte,
            to.format("%Y-%m-%d 23:59:59").to_string(),
        );
}

/// Accepts `2016-01-31`, `2016-01-31 12:00:00` and RFC 3339 timestamps.
fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}
