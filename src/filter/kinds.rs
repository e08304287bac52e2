//! Filter variants: parsing from raw query values and application to a query

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::FilterError;
use crate::query::{BindValue, Condition, QuerySpec};

use super::args::FilterArgs;
use super::severity::Severity;
use super::sort::{self, SortItem};
use super::value::RawFilter;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const PUBLISHED_COLUMN: &str = "date(cve.public_date)";
const CVSS_SCORE_EXPR: &str = "COALESCE(cve.cvss3_score, cve.cvss2_score)";
const CLUSTER_COUNT_EXPR: &str = "COUNT(DISTINCT cluster_image.cluster_id)";
const IMAGE_COUNT_EXPR: &str = "COUNT(DISTINCT cluster_image.image_id)";
const SEVERITY_COUNT_EXPR: &str = "COUNT(DISTINCT CASE WHEN cve.severity = ? THEN cve.id END)";

/// Query parameter names understood by the filter registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterName {
    Search,
    Published,
    Severity,
    ClusterSeverity,
    CvssScore,
    AffectedClusters,
    AffectedImages,
    Limit,
    Offset,
    Sort,
}

impl FilterName {
    pub const ALL: [FilterName; 10] = [
        FilterName::Search,
        FilterName::Published,
        FilterName::Severity,
        FilterName::ClusterSeverity,
        FilterName::CvssScore,
        FilterName::AffectedClusters,
        FilterName::AffectedImages,
        FilterName::Limit,
        FilterName::Offset,
        FilterName::Sort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterName::Search => "search",
            FilterName::Published => "published",
            FilterName::Severity => "severity",
            FilterName::ClusterSeverity => "cluster_severity",
            FilterName::CvssScore => "cvss_score",
            FilterName::AffectedClusters => "affected_clusters",
            FilterName::AffectedImages => "affected_images",
            FilterName::Limit => "limit",
            FilterName::Offset => "offset",
            FilterName::Sort => "sort",
        }
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or(())
    }
}

/// Two independent exposure-count switches, in query order `one_or_more,none`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    pub one_or_more: bool,
    pub none: bool,
}

/// Parsed value of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    Search(String),
    Published { from: NaiveDate, to: NaiveDate },
    Severity(BTreeSet<Severity>),
    ClusterSeverity(BTreeSet<Severity>),
    CvssScore { from: f64, to: f64 },
    AffectedClusters(Exposure),
    AffectedImages(Exposure),
    Limit(u64),
    Offset(u64),
    Sort(Vec<SortItem>),
}

/// A request filter: its raw form plus the parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    raw: RawFilter,
    kind: FilterKind,
}

impl Filter {
    /// Parse the raw query value for `name`
    pub fn parse(name: FilterName, value: &str) -> Result<Self, FilterError> {
        let param = name.as_str();
        let raw = match name {
            FilterName::Search => RawFilter::single(param, value),
            _ => RawFilter::new(param, value),
        };

        let kind = match name {
            FilterName::Search => FilterKind::Search(value.to_string()),
            FilterName::Published => {
                let [from, to] = parse_pair(&raw, parse_date)?;
                FilterKind::Published { from, to }
            }
            FilterName::Severity => FilterKind::Severity(parse_severities(&raw)?),
            FilterName::ClusterSeverity => FilterKind::ClusterSeverity(parse_severities(&raw)?),
            FilterName::CvssScore => {
                let [from, to] = parse_pair(&raw, parse_score)?;
                FilterKind::CvssScore { from, to }
            }
            FilterName::AffectedClusters => FilterKind::AffectedClusters(parse_exposure(&raw)?),
            FilterName::AffectedImages => FilterKind::AffectedImages(parse_exposure(&raw)?),
            FilterName::Limit => FilterKind::Limit(parse_count(&raw)?),
            FilterName::Offset => FilterKind::Offset(parse_count(&raw)?),
            FilterName::Sort => FilterKind::Sort(parse_sort(&raw)?),
        };

        Ok(Self { raw, kind })
    }

    /// Sort filter with no requested columns, so endpoint defaults still apply
    pub fn default_sort() -> Self {
        Self {
            raw: RawFilter::empty(FilterName::Sort.as_str()),
            kind: FilterKind::Sort(Vec::new()),
        }
    }

    pub fn raw(&self) -> &RawFilter {
        &self.raw
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Extend `query` with this filter.
    ///
    /// Only the sort filter mutates itself, appending the endpoint defaults to its raw values.
    pub fn apply(&mut self, query: QuerySpec, args: &FilterArgs) -> Result<QuerySpec, FilterError> {
        let Filter { raw, kind } = self;
        match kind {
            FilterKind::Search(value) => Ok(match args.search {
                Some(target) => query.filter(target.condition(&format!("%{}%", value))),
                None => query,
            }),
            FilterKind::Published { from, to } => Ok(query.filter(between(
                PUBLISHED_COLUMN,
                BindValue::Text(from.format(DATE_FORMAT).to_string()),
                BindValue::Text(to.format(DATE_FORMAT).to_string()),
            ))),
            FilterKind::Severity(severities) => {
                let placeholders = vec!["?"; severities.len()].join(", ");
                Ok(query.filter(Condition::new(
                    format!("cve.severity IN ({})", placeholders),
                    severities
                        .iter()
                        .map(|s| BindValue::Text(s.as_str().to_string()))
                        .collect(),
                )))
            }
            FilterKind::ClusterSeverity(severities) => {
                let raw = &*raw;
                // `none` has no per-severity counter
                severities
                    .iter()
                    .filter(|s| **s != Severity::None)
                    .try_fold(query, |query, severity| {
                        having(
                            raw,
                            query,
                            Condition::new(
                                format!("{} > 0", SEVERITY_COUNT_EXPR),
                                vec![BindValue::Text(severity.as_str().to_string())],
                            ),
                        )
                    })
            }
            FilterKind::CvssScore { from, to } => Ok(query.filter(between(
                CVSS_SCORE_EXPR,
                BindValue::Real(*from),
                BindValue::Real(*to),
            ))),
            FilterKind::AffectedClusters(exposure) => {
                apply_exposure(raw, query, CLUSTER_COUNT_EXPR, *exposure)
            }
            FilterKind::AffectedImages(exposure) => {
                apply_exposure(raw, query, IMAGE_COUNT_EXPR, *exposure)
            }
            FilterKind::Limit(limit) => Ok(query.limit(*limit)),
            FilterKind::Offset(offset) => Ok(query.offset(*offset)),
            FilterKind::Sort(items) => sort::apply(raw, items, query, args.sort.as_ref()),
        }
    }
}

fn between(expr: &str, from: BindValue, to: BindValue) -> Condition {
    Condition::new(format!("{expr} >= ? AND {expr} <= ?"), vec![from, to])
}

fn having(
    raw: &RawFilter,
    query: QuerySpec,
    condition: Condition,
) -> Result<QuerySpec, FilterError> {
    query
        .having(condition)
        .map_err(|e| FilterError::Composition {
            filter: raw.name().to_string(),
            reason: e.to_string(),
        })
}

// Both switches set yields `= 0 AND > 0`, which no row satisfies. Kept as is.
fn apply_exposure(
    raw: &RawFilter,
    mut query: QuerySpec,
    count_expr: &str,
    exposure: Exposure,
) -> Result<QuerySpec, FilterError> {
    if exposure.none {
        query = having(raw, query, Condition::raw(format!("{} = 0", count_expr)))?;
    }
    if exposure.one_or_more {
        query = having(raw, query, Condition::raw(format!("{} > 0", count_expr)))?;
    }
    Ok(query)
}

fn invalid(raw: &RawFilter, reason: impl Into<String>) -> FilterError {
    FilterError::parse(raw.name(), &raw.value(), reason)
}

fn parse_pair<T>(
    raw: &RawFilter,
    parse: impl Fn(&RawFilter, &str) -> Result<T, FilterError>,
) -> Result<[T; 2], FilterError> {
    match raw.values() {
        [first, second] => Ok([parse(raw, first.as_str())?, parse(raw, second.as_str())?]),
        _ => Err(invalid(raw, "expected exactly two comma-separated values")),
    }
}

// chrono accepts unpadded fields for %m and %d, the round trip rejects them
fn parse_date(raw: &RawFilter, value: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == value)
        .ok_or_else(|| invalid(raw, format!("'{}' is not a YYYY-MM-DD date", value)))
}

fn parse_score(raw: &RawFilter, value: &str) -> Result<f64, FilterError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .ok_or_else(|| invalid(raw, format!("'{}' is not a number", value)))
}

fn parse_bool(raw: &RawFilter, value: &str) -> Result<bool, FilterError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(raw, format!("'{}' is not true or false", value))),
    }
}

fn parse_exposure(raw: &RawFilter) -> Result<Exposure, FilterError> {
    let [one_or_more, none] = parse_pair(raw, parse_bool)?;
    Ok(Exposure { one_or_more, none })
}

fn parse_count(raw: &RawFilter) -> Result<u64, FilterError> {
    match raw.values() {
        [value] => value
            .parse::<u64>()
            .map_err(|_| invalid(raw, "must be a non-negative integer")),
        _ => Err(invalid(raw, "expected a single integer")),
    }
}

fn parse_severities(raw: &RawFilter) -> Result<BTreeSet<Severity>, FilterError> {
    raw.values()
        .iter()
        .map(|value| value.parse::<Severity>().map_err(|reason| invalid(raw, reason)))
        .collect()
}

fn parse_sort(raw: &RawFilter) -> Result<Vec<SortItem>, FilterError> {
    raw.values()
        .iter()
        .map(|value| {
            SortItem::parse(value).ok_or_else(|| invalid(raw, "empty sort column"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{SearchTarget, SortArgs};
    use crate::query::OrderClause;

    fn grouped() -> QuerySpec {
        QuerySpec::new("cve.id", "cve").group_by("cve.id")
    }

    fn parse(name: FilterName, value: &str) -> Filter {
        Filter::parse(name, value).expect("filter should parse")
    }

    #[test]
    fn test_filter_name_round_trip() {
        for name in FilterName::ALL {
            assert_eq!(name.as_str().parse::<FilterName>(), Ok(name));
        }
        assert!("unknown".parse::<FilterName>().is_err());
    }

    #[test]
    fn test_parse_published_range() {
        let filter = parse(FilterName::Published, "2021-01-01,2022-02-02");
        assert_eq!(
            filter.kind(),
            &FilterKind::Published {
                from: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2022, 2, 2).unwrap(),
            }
        );
    }

    #[test]
    fn test_parse_published_rejects_bad_date() {
        let err = Filter::parse(FilterName::Published, "2021-13-01,2022-02-02").unwrap_err();
        match err {
            FilterError::Parse { param, value, .. } => {
                assert_eq!(param, "published");
                assert_eq!(value, "2021-13-01,2022-02-02");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_published_requires_zero_padding() {
        assert!(Filter::parse(FilterName::Published, "2022-1-10,2022-03-15").is_err());
        assert!(Filter::parse(FilterName::Published, "2022-01-10,2022-3-5").is_err());
        assert!(Filter::parse(FilterName::Published, "22-01-10,2022-03-15").is_err());
    }

    #[test]
    fn test_parse_published_requires_two_dates() {
        assert!(Filter::parse(FilterName::Published, "2021-01-01").is_err());
        assert!(Filter::parse(FilterName::Published, "2021-01-01,2021-01-02,2021-01-03").is_err());
    }

    #[test]
    fn test_parse_cvss_score() {
        let filter = parse(FilterName::CvssScore, "0.0,9.0");
        assert_eq!(filter.kind(), &FilterKind::CvssScore { from: 0.0, to: 9.0 });
        assert!(Filter::parse(FilterName::CvssScore, "low,9.0").is_err());
        assert!(Filter::parse(FilterName::CvssScore, "NaN,9.0").is_err());
    }

    #[test]
    fn test_parse_severities_as_set() {
        let filter = parse(FilterName::Severity, "critical,low,critical");
        let FilterKind::Severity(set) = filter.kind() else {
            panic!("expected severity filter");
        };
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Severity::Critical));
        assert!(set.contains(&Severity::Low));
        assert_eq!(filter.raw().value(), "critical,low,critical");
    }

    #[test]
    fn test_parse_severity_rejects_unknown() {
        assert!(Filter::parse(FilterName::Severity, "critical,urgent").is_err());
        assert!(Filter::parse(FilterName::ClusterSeverity, "").is_err());
    }

    #[test]
    fn test_parse_exposure_order() {
        let filter = parse(FilterName::AffectedClusters, "false,true");
        assert_eq!(
            filter.kind(),
            &FilterKind::AffectedClusters(Exposure {
                one_or_more: false,
                none: true,
            })
        );
        assert!(Filter::parse(FilterName::AffectedImages, "yes,no").is_err());
        assert!(Filter::parse(FilterName::AffectedImages, "True,false").is_err());
    }

    #[test]
    fn test_parse_limit_offset() {
        assert_eq!(parse(FilterName::Limit, "0").kind(), &FilterKind::Limit(0));
        assert_eq!(parse(FilterName::Offset, "40").kind(), &FilterKind::Offset(40));
        assert!(Filter::parse(FilterName::Limit, "-1").is_err());
        assert!(Filter::parse(FilterName::Offset, "ten").is_err());
        assert!(Filter::parse(FilterName::Limit, "10,20").is_err());
    }

    #[test]
    fn test_parse_sort() {
        let filter = parse(FilterName::Sort, "-cvss_score,synopsis");
        assert_eq!(
            filter.kind(),
            &FilterKind::Sort(vec![SortItem::desc("cvss_score"), SortItem::asc("synopsis")])
        );
        assert!(Filter::parse(FilterName::Sort, "id,,severity").is_err());
    }

    #[test]
    fn test_search_keeps_whole_value() {
        let filter = parse(FilterName::Search, "CVE-2022,heap");
        assert_eq!(filter.kind(), &FilterKind::Search("CVE-2022,heap".to_string()));
        assert_eq!(filter.raw().value(), "CVE-2022,heap");
    }

    #[test]
    fn test_search_wraps_wildcards_without_escaping() {
        let mut filter = parse(FilterName::Search, "50%_off");
        let args = FilterArgs::new().with_search(SearchTarget::Cve);
        let query = filter.apply(grouped(), &args).unwrap();

        assert_eq!(
            query.predicates()[0].binds,
            vec![
                BindValue::Text("%50%_off%".to_string()),
                BindValue::Text("%50%_off%".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_without_target_is_noop() {
        let mut filter = parse(FilterName::Search, "CVE-2022");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();
        assert_eq!(query, grouped());
    }

    #[test]
    fn test_published_is_inclusive_range() {
        let mut filter = parse(FilterName::Published, "2021-01-01,2022-02-02");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();
        let condition = &query.predicates()[0];

        assert_eq!(
            condition.sql,
            "date(cve.public_date) >= ? AND date(cve.public_date) <= ?"
        );
        assert_eq!(
            condition.binds,
            vec![
                BindValue::Text("2021-01-01".to_string()),
                BindValue::Text("2022-02-02".to_string()),
            ]
        );
    }

    #[test]
    fn test_severity_membership() {
        let mut filter = parse(FilterName::Severity, "critical,important");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();
        let condition = &query.predicates()[0];

        assert_eq!(condition.sql, "cve.severity IN (?, ?)");
        assert_eq!(
            condition.binds,
            vec![
                BindValue::Text("important".to_string()),
                BindValue::Text("critical".to_string()),
            ]
        );
    }

    #[test]
    fn test_cvss_score_bounds_coalesced_expression() {
        let mut filter = parse(FilterName::CvssScore, "0.0,9.0");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();
        let condition = &query.predicates()[0];

        assert_eq!(
            condition.sql,
            "COALESCE(cve.cvss3_score, cve.cvss2_score) >= ? AND COALESCE(cve.cvss3_score, cve.cvss2_score) <= ?"
        );
        assert_eq!(condition.binds, vec![BindValue::Real(0.0), BindValue::Real(9.0)]);
    }

    #[test]
    fn test_cluster_severity_adds_having_per_severity() {
        let mut filter = parse(FilterName::ClusterSeverity, "critical,none,low");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();

        let having = query.having_conditions();
        assert_eq!(having.len(), 2);
        assert_eq!(
            having[0].sql,
            "COUNT(DISTINCT CASE WHEN cve.severity = ? THEN cve.id END) > 0"
        );
        assert_eq!(having[0].binds, vec![BindValue::Text("low".to_string())]);
        assert_eq!(having[1].binds, vec![BindValue::Text("critical".to_string())]);
        assert!(query.predicates().is_empty());
    }

    #[test]
    fn test_exposure_single_switches() {
        let mut none = parse(FilterName::AffectedImages, "false,true");
        let query = none.apply(grouped(), &FilterArgs::new()).unwrap();
        assert_eq!(
            query.having_conditions(),
            &[Condition::raw("COUNT(DISTINCT cluster_image.image_id) = 0")]
        );

        let mut neither = parse(FilterName::AffectedImages, "false,false");
        let query = neither.apply(grouped(), &FilterArgs::new()).unwrap();
        assert!(query.having_conditions().is_empty());
    }

    // Known contradiction: "true,true" reads as "either", but the conditions are ANDed
    // and no group can have both zero and more than zero exposed clusters.
    #[test]
    fn test_exposure_both_switches_compose_unsatisfiable_having() {
        let mut filter = parse(FilterName::AffectedClusters, "true,true");
        let query = filter.apply(grouped(), &FilterArgs::new()).unwrap();

        assert_eq!(
            query.having_conditions(),
            &[
                Condition::raw("COUNT(DISTINCT cluster_image.cluster_id) = 0"),
                Condition::raw("COUNT(DISTINCT cluster_image.cluster_id) > 0"),
            ]
        );
        let (sql, _) = query.to_sql();
        assert!(sql.ends_with(
            "HAVING (COUNT(DISTINCT cluster_image.cluster_id) = 0) AND (COUNT(DISTINCT cluster_image.cluster_id) > 0)"
        ));
    }

    #[test]
    fn test_having_filter_on_ungrouped_query_fails() {
        let mut filter = parse(FilterName::AffectedClusters, "true,false");
        let err = filter
            .apply(QuerySpec::new("cve.id", "cve"), &FilterArgs::new())
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::Composition {
                filter: "affected_clusters".to_string(),
                reason: "having conditions require a grouped query".to_string(),
            }
        );
    }

    #[test]
    fn test_limit_zero_is_applied() {
        let mut limit = parse(FilterName::Limit, "0");
        let mut offset = parse(FilterName::Offset, "5");
        let args = FilterArgs::new();
        let query = limit.apply(grouped(), &args).unwrap();
        let query = offset.apply(query, &args).unwrap();

        assert_eq!(query.limit_value(), Some(0));
        assert_eq!(query.offset_value(), Some(5));
    }

    #[test]
    fn test_default_sort_echoes_defaults() {
        let mut filter = Filter::default_sort();
        let args = FilterArgs::new().with_sort(SortArgs::new(
            &[("id", "cve.id")],
            vec![SortItem::asc("id")],
        ));
        let query = filter.apply(grouped(), &args).unwrap();

        assert_eq!(query.orderings(), &[OrderClause::new("cve.id", false)]);
        assert_eq!(filter.raw().value(), "id");
    }
}
