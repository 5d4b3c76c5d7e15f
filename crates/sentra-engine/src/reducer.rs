use sentra_common::types::Series;

/// Collapses one time series into one optional scalar.
///
/// Pure function of the series: `None` means the series could not be reduced
/// (no points, or no non-null points for the kinds that require one). Null
/// points are never treated as `0`.
///
/// # Examples
///
/// ```
/// use sentra_engine::reducer::Reducer;
///
/// let r: Reducer = "percent_diff".parse().unwrap();
/// assert_eq!(r.to_string(), "percent_diff");
/// assert!("p99".parse::<Reducer>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Avg,
    Sum,
    Min,
    Max,
    Count,
    CountNonNull,
    Last,
    Median,
    Diff,
    PercentDiff,
}

impl std::str::FromStr for Reducer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(Self::Avg),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count" => Ok(Self::Count),
            "count_non_null" => Ok(Self::CountNonNull),
            "last" => Ok(Self::Last),
            "median" => Ok(Self::Median),
            "diff" => Ok(Self::Diff),
            "percent_diff" => Ok(Self::PercentDiff),
            _ => Err(format!("unknown reducer type: {s}")),
        }
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::CountNonNull => "count_non_null",
            Self::Last => "last",
            Self::Median => "median",
            Self::Diff => "diff",
            Self::PercentDiff => "percent_diff",
        };
        write!(f, "{s}")
    }
}

impl Reducer {
    pub fn reduce(&self, series: &Series) -> Option<f64> {
        if series.points.is_empty() {
            return None;
        }

        match self {
            Self::Avg => {
                let mut sum = 0.0;
                let mut count = 0u64;
                for value in series.points.iter().filter_map(|p| p.value) {
                    sum += value;
                    count += 1;
                }
                (count > 0).then(|| sum / count as f64)
            }
            Self::Sum => {
                // allNull tracking starts true: a series of only nulls has no
                // sum even though the accumulator starts at zero.
                let mut sum = 0.0;
                let mut all_null = true;
                for value in series.points.iter().filter_map(|p| p.value) {
                    sum += value;
                    all_null = false;
                }
                (!all_null).then_some(sum)
            }
            Self::Min => series.points.iter().filter_map(|p| p.value).reduce(f64::min),
            Self::Max => series.points.iter().filter_map(|p| p.value).reduce(f64::max),
            Self::Count => Some(series.points.len() as f64),
            Self::CountNonNull => {
                let count = series.points.iter().filter(|p| p.value.is_some()).count();
                (count > 0).then_some(count as f64)
            }
            Self::Last => series.points.iter().rev().find_map(|p| p.value),
            Self::Median => {
                let mut values: Vec<f64> = series.points.iter().filter_map(|p| p.value).collect();
                if values.is_empty() {
                    return None;
                }
                values.sort_by(f64::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    Some((values[mid - 1] + values[mid]) / 2.0)
                } else {
                    Some(values[mid])
                }
            }
            Self::Diff => reduce_diff(series, |newest, oldest| (newest - oldest).abs()),
            Self::PercentDiff => {
                reduce_diff(series, |newest, oldest| {
                    ((newest - oldest) / oldest * 100.0).abs()
                })
            }
        }
    }
}

/// Shared scan for `diff`/`percent_diff`: the newest non-null point found
/// from the end, against the first non-null point strictly before it. A
/// newest with no older counterpart still reduces to a valid `0` — that case
/// is not "no data".
fn reduce_diff(series: &Series, combine: impl Fn(f64, f64) -> f64) -> Option<f64> {
    let (newest_idx, newest) = series
        .points
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, p)| p.value.map(|v| (i, v)))?;

    let value = series.points[..newest_idx]
        .iter()
        .find_map(|p| p.value)
        .map(|oldest| combine(newest, oldest))
        .unwrap_or(0.0);

    Some(value)
}
