//! Faceted statistical roll-ups over a session's events.
//!
//! A facet is a declarative description: which events it covers, which
//! attributes to summarize, which categorical values to count and how to
//! split the facet further. One routine walks the description for both the
//! column names and the values, so the two can never drift apart.
//!
//! Column naming, for facet `F`, attribute `a`, statistic `s`, categorical
//! attribute `c` with value `v` and sub-filter `S`:
//!
//! | block            | count       | statistics    | categorical counts |
//! |------------------|-------------|---------------|--------------------|
//! | facet            | `n_F`       | `F_s_a`       | `F_n-cv`           |
//! | sub-filter of F  | `F_n_S`     | `F_S_s_a`     | `F_S_n-cv`         |

use crate::activity::{ActivityCode, Attribute, Event};

/// Which statistics each numeric attribute contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsMode {
    /// Mean only
    #[default]
    Fast,
    /// min, max, median, mean and population standard deviation
    Detailed,
}

impl StatsMode {
    pub const fn from_detailed(detailed: bool) -> Self {
        if detailed {
            Self::Detailed
        } else {
            Self::Fast
        }
    }

    const fn statistics(self) -> &'static [Statistic] {
        match self {
            Self::Fast => &[Statistic::Mean],
            Self::Detailed => &[
                Statistic::Min,
                Statistic::Max,
                Statistic::Median,
                Statistic::Mean,
                Statistic::Std,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statistic {
    Min,
    Max,
    Median,
    Mean,
    Std,
}

impl Statistic {
    const fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "med",
            Self::Mean => "mean",
            Self::Std => "std",
        }
    }
}

/// Count events whose attribute equals each listed code.
#[derive(Debug, Clone, Copy)]
pub struct CategoryCount {
    pub attribute: Attribute,
    pub values: &'static [i64],
}

/// A split of a facet's events by one categorical attribute.
#[derive(Debug, Clone, Copy)]
pub struct SubFilter {
    pub attribute: Attribute,
    /// `(code, label)` pairs, in output order
    pub groups: &'static [(i64, &'static str)],
}

#[derive(Debug, Clone, Copy)]
pub struct FacetSpec {
    pub label: &'static str,
    /// `None` covers every event of the session
    pub activity: Option<ActivityCode>,
    pub numeric: &'static [Attribute],
    pub counts: &'static [CategoryCount],
    pub split: Option<SubFilter>,
}

impl FacetSpec {
    fn covers(&self, event: &Event) -> bool {
        self.activity.map_or(true, |code| event.activity == code)
    }
}

const FILE_TYPES: &[(i64, &str)] = &[
    (1, "otherf"),
    (2, "compf"),
    (3, "phof"),
    (4, "docf"),
    (5, "txtf"),
    (6, "exef"),
];

const HTTP_TYPES: &[(i64, &str)] = &[
    (1, "otherf"),
    (2, "socnetf"),
    (3, "cloudf"),
    (4, "jobf"),
    (5, "leakf"),
    (6, "hackf"),
];

/// The facets of a session row, in output order.
pub const SESSION_FACETS: &[FacetSpec] = &[
    FacetSpec {
        label: "allact",
        activity: None,
        numeric: &[],
        counts: &[],
        split: None,
    },
    FacetSpec {
        label: "logon",
        activity: Some(ActivityCode::Logon),
        numeric: &[],
        counts: &[],
        split: None,
    },
    FacetSpec {
        label: "usb",
        activity: Some(ActivityCode::Connect),
        numeric: &[Attribute::UsbDuration],
        counts: &[],
        split: None,
    },
    FacetSpec {
        label: "file",
        activity: Some(ActivityCode::File),
        numeric: &[Attribute::FileLen, Attribute::FileDepth, Attribute::FileWords],
        counts: &[CategoryCount {
            attribute: Attribute::Disk,
            values: &[0, 1, 2],
        }],
        split: Some(SubFilter {
            attribute: Attribute::FileType,
            groups: FILE_TYPES,
        }),
    },
    FacetSpec {
        label: "email",
        activity: Some(ActivityCode::Email),
        numeric: &[
            Attribute::Recipients,
            Attribute::Attachments,
            Attribute::ExternalRecipients,
            Attribute::BccRecipients,
            Attribute::EmailSize,
            Attribute::EmailTextLen,
            Attribute::EmailTextWords,
        ],
        counts: &[
            CategoryCount {
                attribute: Attribute::ExternalEmail,
                values: &[1],
            },
            CategoryCount {
                attribute: Attribute::ExternalBcc,
                values: &[1],
            },
        ],
        split: None,
    },
    FacetSpec {
        label: "http",
        activity: Some(ActivityCode::Http),
        numeric: &[
            Attribute::UrlLen,
            Attribute::UrlDepth,
            Attribute::HttpContentLen,
            Attribute::HttpContentWords,
        ],
        counts: &[],
        split: Some(SubFilter {
            attribute: Attribute::HttpType,
            groups: HTTP_TYPES,
        }),
    },
];

/// Summary statistics of a sample; all zero for an empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl Summary {
    /// Values are sorted before anything is added up, so the result does not
    /// depend on the order the events arrived in.
    pub fn of(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(f64::total_cmp);

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            min: values[0],
            max: values[n - 1],
            median,
            mean,
            std: variance.sqrt(),
        }
    }

    fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::Median => self.median,
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
        }
    }
}

/// Computes the facet columns of a session.
#[derive(Debug, Clone)]
pub struct FacetAggregator {
    facets: &'static [FacetSpec],
    mode: StatsMode,
    names: Vec<String>,
}

impl FacetAggregator {
    pub fn new(facets: &'static [FacetSpec], mode: StatsMode) -> Self {
        let mut aggregator = Self {
            facets,
            mode,
            names: Vec::new(),
        };
        let mut names = Vec::new();
        aggregator.walk(&[], &mut Sink::names(&mut names));
        aggregator.names = names;
        aggregator
    }

    /// The standard session facets.
    pub fn sessions(mode: StatsMode) -> Self {
        Self::new(SESSION_FACETS, mode)
    }

    /// Column names, aligned with [`aggregate`](Self::aggregate).
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Facet values for a session's member events.
    pub fn aggregate(&self, events: &[&Event]) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.names.len());
        self.walk(events, &mut Sink::values(&mut values));
        values
    }

    fn walk(&self, events: &[&Event], sink: &mut Sink<'_>) {
        for facet in self.facets {
            let covered: Vec<&Event> = events.iter().copied().filter(|e| facet.covers(e)).collect();
            self.block(
                facet,
                facet.label,
                &format!("n_{}", facet.label),
                &covered,
                sink,
            );

            if let Some(split) = facet.split {
                for &(code, group) in split.groups {
                    let members: Vec<&Event> = covered
                        .iter()
                        .copied()
                        .filter(|e| e.attribute(split.attribute) == code as f64)
                        .collect();
                    self.block(
                        facet,
                        &format!("{}_{}", facet.label, group),
                        &format!("{}_n_{}", facet.label, group),
                        &members,
                        sink,
                    );
                }
            }
        }
    }

    fn block(
        &self,
        facet: &FacetSpec,
        prefix: &str,
        count_name: &str,
        events: &[&Event],
        sink: &mut Sink<'_>,
    ) {
        sink.push(|| count_name.to_string(), events.len() as f64);

        for &attribute in facet.numeric {
            let summary = if sink.wants_values() {
                Summary::of(events.iter().map(|e| e.attribute(attribute)).collect())
            } else {
                Summary::default()
            };
            for &statistic in self.mode.statistics() {
                sink.push(
                    || format!("{prefix}_{}_{}", statistic.name(), attribute.column()),
                    summary.get(statistic),
                );
            }
        }

        for count in facet.counts {
            for &value in count.values {
                let n = events
                    .iter()
                    .filter(|e| e.attribute(count.attribute) == value as f64)
                    .count();
                sink.push(
                    || format!("{prefix}_n-{}{value}", count.attribute.column()),
                    n as f64,
                );
            }
        }
    }
}

/// Receives either column names or values from [`FacetAggregator::walk`].
enum Sink<'a> {
    Names(&'a mut Vec<String>),
    Values(&'a mut Vec<f64>),
}

impl<'a> Sink<'a> {
    fn names(out: &'a mut Vec<String>) -> Self {
        Self::Names(out)
    }

    fn values(out: &'a mut Vec<f64>) -> Self {
        Self::Values(out)
    }

    fn wants_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    fn push(&mut self, name: impl FnOnce() -> String, value: f64) {
        match self {
            Self::Names(out) => out.push(name()),
            Self::Values(out) => out.push(value),
        }
    }
}
